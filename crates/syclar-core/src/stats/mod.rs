//! Statistics for Syclar
//!
//! Per-user activity totals with a daily streak, cross-user aggregates with
//! percentile comparison, and the trophy catalogue.

mod aggregate;
mod trophies;
mod user;

pub use aggregate::{
    aggregate, compare, percentile, AggregatedStats, StatsStore, UserComparison,
    AGGREGATE_CACHE_SECS,
};
pub use trophies::{
    rarity_label, trophy_by_id, unlocked_trophies, Trophy, TrophyMetric, ALL_TROPHIES,
};
pub use user::{new_user_id, CycleData, UserStats};
