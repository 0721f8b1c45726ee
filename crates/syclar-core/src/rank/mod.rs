mod engine;
mod tier;

pub use engine::{
    add_points, rank_from_points, rank_up_info, rank_up_threshold, Rank, RankCurve, RankUpInfo,
    ANCHOR_NUMBER, ANCHOR_TIER, FLOOR_POINTS, POINTS_PER_RANK_STEP, RANKS_PER_CLASS,
};
pub use tier::Tier;
