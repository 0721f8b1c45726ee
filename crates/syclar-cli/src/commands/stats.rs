use chrono::Utc;
use clap::Subcommand;
use serde::Serialize;
use syclar_core::profile;
use syclar_core::stats::{
    compare, unlocked_trophies, AggregatedStats, CycleData, StatsStore, Trophy, UserComparison,
    ALL_TROPHIES,
};
use syclar_core::UserStats;

use super::{print_json, CmdResult, Context};

#[derive(Subcommand)]
pub enum StatsAction {
    /// Local stats and unlocked trophies
    Show,
    /// Record activity by hand and publish the stats
    Record {
        /// Focus minutes to add
        #[arg(long)]
        focus_minutes: Option<u64>,
        /// Count one completed cycle
        #[arg(long)]
        cycle: bool,
    },
    /// Compare against every published user
    Compare,
    /// The trophy catalogue with unlock state
    Trophies,
}

#[derive(Serialize)]
struct Show<'a> {
    stats: &'a UserStats,
    trophies: Vec<Trophy>,
}

#[derive(Serialize)]
struct Comparison<'a> {
    stats: &'a UserStats,
    aggregated: AggregatedStats,
    comparison: UserComparison,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct TrophyView {
    #[serde(flatten)]
    trophy: Trophy,
    rarity_label: &'static str,
    unlocked: bool,
}

pub fn run(action: StatsAction) -> CmdResult {
    let ctx = Context::open()?;
    let now = Utc::now();
    let mut stats = profile::load_user_stats(&ctx.store, now);
    let shared = StatsStore::new(&ctx.store).with_cache_secs(ctx.config.store.aggregate_cache_secs);

    match action {
        StatsAction::Show => print_json(&Show {
            stats: &stats,
            trophies: unlocked_trophies(&stats),
        }),
        StatsAction::Record {
            focus_minutes,
            cycle,
        } => {
            if let Some(minutes) = focus_minutes {
                stats.record_focus_time(minutes, now);
            }
            if cycle {
                stats.record_cycle(now, CycleData::default());
            }
            profile::save_user_stats(&ctx.store, &stats)?;
            shared.store(&stats)?;
            print_json(&stats)
        }
        StatsAction::Compare => {
            let aggregated = shared.cached_aggregate();
            let comparison = compare(&stats, &aggregated);
            print_json(&Comparison {
                stats: &stats,
                aggregated,
                comparison,
            })
        }
        StatsAction::Trophies => {
            let views: Vec<TrophyView> = ALL_TROPHIES
                .iter()
                .map(|t| TrophyView {
                    trophy: *t,
                    rarity_label: t.rarity_label(),
                    unlocked: t.is_unlocked(&stats),
                })
                .collect();
            print_json(&views)
        }
    }
}
