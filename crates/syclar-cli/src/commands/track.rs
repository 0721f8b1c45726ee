use clap::Subcommand;
use serde::Serialize;
use syclar_core::allowance::{Allowance, NoopSink, Tick, TickReport, TrackerState};
use syclar_core::Rank;

use super::{load_hero, print_json, CmdResult};

#[derive(Subcommand)]
pub enum TrackAction {
    /// Start tracking screentime
    Start,
    /// Stop tracking and reset the unproductive counter
    Stop,
    /// Report elapsed time on the current context
    Tick {
        /// Seconds since the last tick
        #[arg(long, default_value = "60")]
        seconds: u64,
        /// URL of the current context; classified against the denylist
        #[arg(long, conflicts_with = "unproductive")]
        url: Option<String>,
        /// Treat the time as unproductive without a URL
        #[arg(long)]
        unproductive: bool,
    },
    /// Print tracker state as JSON
    Status,
}

#[derive(Serialize)]
struct Status<'a> {
    tracker: &'a TrackerState,
    rank: String,
    allowance: Allowance,
    goodwill: u64,
    /// Whether the next unproductive minute would be covered.
    would_protect: bool,
}

#[derive(Serialize)]
struct TickOutput<'a> {
    #[serde(flatten)]
    report: &'a TickReport,
    tracker: &'a TrackerState,
    rank: &'a Rank,
    allowance: Allowance,
}

pub fn run(action: TrackAction) -> CmdResult {
    let (ctx, mut hero) = load_hero()?;
    let policy = ctx.config.allowance_policy();

    match action {
        TrackAction::Start => match hero.tracker.start() {
            Some(event) => print_json(&event)?,
            None => println!("{{\"type\": \"already_tracking\"}}"),
        },
        TrackAction::Stop => match hero.tracker.stop() {
            Some(event) => print_json(&event)?,
            None => println!("{{\"type\": \"not_tracking\"}}"),
        },
        TrackAction::Tick {
            seconds,
            url,
            unproductive,
        } => {
            let report = if unproductive {
                hero.tick(&policy, Tick::unproductive(seconds), &mut NoopSink)
            } else {
                hero.track(
                    &policy,
                    &ctx.config.classifier(),
                    url.as_deref(),
                    seconds,
                    &mut NoopSink,
                )
            };
            print_json(&TickOutput {
                report: &report,
                tracker: &hero.tracker,
                rank: &hero.rank,
                allowance: hero.wallet.allowance,
            })?;
        }
        TrackAction::Status => {
            print_json(&Status {
                tracker: &hero.tracker,
                rank: hero.rank.to_string(),
                allowance: hero.wallet.allowance,
                goodwill: hero.wallet.goodwill,
                would_protect: policy.would_protect(&hero.wallet),
            })?;
            return Ok(());
        }
    }

    hero.save(&ctx.store)?;
    Ok(())
}
