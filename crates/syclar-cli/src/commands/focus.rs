use chrono::Utc;
use clap::Subcommand;
use serde::Serialize;
use syclar_core::error::ValidationError;
use syclar_core::focus::{FocusReward, FocusState};
use syclar_core::{profile, Event};

use super::{load_hero, print_json, CmdResult};

#[derive(Subcommand)]
pub enum FocusAction {
    /// Start focusing on a board task
    Start {
        /// Task ID
        task: String,
    },
    /// Pause the running session
    Pause,
    /// Resume the paused session
    Resume,
    /// Stop the session and collect its reward
    Stop,
    /// Print the current session as JSON
    Status,
}

#[derive(Serialize)]
struct Status<'a> {
    state: FocusState,
    task_id: Option<&'a str>,
    elapsed_secs: u64,
    /// What stopping now would earn.
    pending: Option<FocusReward>,
}

#[derive(Serialize)]
struct Started {
    #[serde(skip_serializing_if = "Option::is_none")]
    previous: Option<FocusReward>,
    #[serde(skip_serializing_if = "Option::is_none")]
    event: Option<Event>,
    state: FocusState,
}

pub fn run(action: FocusAction) -> CmdResult {
    let (ctx, mut hero) = load_hero()?;
    let rates = ctx.config.earn_rates();
    let now = Utc::now();

    match action {
        FocusAction::Start { task } => {
            let mut board = profile::load_board(&ctx.store);
            if board.task(&task).is_none() {
                return Err(ValidationError::NotFound {
                    kind: "task".to_string(),
                    id: task,
                }
                .into());
            }
            let start = hero.focus.start(&task, &rates);
            if let Some(previous) = &start.previous {
                let mut stats = profile::load_user_stats(&ctx.store, now);
                hero.credit_focus(previous, &mut board, &mut stats, now);
                profile::save_board(&ctx.store, &board)?;
                profile::save_user_stats(&ctx.store, &stats)?;
            }
            print_json(&Started {
                previous: start.previous,
                event: start.event,
                state: hero.focus.state(),
            })?;
        }
        FocusAction::Pause => match hero.focus.pause() {
            Some(event) => print_json(&event)?,
            None => println!("{{\"type\": \"not_running\"}}"),
        },
        FocusAction::Resume => match hero.focus.resume() {
            Some(event) => print_json(&event)?,
            None => println!("{{\"type\": \"not_paused\"}}"),
        },
        FocusAction::Stop => match hero.focus.stop(&rates) {
            Some(reward) => {
                let mut board = profile::load_board(&ctx.store);
                let mut stats = profile::load_user_stats(&ctx.store, now);
                hero.credit_focus(&reward, &mut board, &mut stats, now);
                profile::save_board(&ctx.store, &board)?;
                profile::save_user_stats(&ctx.store, &stats)?;
                print_json(&Event::FocusStopped { reward, at: now })?;
            }
            None => println!("{{\"type\": \"not_running\"}}"),
        },
        FocusAction::Status => {
            let elapsed_secs = hero.focus.tick();
            let pending = hero
                .focus
                .task_id()
                .map(|id| rates.reward(id, elapsed_secs));
            print_json(&Status {
                state: hero.focus.state(),
                task_id: hero.focus.task_id(),
                elapsed_secs,
                pending,
            })?;
        }
    }

    hero.save(&ctx.store)?;
    Ok(())
}
