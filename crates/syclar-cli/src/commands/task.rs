//! Tactical board commands for CLI.

use chrono::Utc;
use clap::Subcommand;
use serde::Serialize;
use syclar_core::board::format_minutes;
use syclar_core::error::ValidationError;
use syclar_core::integrations::{provider_from_env, SubtaskSuggestion, SuggestionProvider};
use syclar_core::profile::{self, CompletedTask};
use syclar_core::stats::StatsStore;
use syclar_core::{Board, Task};

use super::{block_on, load_hero, print_json, CmdResult, Context};

#[derive(Subcommand)]
pub enum TaskAction {
    /// Add a task to the board
    Add {
        /// Task label
        label: String,
    },
    /// List tasks
    List,
    /// Remove a task
    Remove {
        /// Task ID
        id: String,
    },
    /// Add a subtask
    Subtask {
        /// Task ID
        task: String,
        /// Subtask label
        label: String,
        /// Estimated minutes
        #[arg(long)]
        minutes: Option<u32>,
    },
    /// Flip a subtask's done flag
    ToggleSubtask {
        /// Task ID
        task: String,
        /// Subtask ID
        subtask: String,
    },
    /// Toggle a task's completion; finishing awards rank points
    Complete {
        /// Task ID
        id: String,
    },
    /// Break a task into suggested subtasks
    Breakdown {
        /// Task ID
        id: String,
        /// Rough size of the task in hours
        #[arg(long)]
        hours: Option<f64>,
    },
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct TaskView<'a> {
    #[serde(flatten)]
    task: &'a Task,
    time_spent_label: String,
    estimate_label: String,
}

impl<'a> From<&'a Task> for TaskView<'a> {
    fn from(task: &'a Task) -> Self {
        Self {
            task,
            time_spent_label: format_minutes(task.time_spent),
            estimate_label: format_minutes(task.subtask_estimate()),
        }
    }
}

#[derive(Serialize)]
struct Breakdown {
    task_id: String,
    added: usize,
    mock: bool,
    subtasks: Vec<SubtaskSuggestion>,
}

pub fn run(action: TaskAction) -> CmdResult {
    match action {
        TaskAction::Add { label } => with_board(|board| {
            print_json(&TaskView::from(board.add_task(&label)?))?;
            Ok(true)
        }),
        TaskAction::List => with_board(|board| {
            let views: Vec<TaskView> = board.tasks.iter().map(TaskView::from).collect();
            print_json(&views)?;
            Ok(false)
        }),
        TaskAction::Remove { id } => with_board(|board| {
            print_json(&board.remove_task(&id)?)?;
            Ok(true)
        }),
        TaskAction::Subtask {
            task,
            label,
            minutes,
        } => with_board(|board| {
            print_json(board.add_subtask(&task, &label, minutes)?)?;
            Ok(true)
        }),
        TaskAction::ToggleSubtask { task, subtask } => with_board(|board| {
            let done = board.toggle_subtask(&task, &subtask)?;
            print_json(&serde_json::json!({ "id": subtask, "done": done }))?;
            Ok(true)
        }),
        TaskAction::Complete { id } => complete(&id),
        TaskAction::Breakdown { id, hours } => breakdown(&id, hours),
    }
}

/// Load the board, apply `f`, and save when it reports a change.
fn with_board<F>(f: F) -> CmdResult
where
    F: FnOnce(&mut Board) -> Result<bool, Box<dyn std::error::Error>>,
{
    let ctx = Context::open()?;
    let mut board = profile::load_board(&ctx.store);
    if f(&mut board)? {
        profile::save_board(&ctx.store, &board)?;
    }
    Ok(())
}

fn complete(id: &str) -> CmdResult {
    let (ctx, mut hero) = load_hero()?;
    let now = Utc::now();
    let mut board = profile::load_board(&ctx.store);
    let mut stats = profile::load_user_stats(&ctx.store, now);

    let points = ctx.config.focus.task_completion_points;
    let outcome: Option<CompletedTask> = hero.complete_task(&mut board, id, points, &mut stats, now)?;

    if outcome.is_some() {
        let shared = StatsStore::new(&ctx.store).with_cache_secs(ctx.config.store.aggregate_cache_secs);
        if let Err(e) = shared.store(&stats) {
            tracing::warn!(error = %e, "failed to publish stats");
        }
        profile::save_user_stats(&ctx.store, &stats)?;
        hero.save(&ctx.store)?;
    }
    profile::save_board(&ctx.store, &board)?;

    match outcome {
        Some(done) => print_json(&done),
        None => print_json(&serde_json::json!({ "type": "task_reopened", "task_id": id })),
    }
}

fn breakdown(id: &str, hours: Option<f64>) -> CmdResult {
    let ctx = Context::open()?;
    let mut board = profile::load_board(&ctx.store);
    let label = board
        .task(id)
        .map(|t| t.label.clone())
        .ok_or_else(|| ValidationError::NotFound {
            kind: "task".to_string(),
            id: id.to_string(),
        })?;

    let provider = provider_from_env(&ctx.config.ai);
    let subtasks = block_on(provider.breakdown_task(&label, hours))??;
    let added = board.add_suggestions(id, &subtasks)?;
    profile::save_board(&ctx.store, &board)?;

    print_json(&Breakdown {
        task_id: id.to_string(),
        added,
        mock: provider.is_mock(),
        subtasks,
    })
}
