//! Strategy planner commands for CLI.

use chrono::Utc;
use clap::Subcommand;
use serde::Serialize;
use syclar_core::error::{CoreError, ValidationError};
use syclar_core::integrations::{provider_from_env, SuggestionProvider};
use syclar_core::profile;
use syclar_core::strategy::PillarUpdate;
use syclar_core::{Plan, Stone};

use super::{block_on, print_json, CmdResult, Context};

#[derive(Subcommand)]
pub enum PlanAction {
    /// Print pillars and stones as JSON
    Show,
    /// Add an empty pillar (at most three)
    AddPillar,
    /// Remove a pillar and its stones
    RemovePillar {
        /// Pillar ID
        id: String,
    },
    /// Rename a pillar or change what winning means
    UpdatePillar {
        /// Pillar ID
        id: String,
        #[arg(long)]
        name: Option<String>,
        /// Win definition
        #[arg(long)]
        win: Option<String>,
    },
    /// Add a stone (milestone) to a pillar
    AddStone {
        /// Pillar ID
        pillar: String,
        /// Stone name
        name: String,
    },
    /// Remove a stone
    RemoveStone {
        /// Stone ID
        id: String,
    },
    /// Generate milestones for a pillar from its name and win definition
    Generate {
        /// Pillar ID
        pillar: String,
    },
    /// Start a stone and put it on the board as a task
    StartStone {
        /// Stone ID
        id: String,
    },
    /// Mark a stone completed
    CompleteStone {
        /// Stone ID
        id: String,
    },
}

#[derive(Serialize)]
struct Started<'a> {
    stone: &'a Stone,
    task_id: String,
}

pub fn run(action: PlanAction) -> CmdResult {
    let ctx = Context::open()?;
    let mut plan = profile::load_plan(&ctx.store);
    let now = Utc::now();

    match action {
        PlanAction::Show => {
            print_json(&plan)?;
            return Ok(());
        }
        PlanAction::AddPillar => print_json(plan.add_pillar()?)?,
        PlanAction::RemovePillar { id } => print_json(&plan.remove_pillar(&id)?)?,
        PlanAction::UpdatePillar { id, name, win } => print_json(plan.update_pillar(
            &id,
            PillarUpdate {
                name,
                win_definition: win,
            },
        )?)?,
        PlanAction::AddStone { pillar, name } => print_json(plan.add_stone(&pillar, &name)?)?,
        PlanAction::RemoveStone { id } => print_json(&plan.remove_stone(&id)?)?,
        PlanAction::Generate { pillar } => generate(&ctx, &mut plan, &pillar)?,
        PlanAction::StartStone { id } => {
            let stone = plan.start_stone(&id)?;
            let mut board = profile::load_board(&ctx.store);
            let task_id = board.add_task_from_stone(&stone.name)?;
            profile::save_board(&ctx.store, &board)?;
            print_json(&Started { stone, task_id })?;
        }
        PlanAction::CompleteStone { id } => print_json(plan.complete_stone(&id, now)?)?,
    }

    profile::save_plan(&ctx.store, &plan)?;
    Ok(())
}

fn generate(ctx: &Context, plan: &mut Plan, pillar_id: &str) -> CmdResult {
    let pillar = plan.pillar(pillar_id).ok_or_else(|| {
        CoreError::from(ValidationError::NotFound {
            kind: "pillar".to_string(),
            id: pillar_id.to_string(),
        })
    })?;
    let (name, win) = (pillar.name.clone(), pillar.win_definition.clone());

    let provider = provider_from_env(&ctx.config.ai);
    let milestones = block_on(provider.generate_milestones(&name, &win))??;
    let added = plan.add_milestones(pillar_id, &milestones, Utc::now())?;
    tracing::info!(pillar = pillar_id, added, mock = provider.is_mock(), "milestones generated");

    let stones: Vec<&Stone> = plan.stones_for(pillar_id).collect();
    print_json(&stones)
}
