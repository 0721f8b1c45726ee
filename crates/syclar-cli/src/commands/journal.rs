use chrono::Utc;
use clap::Subcommand;
use syclar_core::error::CoreError;
use syclar_core::Journal;

use super::{print_json, CmdResult, Context};

#[derive(Subcommand)]
pub enum StoryAction {
    /// Save a story (up to 2000 characters)
    Add {
        content: String,
    },
    /// List stories, newest first
    List,
    /// Delete a story
    Delete {
        /// Story ID
        id: i64,
    },
}

#[derive(Subcommand)]
pub enum AccomplishAction {
    /// Replace a client's accomplishments with a JSON object
    Save {
        /// Client ID
        client: String,
        /// JSON object
        json: String,
    },
    /// Print a client's accomplishments
    Load {
        /// Client ID
        client: String,
    },
}

pub fn run_story(action: StoryAction) -> CmdResult {
    let ctx = Context::open()?;
    let journal = Journal::new(&ctx.store);

    match action {
        StoryAction::Add { content } => print_json(&journal.add_story(&content, Utc::now())?),
        StoryAction::List => print_json(&journal.list_stories()?),
        StoryAction::Delete { id } => {
            let deleted = journal.delete_story(id)?;
            print_json(&serde_json::json!({ "id": id, "deleted": deleted }))
        }
    }
}

pub fn run_accomplish(action: AccomplishAction) -> CmdResult {
    let ctx = Context::open()?;
    let journal = Journal::new(&ctx.store);

    match action {
        AccomplishAction::Save { client, json } => {
            let value: serde_json::Value = serde_json::from_str(&json)
                .map_err(|e| CoreError::invalid("accomplishments", e.to_string()))?;
            journal.save_accomplishments(&client, &value)?;
            println!("ok");
            Ok(())
        }
        AccomplishAction::Load { client } => print_json(&journal.load_accomplishments(&client)?),
    }
}
