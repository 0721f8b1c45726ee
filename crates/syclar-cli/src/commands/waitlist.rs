use chrono::Utc;
use clap::Subcommand;
use syclar_core::integrations::notifier_from_env;
use syclar_core::Waitlist;

use super::{block_on, print_json, CmdResult, Context};

const ADMIN_KEY_ENV: &str = "SYCLAR_ADMIN_KEY";

#[derive(Subcommand)]
pub enum WaitlistAction {
    /// Sign up an email address
    Join {
        email: String,
    },
    /// Number of signups
    Count,
    /// List signups, newest first
    List {
        /// Admin key; required when SYCLAR_ADMIN_KEY is set
        #[arg(long)]
        key: Option<String>,
    },
}

pub fn run(action: WaitlistAction) -> CmdResult {
    let ctx = Context::open()?;
    let list = Waitlist::new(&ctx.store);

    match action {
        WaitlistAction::Join { email } => {
            let notifier = notifier_from_env(&ctx.config.notify);
            tracing::debug!(notifier = notifier.name(), "joining waitlist");
            let outcome = block_on(list.join(&email, Utc::now(), &notifier))??;
            print_json(&outcome)
        }
        WaitlistAction::Count => print_json(&serde_json::json!({ "count": list.count() })),
        WaitlistAction::List { key } => {
            let expected = std::env::var(ADMIN_KEY_ENV).ok();
            print_json(&list.list(key.as_deref(), expected.as_deref())?)
        }
    }
}
