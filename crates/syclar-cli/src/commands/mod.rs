pub mod config;
pub mod focus;
pub mod journal;
pub mod plan;
pub mod rank;
pub mod stats;
pub mod task;
pub mod track;
pub mod waitlist;

use std::future::Future;

use serde::Serialize;
use syclar_core::storage::{self, KvStore};
use syclar_core::{Config, HeroProfile};

pub type CmdResult = Result<(), Box<dyn std::error::Error>>;

/// Loaded configuration plus the store it selects.
pub struct Context {
    pub config: Config,
    pub store: Box<dyn KvStore>,
}

impl Context {
    pub fn open() -> Result<Self, Box<dyn std::error::Error>> {
        let config = Config::load()?;
        let store = storage::open_store(&config)?;
        Ok(Self { config, store })
    }
}

pub fn load_hero() -> Result<(Context, HeroProfile), Box<dyn std::error::Error>> {
    let ctx = Context::open()?;
    let hero = HeroProfile::load(&ctx.store);
    Ok((ctx, hero))
}

pub fn print_json<T: Serialize + ?Sized>(value: &T) -> CmdResult {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Drive a core future to completion on a single-use runtime.
pub fn block_on<F: Future>(future: F) -> Result<F::Output, Box<dyn std::error::Error>> {
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;
    Ok(runtime.block_on(future))
}
