//! # Syclar Core Library
//!
//! Core logic for Syclar, a hero-rank productivity tracker. Every operation is
//! available through the standalone `syclar` CLI, which is a thin layer over
//! this crate.
//!
//! ## Architecture
//!
//! - **Rank engine**: a pure mapping from a signed point balance to a tiered
//!   rank (`F` .. `S`, `#1000` .. `#1`)
//! - **Allowance policy**: unproductive minutes are paid for with allowance,
//!   and cost rank points once the wallet is empty
//! - **Focus accounting**: timed sessions on a task earn allowance and goodwill
//! - **Storage**: a Redis-like [`KvStore`] over SQLite or memory, and a
//!   TOML [`Config`]
//! - **Integrations**: signup notifications (Resend, SendGrid) and AI task
//!   breakdowns (OpenAI-compatible)
//!
//! ## Key Components
//!
//! - [`Rank`] and [`rank_from_points`]: the rank engine
//! - [`AllowancePolicy`]: per-tick decay and protection
//! - [`FocusSession`]: wall-clock focus timer; the caller drives `tick()`
//! - [`HeroProfile`]: the persisted hero state tying it all together

pub mod allowance;
pub mod board;
pub mod error;
pub mod events;
pub mod focus;
pub mod integrations;
pub mod journal;
pub mod profile;
pub mod rank;
pub mod stats;
pub mod storage;
pub mod strategy;
pub mod waitlist;

pub use allowance::{Allowance, AllowancePolicy, DomainDenylist, Tick, TickReport, TrackerState, Wallet};
pub use board::{Board, Subtask, Task};
pub use error::{ConfigError, CoreError, DatabaseError, ValidationError};
pub use events::Event;
pub use focus::{EarnRates, FocusReward, FocusSession, FocusState};
pub use journal::{Journal, Story};
pub use profile::HeroProfile;
pub use rank::{add_points, rank_from_points, rank_up_info, Rank, Tier};
pub use stats::{StatsStore, UserStats};
pub use storage::{Config, Database, KvStore, MemoryStore};
pub use strategy::{Pillar, Plan, Stone};
pub use waitlist::Waitlist;
