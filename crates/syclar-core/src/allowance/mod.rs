//! Screentime-to-allowance policy.
//!
//! Unproductive time is paid for with allowance while it lasts; once the
//! wallet runs dry every full unproductive minute costs a rank point.

mod classifier;
mod ledger;
mod tracker;

pub use classifier::{ContextClassifier, DomainDenylist, DEFAULT_UNPRODUCTIVE_DOMAINS};
pub use ledger::{Allowance, Wallet};
pub use tracker::{
    AllowancePolicy, NoopSink, Tick, TickReport, TrackerSink, TrackerState,
    DECAY_POINTS_PER_MINUTE, DEFAULT_ALLOWANCE_COST_PER_MINUTE,
};
