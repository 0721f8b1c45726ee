//! Focus accounting: timed sessions on a task earn allowance and goodwill.

mod earn;
mod session;

pub use earn::{EarnRates, FocusReward, TASK_COMPLETION_POINTS};
pub use session::{FocusSession, FocusStart, FocusState};
