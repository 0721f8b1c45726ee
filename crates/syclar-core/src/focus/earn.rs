use serde::{Deserialize, Serialize};

use crate::allowance::Allowance;

/// Points awarded when a task is marked complete.
pub const TASK_COMPLETION_POINTS: i64 = 10;

/// Conversion rates from focused minutes to allowance and goodwill.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EarnRates {
    pub block_minutes: u64,
    pub allowance_per_block: Allowance,
    pub goodwill_per_block: u64,
}

impl Default for EarnRates {
    fn default() -> Self {
        Self {
            block_minutes: 5,
            allowance_per_block: Allowance::from_units(500),
            goodwill_per_block: 1,
        }
    }
}

impl EarnRates {
    /// Reward for `elapsed_secs` of focus on `task_id`.
    ///
    /// Only whole minutes count, and only whole blocks of minutes earn.
    pub fn reward(&self, task_id: impl Into<String>, elapsed_secs: u64) -> FocusReward {
        let minutes = elapsed_secs / 60;
        let blocks = if self.block_minutes == 0 {
            0
        } else {
            minutes / self.block_minutes
        };
        FocusReward {
            task_id: task_id.into(),
            minutes,
            blocks,
            allowance: self.allowance_per_block * blocks,
            goodwill: self.goodwill_per_block.saturating_mul(blocks),
        }
    }
}

/// What a finished focus session earned.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FocusReward {
    pub task_id: String,
    pub minutes: u64,
    pub blocks: u64,
    pub allowance: Allowance,
    pub goodwill: u64,
}
