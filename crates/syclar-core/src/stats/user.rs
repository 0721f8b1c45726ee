//! Per-user activity totals and the daily streak.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// Extra accounting attached to a completed cycle.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CycleData {
    #[serde(default)]
    pub estimated_minutes: u64,
    #[serde(default)]
    pub actual_minutes: u64,
    #[serde(default)]
    pub time_saved: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserStats {
    pub user_id: String,
    #[serde(default)]
    pub total_cycles: u64,
    #[serde(default)]
    pub total_focus_minutes: u64,
    #[serde(default)]
    pub total_tasks_completed: u64,
    /// Consecutive active days.
    #[serde(default)]
    pub current_streak: u32,
    #[serde(default)]
    pub longest_streak: u32,
    pub last_activity_date: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub total_estimated_minutes: u64,
    #[serde(default)]
    pub total_actual_minutes: u64,
    #[serde(default)]
    pub total_time_saved: u64,
}

/// Fresh client identifier, `user_<millis>_<7 chars>`.
pub fn new_user_id(now: DateTime<Utc>) -> String {
    let suffix: String = uuid::Uuid::new_v4().simple().to_string().chars().take(7).collect();
    format!("user_{}_{suffix}", now.timestamp_millis())
}

impl UserStats {
    pub fn new(user_id: impl Into<String>, now: DateTime<Utc>) -> Self {
        Self {
            user_id: user_id.into(),
            total_cycles: 0,
            total_focus_minutes: 0,
            total_tasks_completed: 0,
            current_streak: 0,
            longest_streak: 0,
            last_activity_date: now,
            created_at: now,
            total_estimated_minutes: 0,
            total_actual_minutes: 0,
            total_time_saved: 0,
        }
    }

    /// Record a completed cycle (a finished task).
    ///
    /// Streak by UTC calendar day: same day keeps it, the day after the last
    /// activity extends it, any longer gap restarts it at 1.
    pub fn record_cycle(&mut self, now: DateTime<Utc>, data: CycleData) {
        let today = now.date_naive();
        let last = self.last_activity_date.date_naive();

        self.current_streak = if today == last {
            self.current_streak.max(1)
        } else if today == last + Duration::days(1) {
            self.current_streak + 1
        } else {
            1
        };
        self.longest_streak = self.longest_streak.max(self.current_streak);

        self.total_cycles += 1;
        self.total_tasks_completed += 1;
        self.total_estimated_minutes += data.estimated_minutes;
        self.total_actual_minutes += data.actual_minutes;
        self.total_time_saved += data.time_saved;
        self.last_activity_date = now;
    }

    pub fn record_focus_time(&mut self, minutes: u64, now: DateTime<Utc>) {
        self.total_focus_minutes += minutes;
        self.last_activity_date = now;
    }
}
