//! Focus session timer.
//!
//! Wall-clock based like the rest of the engine: no internal thread, the
//! session only records when it was last resumed and how much time was
//! banked before that. This lets a one-shot CLI process persist it and pick
//! it up again later.
//!
//! ## State Transitions
//!
//! ```text
//! Idle -> Running <-> Paused -> Idle
//! ```

use chrono::Utc;
use serde::{Deserialize, Serialize};

use super::earn::{EarnRates, FocusReward};
use crate::events::Event;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FocusState {
    #[default]
    Idle,
    Running,
    Paused,
}

/// Result of starting a session.
#[derive(Debug, Clone, PartialEq)]
pub struct FocusStart {
    /// Reward of a session on another task that had to be stopped first.
    pub previous: Option<FocusReward>,
    pub event: Option<Event>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FocusSession {
    #[serde(default)]
    state: FocusState,
    #[serde(default)]
    task_id: Option<String>,
    /// Focus time banked before the current run, in milliseconds.
    #[serde(default)]
    elapsed_ms: u64,
    #[serde(default)]
    last_resumed_epoch_ms: Option<u64>,
}

impl FocusSession {
    pub fn new() -> Self {
        Self::default()
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn state(&self) -> FocusState {
        self.state
    }

    pub fn task_id(&self) -> Option<&str> {
        self.task_id.as_deref()
    }

    pub fn is_active(&self) -> bool {
        self.state != FocusState::Idle
    }

    pub fn elapsed_ms_at(&self, now_ms: u64) -> u64 {
        match (self.state, self.last_resumed_epoch_ms) {
            (FocusState::Running, Some(since)) => {
                self.elapsed_ms + now_ms.saturating_sub(since)
            }
            _ => self.elapsed_ms,
        }
    }

    pub fn elapsed_seconds_at(&self, now_ms: u64) -> u64 {
        self.elapsed_ms_at(now_ms) / 1000
    }

    pub fn elapsed_seconds(&self) -> u64 {
        self.elapsed_seconds_at(now_ms())
    }

    // ── Commands ─────────────────────────────────────────────────────

    /// Start focusing on `task_id`.
    ///
    /// A session on a different task is stopped and rewarded first. Starting
    /// the task that is already running does nothing; starting the task that
    /// is paused resumes it.
    pub fn start_at(&mut self, task_id: &str, now_ms: u64, rates: &EarnRates) -> FocusStart {
        let mut previous = None;
        if let Some(current) = self.task_id.as_deref() {
            if current == task_id {
                let event = match self.state {
                    FocusState::Paused => self.resume_at(now_ms),
                    _ => None,
                };
                return FocusStart { previous, event };
            }
            previous = self.stop_at(now_ms, rates);
        }

        self.state = FocusState::Running;
        self.task_id = Some(task_id.to_string());
        self.elapsed_ms = 0;
        self.last_resumed_epoch_ms = Some(now_ms);
        tracing::debug!(task_id, "focus started");
        FocusStart {
            previous,
            event: Some(Event::FocusStarted {
                task_id: task_id.to_string(),
                at: Utc::now(),
            }),
        }
    }

    pub fn pause_at(&mut self, now_ms: u64) -> Option<Event> {
        if self.state != FocusState::Running {
            return None;
        }
        self.flush_elapsed(now_ms);
        self.state = FocusState::Paused;
        self.last_resumed_epoch_ms = None;
        Some(Event::FocusPaused {
            task_id: self.task_id.clone().unwrap_or_default(),
            elapsed_secs: self.elapsed_ms / 1000,
            at: Utc::now(),
        })
    }

    pub fn resume_at(&mut self, now_ms: u64) -> Option<Event> {
        if self.state != FocusState::Paused {
            return None;
        }
        self.state = FocusState::Running;
        self.last_resumed_epoch_ms = Some(now_ms);
        Some(Event::FocusResumed {
            task_id: self.task_id.clone().unwrap_or_default(),
            elapsed_secs: self.elapsed_ms / 1000,
            at: Utc::now(),
        })
    }

    /// Bank the wall-clock time since the last tick. Returns elapsed seconds.
    pub fn tick_at(&mut self, now_ms: u64) -> u64 {
        if self.state == FocusState::Running {
            self.flush_elapsed(now_ms);
        }
        self.elapsed_ms / 1000
    }

    /// End the session and convert its elapsed time into a reward.
    pub fn stop_at(&mut self, now_ms: u64, rates: &EarnRates) -> Option<FocusReward> {
        if self.state == FocusState::Idle {
            return None;
        }
        let elapsed_secs = self.elapsed_seconds_at(now_ms);
        let task_id = self.task_id.take().unwrap_or_default();
        *self = Self::default();
        let reward = rates.reward(task_id, elapsed_secs);
        tracing::info!(
            task_id = %reward.task_id,
            minutes = reward.minutes,
            blocks = reward.blocks,
            "focus stopped"
        );
        Some(reward)
    }

    pub fn start(&mut self, task_id: &str, rates: &EarnRates) -> FocusStart {
        self.start_at(task_id, now_ms(), rates)
    }

    pub fn pause(&mut self) -> Option<Event> {
        self.pause_at(now_ms())
    }

    pub fn resume(&mut self) -> Option<Event> {
        self.resume_at(now_ms())
    }

    pub fn tick(&mut self) -> u64 {
        self.tick_at(now_ms())
    }

    pub fn stop(&mut self, rates: &EarnRates) -> Option<FocusReward> {
        self.stop_at(now_ms(), rates)
    }

    fn flush_elapsed(&mut self, now_ms: u64) {
        if let Some(since) = self.last_resumed_epoch_ms {
            self.elapsed_ms += now_ms.saturating_sub(since);
            self.last_resumed_epoch_ms = Some(now_ms);
        }
    }
}

fn now_ms() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as u64
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::allowance::Allowance;

    const MIN: u64 = 60_000;

    #[test]
    fn start_pause_resume_stop() {
        let rates = EarnRates::default();
        let mut s = FocusSession::new();
        assert!(s.start_at("t1", 0, &rates).event.is_some());
        assert_eq!(s.state(), FocusState::Running);

        assert!(s.pause_at(4 * MIN).is_some());
        assert_eq!(s.state(), FocusState::Paused);
        // Time while paused does not count.
        assert_eq!(s.elapsed_seconds_at(60 * MIN), 240);

        assert!(s.resume_at(60 * MIN).is_some());
        let reward = s.stop_at(66 * MIN, &rates).unwrap();
        assert_eq!(reward.task_id, "t1");
        assert_eq!(reward.minutes, 10);
        assert_eq!(reward.blocks, 2);
        assert_eq!(reward.allowance, Allowance::from_f64(0.1));
        assert_eq!(s, FocusSession::default());
    }

    #[test]
    fn switching_task_stops_previous() {
        let rates = EarnRates::default();
        let mut s = FocusSession::new();
        s.start_at("t1", 0, &rates);
        let started = s.start_at("t2", 5 * MIN, &rates);
        let previous = started.previous.unwrap();
        assert_eq!(previous.task_id, "t1");
        assert_eq!(previous.blocks, 1);
        assert_eq!(s.task_id(), Some("t2"));
        assert_eq!(s.elapsed_seconds_at(5 * MIN), 0);
    }

    #[test]
    fn restarting_same_task_is_a_noop_or_resume() {
        let rates = EarnRates::default();
        let mut s = FocusSession::new();
        s.start_at("t1", 0, &rates);
        let again = s.start_at("t1", MIN, &rates);
        assert!(again.previous.is_none());
        assert!(again.event.is_none());

        s.pause_at(2 * MIN);
        let resumed = s.start_at("t1", 3 * MIN, &rates);
        assert!(matches!(resumed.event, Some(Event::FocusResumed { .. })));
        assert_eq!(s.elapsed_seconds_at(4 * MIN), 180);
    }

    #[test]
    fn tick_banks_elapsed_time() {
        let rates = EarnRates::default();
        let mut s = FocusSession::new();
        s.start_at("t1", 1_000, &rates);
        assert_eq!(s.tick_at(31_000), 30);
        assert_eq!(s.tick_at(61_000), 60);
        assert_eq!(s.elapsed_seconds_at(61_000), 60);
    }

    #[test]
    fn invalid_transitions_return_none() {
        let rates = EarnRates::default();
        let mut s = FocusSession::new();
        assert!(s.pause_at(0).is_none());
        assert!(s.resume_at(0).is_none());
        assert!(s.stop_at(0, &rates).is_none());
    }

    #[test]
    fn survives_serialization() {
        let rates = EarnRates::default();
        let mut s = FocusSession::new();
        s.start_at("t1", 0, &rates);
        let json = serde_json::to_string(&s).unwrap();
        let mut restored: FocusSession = serde_json::from_str(&json).unwrap();
        let reward = restored.stop_at(5 * MIN, &rates).unwrap();
        assert_eq!(reward.blocks, 1);
    }
}
