use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::allowance::Allowance;
use crate::focus::FocusReward;
use crate::rank::Rank;

/// Every state change of the hero produces an Event.
/// The CLI prints them; display sinks can replay them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Event {
    TrackingStarted {
        at: DateTime<Utc>,
    },
    TrackingStopped {
        at: DateTime<Utc>,
    },
    /// A full unproductive minute was paid for with allowance.
    MinuteProtected {
        minute: u64,
        allowance_left: Allowance,
        at: DateTime<Utc>,
    },
    /// A full unproductive minute was not covered and cost a point.
    MinuteDecayed {
        minute: u64,
        points: i64,
        at: DateTime<Utc>,
    },
    /// Tier or number changed (ledger-only changes do not emit this).
    RankChanged {
        from: Rank,
        to: Rank,
        at: DateTime<Utc>,
    },
    FocusStarted {
        task_id: String,
        at: DateTime<Utc>,
    },
    FocusPaused {
        task_id: String,
        elapsed_secs: u64,
        at: DateTime<Utc>,
    },
    FocusResumed {
        task_id: String,
        elapsed_secs: u64,
        at: DateTime<Utc>,
    },
    FocusStopped {
        reward: FocusReward,
        at: DateTime<Utc>,
    },
    TaskCompleted {
        task_id: String,
        points_awarded: i64,
        rank: Rank,
        at: DateTime<Utc>,
    },
}

impl Event {
    /// Emit `RankChanged` only when the visible rank moved.
    pub fn rank_changed(from: &Rank, to: &Rank) -> Option<Event> {
        if (from.class, from.number) == (to.class, to.number) {
            return None;
        }
        Some(Event::RankChanged {
            from: *from,
            to: *to,
            at: Utc::now(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rank::{rank_from_points, Rank};

    #[test]
    fn ledger_only_change_is_silent() {
        let a = Rank::initial();
        let b = rank_from_points(5);
        assert!(Event::rank_changed(&a, &b).is_none());
    }

    #[test]
    fn serializes_with_snake_case_tag() {
        let event = Event::rank_changed(&Rank::initial(), &rank_from_points(-20)).unwrap();
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["type"], "rank_changed");
        assert_eq!(json["to"]["number"], 502);
    }
}
