//! Screentime tracker: allowance spend vs. rank decay.
//!
//! The tracker owns no clock. The caller ticks it with the number of
//! elapsed seconds and the current classification; each second is applied
//! in order so that every minute boundary is evaluated exactly once.
//!
//! ## Per-second rules
//!
//! ```text
//! productive     -> counter = 0, protected = false
//! unproductive   -> counter += 1
//!   counter % 60 == 0 and allowance >= cost -> spend cost (protected)
//!   counter % 60 == 0 and allowance <  cost -> rank points -= 1
//!   otherwise                              -> protected = allowance >= cost
//! ```

use serde::{Deserialize, Serialize};

use super::ledger::{Allowance, Wallet};
use crate::events::Event;
use crate::rank::{Rank, RankCurve};

/// 0.01 allowance per unprotected-site minute.
pub const DEFAULT_ALLOWANCE_COST_PER_MINUTE: Allowance = Allowance::from_units(100);
/// Points lost per unprotected minute.
pub const DECAY_POINTS_PER_MINUTE: i64 = 1;

const SECONDS_PER_MINUTE: u64 = 60;

/// Events kept per tick. Later ones are counted in `events_dropped`.
pub const MAX_TICK_EVENTS: usize = 120;

/// Display/persistence sink notified after each mutation.
pub trait TrackerSink {
    fn on_rank_change(&mut self, _rank: &Rank) {}
    fn on_allowance_change(&mut self, _allowance: Allowance) {}
}

/// Sink that ignores all notifications.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopSink;

impl TrackerSink for NoopSink {}

/// Tracker bookkeeping that lives next to the rank and wallet.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrackerState {
    #[serde(default)]
    pub tracking: bool,
    /// Consecutive seconds on an unproductive context.
    #[serde(default)]
    pub seconds_on_unproductive: u64,
    /// Whether allowance currently shields the rank.
    #[serde(default)]
    pub protected: bool,
}

impl TrackerState {
    pub fn start(&mut self) -> Option<Event> {
        if self.tracking {
            return None;
        }
        self.tracking = true;
        Some(Event::TrackingStarted { at: chrono::Utc::now() })
    }

    /// Stop tracking; the unproductive counter resets immediately.
    pub fn stop(&mut self) -> Option<Event> {
        let was_tracking = self.tracking;
        self.tracking = false;
        self.seconds_on_unproductive = 0;
        self.protected = false;
        was_tracking.then(|| Event::TrackingStopped { at: chrono::Utc::now() })
    }
}

/// One tick request: how much time passed and in which context.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Tick {
    pub elapsed_seconds: u64,
    pub unproductive: bool,
}

impl Tick {
    pub fn productive(elapsed_seconds: u64) -> Self {
        Self {
            elapsed_seconds,
            unproductive: false,
        }
    }

    pub fn unproductive(elapsed_seconds: u64) -> Self {
        Self {
            elapsed_seconds,
            unproductive: true,
        }
    }
}

/// What a tick did.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct TickReport {
    pub seconds_applied: u64,
    pub protected_minutes: u64,
    pub decayed_minutes: u64,
    pub allowance_spent: Allowance,
    pub points_lost: i64,
    /// At most [`MAX_TICK_EVENTS`] entries, plus one closing `RankChanged`
    /// covering the dropped tail when the rank moved during it.
    pub events: Vec<Event>,
    pub events_dropped: u64,
}

impl TickReport {
    fn push(&mut self, event: Event) -> bool {
        if self.events.len() < MAX_TICK_EVENTS {
            self.events.push(event);
            true
        } else {
            self.events_dropped += 1;
            false
        }
    }
}

/// Allowance/decay policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AllowancePolicy {
    cost_per_minute: Allowance,
    curve: RankCurve,
}

impl Default for AllowancePolicy {
    fn default() -> Self {
        Self {
            cost_per_minute: DEFAULT_ALLOWANCE_COST_PER_MINUTE,
            curve: RankCurve::default(),
        }
    }
}

impl AllowancePolicy {
    pub fn new(cost_per_minute: Allowance) -> Self {
        Self {
            cost_per_minute,
            ..Self::default()
        }
    }

    pub fn with_curve(mut self, curve: RankCurve) -> Self {
        self.curve = curve;
        self
    }

    pub fn cost_per_minute(&self) -> Allowance {
        self.cost_per_minute
    }

    /// Optimistic display flag: would the next minute be covered?
    pub fn would_protect(&self, wallet: &Wallet) -> bool {
        wallet.covers(self.cost_per_minute)
    }

    /// Apply `tick` to the tracker, rank and wallet.
    ///
    /// Does nothing while the tracker is stopped.
    pub fn tick(
        &self,
        state: &mut TrackerState,
        rank: &mut Rank,
        wallet: &mut Wallet,
        tick: Tick,
        sink: &mut dyn TrackerSink,
    ) -> TickReport {
        let mut report = TickReport::default();
        if !state.tracking {
            return report;
        }

        if !tick.unproductive {
            if tick.elapsed_seconds > 0 {
                state.seconds_on_unproductive = 0;
                state.protected = false;
                report.seconds_applied = tick.elapsed_seconds;
            }
            return report;
        }

        // Rank before the first dropped event.
        let mut truncated_from: Option<Rank> = None;

        for _ in 0..tick.elapsed_seconds {
            state.seconds_on_unproductive += 1;
            report.seconds_applied += 1;

            if state.seconds_on_unproductive % SECONDS_PER_MINUTE != 0 {
                state.protected = self.would_protect(wallet);
                continue;
            }

            let minute = state.seconds_on_unproductive / SECONDS_PER_MINUTE;
            if wallet.spend(self.cost_per_minute) {
                state.protected = true;
                report.protected_minutes += 1;
                report.allowance_spent += self.cost_per_minute;
                sink.on_allowance_change(wallet.allowance);
                let kept = report.push(Event::MinuteProtected {
                    minute,
                    allowance_left: wallet.allowance,
                    at: chrono::Utc::now(),
                });
                if !kept {
                    truncated_from.get_or_insert(*rank);
                }
            } else {
                state.protected = false;
                let before = *rank;
                *rank = self.curve.add_points(rank, -DECAY_POINTS_PER_MINUTE);
                report.decayed_minutes += 1;
                report.points_lost += DECAY_POINTS_PER_MINUTE;
                sink.on_rank_change(rank);
                let mut kept = report.push(Event::MinuteDecayed {
                    minute,
                    points: rank.points,
                    at: chrono::Utc::now(),
                });
                if let Some(changed) = Event::rank_changed(&before, rank) {
                    tracing::info!(from = %before, to = %rank, "rank decayed");
                    kept &= report.push(changed);
                }
                if !kept {
                    truncated_from.get_or_insert(before);
                }
            }
        }

        if let Some(from) = truncated_from {
            tracing::debug!(dropped = report.events_dropped, "tick events truncated");
            report.events.extend(Event::rank_changed(&from, rank));
        }

        tracing::debug!(
            seconds = report.seconds_applied,
            protected = report.protected_minutes,
            decayed = report.decayed_minutes,
            "tracker tick"
        );
        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rank::Tier;

    #[derive(Default)]
    struct Recorder {
        ranks: Vec<Rank>,
        allowances: Vec<Allowance>,
    }

    impl TrackerSink for Recorder {
        fn on_rank_change(&mut self, rank: &Rank) {
            self.ranks.push(*rank);
        }

        fn on_allowance_change(&mut self, allowance: Allowance) {
            self.allowances.push(allowance);
        }
    }

    fn tracking() -> TrackerState {
        TrackerState {
            tracking: true,
            ..TrackerState::default()
        }
    }

    fn wallet(amount: f64) -> Wallet {
        Wallet {
            allowance: Allowance::from_f64(amount),
            goodwill: 0,
        }
    }

    #[test]
    fn three_minutes_fully_protected() {
        let policy = AllowancePolicy::default();
        let mut state = tracking();
        let mut rank = Rank::initial();
        let mut wallet = wallet(0.03);
        let mut sink = Recorder::default();

        let report = policy.tick(&mut state, &mut rank, &mut wallet, Tick::unproductive(180), &mut sink);

        assert_eq!(report.protected_minutes, 3);
        assert_eq!(report.decayed_minutes, 0);
        assert!(wallet.allowance.is_zero());
        assert_eq!(rank, Rank::initial());
        assert_eq!(sink.allowances.len(), 3);
        assert!(sink.ranks.is_empty());
    }

    #[test]
    fn two_minutes_without_allowance_cost_two_points() {
        let policy = AllowancePolicy::default();
        let mut state = tracking();
        let mut rank = Rank::initial();
        let mut wallet = Wallet::default();
        let mut sink = Recorder::default();

        let report = policy.tick(&mut state, &mut rank, &mut wallet, Tick::unproductive(120), &mut sink);

        assert_eq!(report.decayed_minutes, 2);
        assert_eq!(rank.points, -2);
        assert_eq!((rank.class, rank.number), (Tier::C, 501));
        assert!(wallet.allowance.is_zero());
        assert_eq!(sink.ranks.len(), 2);
        assert!(!state.protected);
    }

    #[test]
    fn minute_boundary_counts_once_across_split_ticks() {
        let policy = AllowancePolicy::default();
        let mut state = tracking();
        let mut rank = Rank::initial();
        let mut wallet = Wallet::default();

        for _ in 0..59 {
            policy.tick(&mut state, &mut rank, &mut wallet, Tick::unproductive(1), &mut NoopSink);
        }
        assert_eq!(rank.points, 0);
        policy.tick(&mut state, &mut rank, &mut wallet, Tick::unproductive(1), &mut NoopSink);
        assert_eq!(rank.points, -1);
        policy.tick(&mut state, &mut rank, &mut wallet, Tick::unproductive(30), &mut NoopSink);
        assert_eq!(rank.points, -1);
        assert_eq!(state.seconds_on_unproductive, 90);
    }

    #[test]
    fn productive_context_resets_counter() {
        let policy = AllowancePolicy::default();
        let mut state = tracking();
        let mut rank = Rank::initial();
        let mut wallet = wallet(1.0);

        policy.tick(&mut state, &mut rank, &mut wallet, Tick::unproductive(45), &mut NoopSink);
        assert!(state.protected);
        policy.tick(&mut state, &mut rank, &mut wallet, Tick::productive(1), &mut NoopSink);
        assert_eq!(state.seconds_on_unproductive, 0);
        assert!(!state.protected);
        policy.tick(&mut state, &mut rank, &mut wallet, Tick::unproductive(45), &mut NoopSink);
        assert_eq!(wallet.allowance, Allowance::from_f64(1.0));
    }

    #[test]
    fn protection_runs_out_mid_session() {
        let policy = AllowancePolicy::default();
        let mut state = tracking();
        let mut rank = Rank::initial();
        let mut wallet = wallet(0.01);

        let report = policy.tick(&mut state, &mut rank, &mut wallet, Tick::unproductive(90), &mut NoopSink);
        assert_eq!(report.protected_minutes, 1);
        assert!(!state.protected, "next minute is no longer covered");
        let report = policy.tick(&mut state, &mut rank, &mut wallet, Tick::unproductive(30), &mut NoopSink);
        assert_eq!(report.decayed_minutes, 1);
        assert_eq!(rank.points, -1);
    }

    #[test]
    fn stopped_tracker_ignores_ticks() {
        let policy = AllowancePolicy::default();
        let mut state = TrackerState::default();
        let mut rank = Rank::initial();
        let mut wallet = Wallet::default();

        let report = policy.tick(&mut state, &mut rank, &mut wallet, Tick::unproductive(600), &mut NoopSink);
        assert_eq!(report, TickReport::default());
        assert_eq!(rank.points, 0);
    }

    #[test]
    fn stop_resets_counter_immediately() {
        let policy = AllowancePolicy::default();
        let mut state = tracking();
        let mut rank = Rank::initial();
        let mut wallet = Wallet::default();

        policy.tick(&mut state, &mut rank, &mut wallet, Tick::unproductive(50), &mut NoopSink);
        assert!(state.stop().is_some());
        assert_eq!(state.seconds_on_unproductive, 0);
        assert!(state.stop().is_none());
        assert!(state.start().is_some());
        policy.tick(&mut state, &mut rank, &mut wallet, Tick::unproductive(50), &mut NoopSink);
        assert_eq!(rank.points, 0, "counter restarted, no minute crossed");
    }

    #[test]
    fn decay_emits_rank_changed_only_on_visible_move() {
        let policy = AllowancePolicy::default();
        let mut state = tracking();
        let mut rank = Rank::initial();
        let mut wallet = Wallet::default();

        let report = policy.tick(&mut state, &mut rank, &mut wallet, Tick::unproductive(60 * 11), &mut NoopSink);
        let changes = report
            .events
            .iter()
            .filter(|e| matches!(e, Event::RankChanged { .. }))
            .count();
        // -1 and -11 cross a 10-point step; -2..=-10 stay at #501.
        assert_eq!(changes, 2);
        assert_eq!(rank.number, 502);
    }

    #[test]
    fn long_tick_keeps_event_list_bounded() {
        let policy = AllowancePolicy::default();
        let mut state = tracking();
        let mut rank = Rank::initial();
        let mut wallet = Wallet::default();
        let mut sink = Recorder::default();
        let minutes = 30 * 24 * 60;

        let report = policy.tick(
            &mut state,
            &mut rank,
            &mut wallet,
            Tick::unproductive(minutes * 60),
            &mut sink,
        );

        assert_eq!(report.decayed_minutes, minutes);
        assert_eq!(rank.points, -(minutes as i64));
        assert_eq!(sink.ranks.len() as u64, minutes);
        assert!(report.events.len() <= MAX_TICK_EVENTS + 1);
        assert!(report.events_dropped > 0);
        match report.events.last() {
            Some(Event::RankChanged { to, .. }) => assert_eq!(*to, rank),
            other => panic!("expected closing rank change, got {other:?}"),
        }
    }

    #[test]
    fn short_tick_drops_nothing() {
        let policy = AllowancePolicy::default();
        let mut state = tracking();
        let mut rank = Rank::initial();
        let mut wallet = wallet(0.5);

        let report = policy.tick(&mut state, &mut rank, &mut wallet, Tick::unproductive(60 * 60), &mut NoopSink);
        assert_eq!(report.events.len(), 60);
        assert_eq!(report.events_dropped, 0);
    }
}
