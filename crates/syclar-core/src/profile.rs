//! Hero profile: the rank, wallet, tracker and focus session that belong to
//! the local user, plus the persisted board, plan and stats around them.
//!
//! Everything lives in a [`KvStore`] as JSON. Loading never fails: a missing
//! or unreadable entry falls back to its initial value with a warning, so a
//! damaged store cannot lock the user out of their hero.

use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::allowance::{AllowancePolicy, ContextClassifier, Tick, TickReport, TrackerSink, TrackerState, Wallet};
use crate::board::{Board, TaskCompletion};
use crate::error::Result;
use crate::events::Event;
use crate::focus::{FocusReward, FocusSession};
use crate::rank::{add_points, Rank};
use crate::stats::{new_user_id, CycleData, UserStats};
use crate::storage::{get_json, set_json, KvStore};
use crate::strategy::Plan;

const RANK_KEY: &str = "hero:rank";
const WALLET_KEY: &str = "hero:wallet";
const TRACKER_KEY: &str = "hero:tracker";
const FOCUS_KEY: &str = "hero:focus";
const STATS_KEY: &str = "hero:stats";
const BOARD_KEY: &str = "board";
const PLAN_KEY: &str = "plan";

/// Read `key`, falling back to `T::default()` when it is missing or unreadable.
fn load_or_default<T, S>(store: &S, key: &str) -> T
where
    T: DeserializeOwned + Default,
    S: KvStore + ?Sized,
{
    match get_json(store, key) {
        Ok(Some(value)) => value,
        Ok(None) => T::default(),
        Err(e) => {
            tracing::warn!(key, error = %e, "falling back to initial value");
            T::default()
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HeroProfile {
    pub rank: Rank,
    pub wallet: Wallet,
    pub tracker: TrackerState,
    pub focus: FocusSession,
}

/// Result of completing a task on the board.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CompletedTask {
    pub completion: TaskCompletion,
    pub events: Vec<Event>,
}

impl HeroProfile {
    pub fn load<S: KvStore + ?Sized>(store: &S) -> Self {
        Self {
            rank: load_or_default(store, RANK_KEY),
            wallet: load_or_default(store, WALLET_KEY),
            tracker: load_or_default(store, TRACKER_KEY),
            focus: load_or_default(store, FOCUS_KEY),
        }
    }

    pub fn save<S: KvStore + ?Sized>(&self, store: &S) -> Result<()> {
        set_json(store, RANK_KEY, &self.rank)?;
        set_json(store, WALLET_KEY, &self.wallet)?;
        set_json(store, TRACKER_KEY, &self.tracker)?;
        set_json(store, FOCUS_KEY, &self.focus)
    }

    /// Feed `elapsed_seconds` spent on `identifier` through the tracker.
    /// No identifier counts as productive time.
    pub fn track<C: ContextClassifier + ?Sized>(
        &mut self,
        policy: &AllowancePolicy,
        classifier: &C,
        identifier: Option<&str>,
        elapsed_seconds: u64,
        sink: &mut dyn TrackerSink,
    ) -> TickReport {
        let unproductive = identifier.is_some_and(|id| classifier.is_unproductive(id));
        let tick = Tick {
            elapsed_seconds,
            unproductive,
        };
        self.tick(policy, tick, sink)
    }

    pub fn tick(&mut self, policy: &AllowancePolicy, tick: Tick, sink: &mut dyn TrackerSink) -> TickReport {
        policy.tick(&mut self.tracker, &mut self.rank, &mut self.wallet, tick, sink)
    }

    /// Credit a finished focus session: allowance and goodwill to the wallet,
    /// minutes to the task and to the user's focus total.
    ///
    /// A task that has since been removed from the board only loses the
    /// minutes; the wallet is still credited.
    pub fn credit_focus(
        &mut self,
        reward: &FocusReward,
        board: &mut Board,
        stats: &mut UserStats,
        now: DateTime<Utc>,
    ) {
        self.wallet.earn(reward.allowance, reward.goodwill);
        if reward.minutes == 0 {
            return;
        }
        if let Err(e) = board.add_time(&reward.task_id, reward.minutes) {
            tracing::warn!(task_id = %reward.task_id, error = %e, "focus time not added to task");
        }
        stats.record_focus_time(reward.minutes, now);
    }

    /// Toggle a task's completion. Finishing it awards `points` and records
    /// a cycle; reopening it changes nothing else and returns `None`.
    pub fn complete_task(
        &mut self,
        board: &mut Board,
        task_id: &str,
        points: i64,
        stats: &mut UserStats,
        now: DateTime<Utc>,
    ) -> Result<Option<CompletedTask>> {
        let Some(completion) = board.toggle_complete(task_id)? else {
            return Ok(None);
        };

        let before = self.rank;
        self.rank = add_points(&self.rank, points);
        stats.record_cycle(
            now,
            CycleData {
                estimated_minutes: completion.estimated_minutes,
                actual_minutes: completion.time_spent,
                time_saved: completion.time_saved.map_or(0, |s| s.max(0) as u64),
            },
        );

        let mut events = vec![Event::TaskCompleted {
            task_id: completion.task_id.clone(),
            points_awarded: points,
            rank: self.rank,
            at: now,
        }];
        if let Some(changed) = Event::rank_changed(&before, &self.rank) {
            tracing::info!(from = %before, to = %self.rank, "rank up");
            events.push(changed);
        }
        Ok(Some(CompletedTask { completion, events }))
    }
}

pub fn load_board<S: KvStore + ?Sized>(store: &S) -> Board {
    load_or_default(store, BOARD_KEY)
}

pub fn save_board<S: KvStore + ?Sized>(store: &S, board: &Board) -> Result<()> {
    set_json(store, BOARD_KEY, board)
}

pub fn load_plan<S: KvStore + ?Sized>(store: &S) -> Plan {
    load_or_default(store, PLAN_KEY)
}

pub fn save_plan<S: KvStore + ?Sized>(store: &S, plan: &Plan) -> Result<()> {
    set_json(store, PLAN_KEY, plan)
}

/// The local user's stats, created with a fresh id on first use.
pub fn load_user_stats<S: KvStore + ?Sized>(store: &S, now: DateTime<Utc>) -> UserStats {
    let stats: Option<UserStats> = match get_json(store, STATS_KEY) {
        Ok(stats) => stats,
        Err(e) => {
            tracing::warn!(key = STATS_KEY, error = %e, "falling back to fresh stats");
            None
        }
    };
    stats.unwrap_or_else(|| UserStats::new(new_user_id(now), now))
}

pub fn save_user_stats<S: KvStore + ?Sized>(store: &S, stats: &UserStats) -> Result<()> {
    set_json(store, STATS_KEY, stats)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::allowance::{Allowance, DomainDenylist, NoopSink};
    use crate::focus::{EarnRates, TASK_COMPLETION_POINTS};
    use crate::rank::rank_from_points;
    use crate::storage::MemoryStore;
    use chrono::TimeZone;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap()
    }

    #[test]
    fn empty_store_loads_initial_profile() {
        let store = MemoryStore::new();
        let hero = HeroProfile::load(&store);
        assert_eq!(hero, HeroProfile::default());
        assert_eq!(hero.rank, Rank::initial());
    }

    #[test]
    fn profile_survives_a_save() {
        let store = MemoryStore::new();
        let mut hero = HeroProfile::default();
        hero.rank = rank_from_points(250);
        hero.wallet.earn(Allowance::from_units(1234), 2);
        hero.tracker.start();
        hero.save(&store).unwrap();
        assert_eq!(HeroProfile::load(&store), hero);
    }

    #[test]
    fn corrupt_entries_fall_back_individually() {
        let store = MemoryStore::new();
        let mut hero = HeroProfile::default();
        hero.wallet.earn(Allowance::from_units(500), 1);
        hero.save(&store).unwrap();
        store.set(RANK_KEY, "{broken").unwrap();

        let loaded = HeroProfile::load(&store);
        assert_eq!(loaded.rank, Rank::initial());
        assert_eq!(loaded.wallet, hero.wallet);
    }

    #[test]
    fn completing_a_task_awards_points_and_a_cycle() {
        let mut hero = HeroProfile::default();
        let mut board = Board::new();
        let mut stats = UserStats::new("u", now());
        let id = board.add_task("Ship it").unwrap().id.clone();

        let done = hero
            .complete_task(&mut board, &id, TASK_COMPLETION_POINTS, &mut stats, now())
            .unwrap()
            .unwrap();
        assert_eq!(hero.rank.points, TASK_COMPLETION_POINTS);
        assert_eq!(stats.total_cycles, 1);
        assert_eq!(stats.current_streak, 1);
        assert!(matches!(done.events[0], Event::TaskCompleted { points_awarded: 10, .. }));

        // reopening awards nothing
        assert!(hero
            .complete_task(&mut board, &id, TASK_COMPLETION_POINTS, &mut stats, now())
            .unwrap()
            .is_none());
        assert_eq!(hero.rank.points, TASK_COMPLETION_POINTS);
        assert_eq!(stats.total_cycles, 1);
    }

    #[test]
    fn focus_credit_reaches_wallet_board_and_stats() {
        let mut hero = HeroProfile::default();
        let mut board = Board::new();
        let mut stats = UserStats::new("u", now());
        let id = board.add_task("Write").unwrap().id.clone();

        let reward = EarnRates::default().reward(id.clone(), 12 * 60);
        hero.credit_focus(&reward, &mut board, &mut stats, now());

        assert_eq!(hero.wallet.allowance, Allowance::from_units(1000));
        assert_eq!(hero.wallet.goodwill, 2);
        assert_eq!(board.task(&id).unwrap().time_spent, 12);
        assert_eq!(stats.total_focus_minutes, 12);
    }

    #[test]
    fn track_classifies_the_identifier() {
        let mut hero = HeroProfile::default();
        hero.tracker.start();
        let policy = AllowancePolicy::default();
        let denylist = DomainDenylist::new(["youtube.com"]);

        let report = hero.track(&policy, &denylist, Some("https://www.youtube.com/watch"), 120, &mut NoopSink);
        assert_eq!(report.decayed_minutes, 2);
        assert_eq!(hero.rank.points, -2);

        let report = hero.track(&policy, &denylist, Some("https://docs.rs"), 60, &mut NoopSink);
        assert_eq!(report.decayed_minutes, 0);
        assert_eq!(hero.tracker.seconds_on_unproductive, 0);
    }

    #[test]
    fn local_stats_get_an_id_once() {
        let store = MemoryStore::new();
        let stats = load_user_stats(&store, now());
        assert!(stats.user_id.starts_with("user_"));
        save_user_stats(&store, &stats).unwrap();
        assert_eq!(load_user_stats(&store, now()).user_id, stats.user_id);
    }

    #[test]
    fn board_and_plan_default_when_absent() {
        let store = MemoryStore::new();
        assert!(load_board(&store).tasks.is_empty());
        assert_eq!(load_plan(&store).pillars.len(), 1);

        let mut board = Board::new();
        board.add_task("x").unwrap();
        save_board(&store, &board).unwrap();
        assert_eq!(load_board(&store), board);
    }
}
