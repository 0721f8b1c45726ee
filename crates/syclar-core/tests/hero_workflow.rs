//! End-to-end hero workflow against an on-disk store.
//!
//! Plan a pillar, turn a milestone into a task, focus on it, finish it, then
//! lose some of the gain to unproductive browsing. Every step goes through
//! the SQLite store and is reloaded, the way the CLI drives it.

use chrono::{TimeZone, Utc};

use syclar_core::allowance::{Allowance, NoopSink};
use syclar_core::focus::TASK_COMPLETION_POINTS;
use syclar_core::integrations::{MockProvider, SuggestionProvider};
use syclar_core::profile::{self, HeroProfile};
use syclar_core::stats::StatsStore;
use syclar_core::{Config, Database};

#[tokio::test]
async fn plan_focus_complete_and_decay() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("syclar.db");
    let config = Config::default();
    let now = Utc.with_ymd_and_hms(2024, 6, 3, 9, 0, 0).unwrap();

    // Strategy: generate milestones for the first pillar
    {
        let db = Database::open_at(&path).unwrap();
        let mut plan = profile::load_plan(&db);
        let milestones = MockProvider
            .generate_milestones("Career", "Senior engineer")
            .await
            .unwrap();
        assert_eq!(plan.add_milestones("1", &milestones, now).unwrap(), 4);
        profile::save_plan(&db, &plan).unwrap();
    }

    // Tactical: the first pending stone becomes a broken-down task
    let task_id = {
        let db = Database::open_at(&path).unwrap();
        let plan = profile::load_plan(&db);
        assert_eq!(plan.pillar("1").unwrap().estimated_weeks, Some(8));

        let stone = plan.pending_stones()[0].name.clone();
        let mut board = profile::load_board(&db);
        let task_id = board.add_task_from_stone(&stone).unwrap();
        let subtasks = MockProvider.breakdown_task(&stone, None).await.unwrap();
        assert_eq!(board.add_suggestions(&task_id, &subtasks).unwrap(), 4);
        profile::save_board(&db, &board).unwrap();
        task_id
    };

    // Focus for 25 minutes and stop
    {
        let db = Database::open_at(&path).unwrap();
        let mut hero = HeroProfile::load(&db);
        let mut board = profile::load_board(&db);
        let mut stats = profile::load_user_stats(&db, now);
        let rates = config.earn_rates();

        let start_ms = now.timestamp_millis() as u64;
        hero.focus.start_at(&task_id, start_ms, &rates);
        let reward = hero.focus.stop_at(start_ms + 25 * 60 * 1000, &rates).unwrap();
        assert_eq!(reward.blocks, 5);
        hero.credit_focus(&reward, &mut board, &mut stats, now);

        hero.save(&db).unwrap();
        profile::save_board(&db, &board).unwrap();
        profile::save_user_stats(&db, &stats).unwrap();
    }

    // Finish the task
    {
        let db = Database::open_at(&path).unwrap();
        let mut hero = HeroProfile::load(&db);
        assert_eq!(hero.wallet.allowance, Allowance::from_units(2500));
        assert_eq!(hero.wallet.goodwill, 5);

        let mut board = profile::load_board(&db);
        assert_eq!(board.task(&task_id).unwrap().time_spent, 25);
        let mut stats = profile::load_user_stats(&db, now);

        let done = hero
            .complete_task(&mut board, &task_id, TASK_COMPLETION_POINTS, &mut stats, now)
            .unwrap()
            .unwrap();
        // 330 estimated minutes, 25 spent
        assert_eq!(done.completion.time_saved, Some(305));
        assert_eq!(stats.total_time_saved, 305);

        StatsStore::new(&db).store(&stats).unwrap();
        hero.save(&db).unwrap();
        profile::save_board(&db, &board).unwrap();
        profile::save_user_stats(&db, &stats).unwrap();
    }

    // Browse for 30 minutes: 25 are covered by allowance, 5 decay
    {
        let db = Database::open_at(&path).unwrap();
        let mut hero = HeroProfile::load(&db);
        assert_eq!(hero.rank.points, TASK_COMPLETION_POINTS);
        hero.tracker.start();

        let report = hero.track(
            &config.allowance_policy(),
            &config.classifier(),
            Some("https://www.reddit.com/r/rust"),
            30 * 60,
            &mut NoopSink,
        );
        assert_eq!(report.protected_minutes, 25);
        assert_eq!(report.decayed_minutes, 5);
        assert_eq!(hero.rank.points, TASK_COMPLETION_POINTS - 5);
        assert!(hero.wallet.allowance.is_zero());
        hero.save(&db).unwrap();
    }

    let db = Database::open_at(&path).unwrap();
    let stats = profile::load_user_stats(&db, now);
    let published = StatsStore::new(&db).load(&stats.user_id).unwrap().unwrap();
    assert_eq!(published.total_cycles, 1);
    assert_eq!(published.total_focus_minutes, 25);
    assert_eq!(HeroProfile::load(&db).rank.points, 5);
}
