//! Property tests for the rank engine and the allowance policy.

use proptest::prelude::*;

use syclar_core::allowance::{Allowance, AllowancePolicy, NoopSink, Tick, TrackerState, Wallet};
use syclar_core::rank::{add_points, rank_from_points, Rank, FLOOR_POINTS, RANKS_PER_CLASS};

fn arb_points() -> impl Strategy<Value = i64> {
    prop_oneof![
        (FLOOR_POINTS - 1000)..20_000i64,
        20_000..2_000_000i64,
    ]
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(256))]

    #[test]
    fn more_points_never_rank_lower(a in arb_points(), b in arb_points()) {
        let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
        prop_assert!(rank_from_points(lo).prestige() <= rank_from_points(hi).prestige());
    }

    #[test]
    fn rank_number_stays_in_range(p in arb_points()) {
        let rank = rank_from_points(p);
        prop_assert!((1..=RANKS_PER_CLASS).contains(&rank.number));
        prop_assert_eq!(rank.points, p);
    }

    #[test]
    fn add_points_matches_a_fresh_derivation(p in arb_points(), delta in -5_000i64..5_000) {
        let rank = rank_from_points(p);
        prop_assert_eq!(add_points(&rank, delta), rank_from_points(p + delta));
    }

    #[test]
    fn everything_below_the_floor_is_the_floor(p in (FLOOR_POINTS - 100_000)..=FLOOR_POINTS) {
        prop_assert!(rank_from_points(p).is_floor());
    }

    #[test]
    fn unproductive_minutes_are_either_protected_or_decayed(
        seconds in 0u64..3_600,
        balance in 0u64..5_000,
    ) {
        let policy = AllowancePolicy::default();
        let mut state = TrackerState::default();
        state.start();
        let mut rank = Rank::initial();
        let mut wallet = Wallet { allowance: Allowance::from_units(balance), goodwill: 0 };

        let report = policy.tick(&mut state, &mut rank, &mut wallet, Tick::unproductive(seconds), &mut NoopSink);

        prop_assert_eq!(report.protected_minutes + report.decayed_minutes, seconds / 60);
        prop_assert_eq!(
            wallet.allowance.units() + report.allowance_spent.units(),
            balance
        );
        prop_assert_eq!(rank.points, -(report.decayed_minutes as i64));
        // protection always comes first
        if report.decayed_minutes > 0 {
            prop_assert!(!policy.would_protect(&wallet));
        }
    }
}
