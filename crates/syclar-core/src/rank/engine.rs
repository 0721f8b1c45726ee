//! Hero rank engine.
//!
//! Maps a signed point balance to a tiered rank. The mapping is a pure
//! function of the balance, anchored at `C class Rank #500` for 0 points:
//!
//! ```text
//! points <= floor        -> F #1000 (clamped)
//! floor < points < 0     -> one rank down per 10 points below 0
//! points >= 0            -> climb while the balance clears the next threshold
//! ```
//!
//! Rank-ups are not linear. The threshold to leave a rank is
//! `100 * 2^tier * (1 + (number - 1) / 100)` points of total balance, which
//! shrinks as the number improves inside a tier and doubles with every tier.
//! Clearing the threshold at the bottom of a tier therefore tends to carry
//! the rank through the whole tier in one go.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::tier::Tier;

/// Number of ranks inside a tier; `1` is best, `RANKS_PER_CLASS` is worst.
pub const RANKS_PER_CLASS: u16 = 1000;
/// Balance lost per rank on the descending branch.
pub const POINTS_PER_RANK_STEP: i64 = 10;
/// At or below this balance the rank is pinned to the global floor.
pub const FLOOR_POINTS: i64 = -5000;
/// Rank number held at 0 points.
pub const ANCHOR_NUMBER: u16 = 500;
/// Tier held at 0 points.
pub const ANCHOR_TIER: Tier = Tier::C;
/// Base threshold of tier index 0; doubles per tier.
const BASE_THRESHOLD: i64 = 100;

/// A hero rank: tier, position inside the tier, and the points ledger.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Rank {
    pub class: Tier,
    /// Position in the tier, 1 (best) ..= 1000 (worst).
    pub number: u16,
    /// Unclamped ledger of every gain and loss.
    pub points: i64,
}

impl Rank {
    /// `C class Rank #500` with an empty ledger.
    pub fn initial() -> Self {
        Self {
            class: ANCHOR_TIER,
            number: ANCHOR_NUMBER,
            points: 0,
        }
    }

    /// `S class Rank #1`.
    pub fn is_ceiling(&self) -> bool {
        self.class == Tier::HIGHEST && self.number <= 1
    }

    /// `F class Rank #1000`.
    pub fn is_floor(&self) -> bool {
        self.class == Tier::LOWEST && self.number >= RANKS_PER_CLASS
    }

    /// Scalar prestige: 0 at the floor, 6999 at the ceiling.
    ///
    /// Orders ranks by `(tier, -number)` and ignores the ledger.
    pub fn prestige(&self) -> u32 {
        let number = self.number.clamp(1, RANKS_PER_CLASS) as u32;
        self.class.index() as u32 * RANKS_PER_CLASS as u32 + (RANKS_PER_CLASS as u32 - number)
    }

    /// Same rank with `number` forced into `1..=1000`.
    pub fn normalized(mut self) -> Self {
        self.number = self.number.clamp(1, RANKS_PER_CLASS);
        self
    }

    /// The next better rank, or `None` at the ceiling.
    fn above(&self) -> Option<(Tier, u16)> {
        if self.number > 1 {
            Some((self.class, self.number - 1))
        } else {
            self.class.next().map(|t| (t, RANKS_PER_CLASS))
        }
    }

    /// The next worse rank, or `None` at the floor.
    fn below(&self) -> Option<(Tier, u16)> {
        if self.number < RANKS_PER_CLASS {
            Some((self.class, self.number + 1))
        } else {
            self.class.prev().map(|t| (t, 1))
        }
    }

    fn step_up(&mut self) -> bool {
        match self.above() {
            Some((class, number)) => {
                self.class = class;
                self.number = number;
                true
            }
            None => false,
        }
    }

    fn step_down(&mut self) -> bool {
        match self.below() {
            Some((class, number)) => {
                self.class = class;
                self.number = number;
                true
            }
            None => false,
        }
    }
}

impl Default for Rank {
    fn default() -> Self {
        Self::initial()
    }
}

impl fmt::Display for Rank {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} class Rank #{}", self.class, self.number)
    }
}

/// Rank-up eligibility and progress from a given rank.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankUpInfo {
    pub can_rank_up: bool,
    /// Points still missing; `None` at the ceiling.
    pub points_needed: Option<i64>,
    /// The single next rank, carrying the balance needed to reach it.
    pub next_rank: Option<Rank>,
    /// `points / threshold` clamped to `0.0..=1.0`; 0 at the ceiling.
    pub progress: f64,
}

/// Shape of the points-to-rank curve.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RankCurve {
    /// At or below this balance the rank is the global floor.
    pub floor_points: i64,
    /// Points per rank on the descending branch.
    pub points_per_step: i64,
}

impl Default for RankCurve {
    fn default() -> Self {
        Self {
            floor_points: FLOOR_POINTS,
            points_per_step: POINTS_PER_RANK_STEP,
        }
    }
}

impl RankCurve {
    /// Derive the rank held at `points`.
    pub fn rank_from_points(&self, points: i64) -> Rank {
        if points <= self.floor_points {
            return Rank {
                class: Tier::LOWEST,
                number: RANKS_PER_CLASS,
                points,
            };
        }

        let mut rank = Rank {
            class: ANCHOR_TIER,
            number: ANCHOR_NUMBER,
            points,
        };

        if points >= 0 {
            while let Some(threshold) = rank_up_threshold(&rank) {
                if points < threshold || !rank.step_up() {
                    break;
                }
            }
        } else {
            let steps = points.div_euclid(self.points_per_step.max(1)).unsigned_abs();
            for _ in 0..steps {
                if !rank.step_down() {
                    break;
                }
            }
        }

        rank
    }

    /// Apply `delta` to the ledger and re-derive the rank.
    pub fn add_points(&self, rank: &Rank, delta: i64) -> Rank {
        self.rank_from_points(rank.points.saturating_add(delta))
            .normalized()
    }
}

/// Derive the rank held at `points` on the default curve.
pub fn rank_from_points(points: i64) -> Rank {
    RankCurve::default().rank_from_points(points)
}

/// Apply `delta` (positive for completed work, negative for decay).
pub fn add_points(rank: &Rank, delta: i64) -> Rank {
    RankCurve::default().add_points(rank, delta)
}

/// Total balance required to leave `rank` upwards; `None` at the ceiling.
pub fn rank_up_threshold(rank: &Rank) -> Option<i64> {
    let rank = rank.normalized();
    if rank.is_ceiling() {
        return None;
    }
    // floor(100 * 2^tier * (1 + (n - 1) / 100)) == 2^tier * (99 + n)
    let tier_base = BASE_THRESHOLD << rank.class.index();
    Some(tier_base * (99 + rank.number as i64) / 100)
}

/// Rank-up eligibility, missing points and progress towards the next rank.
pub fn rank_up_info(rank: &Rank) -> RankUpInfo {
    let rank = rank.normalized();
    let (threshold, (class, number)) = match (rank_up_threshold(&rank), rank.above()) {
        (Some(t), Some(next)) => (t, next),
        _ => {
            return RankUpInfo {
                can_rank_up: false,
                points_needed: None,
                next_rank: None,
                progress: 0.0,
            }
        }
    };

    RankUpInfo {
        can_rank_up: rank.points >= threshold,
        points_needed: Some((threshold - rank.points).max(0)),
        next_rank: Some(Rank {
            class,
            number,
            points: rank.points.max(threshold),
        }),
        progress: (rank.points as f64 / threshold as f64).clamp(0.0, 1.0),
    }
}
