//! Trophy catalogue unlocked from [`UserStats`] thresholds.

use serde::Serialize;

use super::user::UserStats;

/// Which counter a trophy looks at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TrophyMetric {
    TotalCycles,
    FocusMinutes,
    CurrentStreak,
    LongestStreak,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Trophy {
    pub id: &'static str,
    pub name: &'static str,
    pub description: &'static str,
    /// Percentage of users expected to hold it.
    pub rarity: u8,
    pub icon: &'static str,
    #[serde(skip)]
    pub metric: TrophyMetric,
    #[serde(skip)]
    pub threshold: u64,
}

impl Trophy {
    pub fn is_unlocked(&self, stats: &UserStats) -> bool {
        let value = match self.metric {
            TrophyMetric::TotalCycles => stats.total_cycles,
            TrophyMetric::FocusMinutes => stats.total_focus_minutes,
            TrophyMetric::CurrentStreak => u64::from(stats.current_streak),
            TrophyMetric::LongestStreak => u64::from(stats.longest_streak),
        };
        value >= self.threshold
    }

    pub fn rarity_label(&self) -> &'static str {
        rarity_label(self.rarity)
    }
}

const fn trophy(
    id: &'static str,
    name: &'static str,
    description: &'static str,
    rarity: u8,
    icon: &'static str,
    metric: TrophyMetric,
    threshold: u64,
) -> Trophy {
    Trophy {
        id,
        name,
        description,
        rarity,
        icon,
        metric,
        threshold,
    }
}

use TrophyMetric::*;

pub const ALL_TROPHIES: [Trophy; 15] = [
    trophy("first_cycle", "First Cycle", "Completed your first cycle", 100, "🎯", TotalCycles, 1),
    trophy("cyclist_10", "Cyclist", "Completed 10 cycles", 75, "🚴", TotalCycles, 10),
    trophy("cyclist_50", "Master Cyclist", "Completed 50 cycles", 50, "🚴‍♂️", TotalCycles, 50),
    trophy("cyclist_100", "Elite Cyclist", "Completed 100 cycles", 25, "🚴‍♀️", TotalCycles, 100),
    trophy("cyclist_500", "Legendary Cyclist", "Completed 500 cycles", 5, "🏆", TotalCycles, 500),
    trophy("focus_1h", "Focused Hour", "Accumulated 1 hour of focus time", 80, "⏰", FocusMinutes, 60),
    trophy("focus_10h", "Deep Focus", "Accumulated 10 hours of focus time", 60, "🧠", FocusMinutes, 600),
    trophy("focus_50h", "Focus Master", "Accumulated 50 hours of focus time", 30, "💎", FocusMinutes, 3000),
    trophy("focus_100h", "Focus Legend", "Accumulated 100 hours of focus time", 10, "👑", FocusMinutes, 6000),
    trophy("streak_3", "Getting Started", "3-day streak", 70, "🔥", CurrentStreak, 3),
    trophy("streak_7", "Week Warrior", "7-day streak", 40, "🔥🔥", CurrentStreak, 7),
    trophy("streak_30", "Month Master", "30-day streak", 5, "🔥🔥🔥", CurrentStreak, 30),
    trophy("streak_100", "Centurion", "100-day streak", 1, "💯", CurrentStreak, 100),
    // Approximated by lifetime cycles until per-day counts are kept.
    trophy("velocity_10", "Velocity", "Completed 10 cycles in a single day", 20, "⚡", TotalCycles, 10),
    trophy("consistency_week", "Consistent", "Completed cycles 7 days in a row", 35, "📈", LongestStreak, 7),
];

pub fn unlocked_trophies(stats: &UserStats) -> Vec<Trophy> {
    ALL_TROPHIES
        .iter()
        .filter(|t| t.is_unlocked(stats))
        .copied()
        .collect()
}

pub fn trophy_by_id(id: &str) -> Option<&'static Trophy> {
    ALL_TROPHIES.iter().find(|t| t.id == id)
}

pub fn rarity_label(rarity: u8) -> &'static str {
    match rarity {
        50.. => "Common",
        25..=49 => "Uncommon",
        10..=24 => "Rare",
        5..=9 => "Epic",
        1..=4 => "Legendary",
        0 => "Mythic",
    }
}
