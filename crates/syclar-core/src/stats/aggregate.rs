//! Cross-user aggregates and how one user compares against them.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::user::UserStats;
use crate::error::{CoreError, Result};
use crate::storage::KvStore;

const STATS_KEY_PREFIX: &str = "user_stats";
const USERS_KEY: &str = "stats_users";
const AGGREGATED_KEY: &str = "aggregated_stats";

/// Default lifetime of the cached aggregate, in seconds.
pub const AGGREGATE_CACHE_SECS: u64 = 300;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AggregatedStats {
    pub total_users: u64,
    pub avg_cycles: f64,
    pub avg_focus_minutes: f64,
    pub median_cycles: u64,
    pub median_focus_minutes: u64,
    pub p75_cycles: u64,
    pub p90_cycles: u64,
    pub p75_focus_minutes: u64,
    pub p90_focus_minutes: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserComparison {
    pub cycles_above_avg: u64,
    pub cycles_above_median: u64,
    /// Percent above the average; negative when below.
    pub focus_above_avg: f64,
    pub focus_above_median: f64,
    /// Coarse bucket: 90, 75, 50 or 25.
    pub percentile_rank: u8,
}

impl Default for UserComparison {
    fn default() -> Self {
        Self {
            cycles_above_avg: 0,
            cycles_above_median: 0,
            focus_above_avg: 0.0,
            focus_above_median: 0.0,
            percentile_rank: 50,
        }
    }
}

/// Nearest-rank percentile over an ascending slice; 0 when empty.
pub fn percentile(sorted: &[u64], p: u32) -> u64 {
    if sorted.is_empty() {
        return 0;
    }
    let rank = (f64::from(p) / 100.0 * sorted.len() as f64).ceil() as usize;
    sorted[rank.saturating_sub(1).min(sorted.len() - 1)]
}

fn round1(v: f64) -> f64 {
    (v * 10.0).round() / 10.0
}

fn percent_above(value: u64, reference: f64) -> f64 {
    if reference > 0.0 {
        round1((value as f64 - reference) / reference * 100.0)
    } else {
        0.0
    }
}

/// Compare one user's totals against the aggregate.
pub fn compare(user: &UserStats, agg: &AggregatedStats) -> UserComparison {
    let cycles = user.total_cycles;
    let percentile_rank = if agg.p90_cycles == 0 {
        50
    } else if cycles >= agg.p90_cycles {
        90
    } else if cycles >= agg.p75_cycles {
        75
    } else if cycles >= agg.median_cycles {
        50
    } else {
        25
    };

    UserComparison {
        cycles_above_avg: (cycles as f64 - agg.avg_cycles).max(0.0).round() as u64,
        cycles_above_median: cycles.saturating_sub(agg.median_cycles),
        focus_above_avg: percent_above(user.total_focus_minutes, agg.avg_focus_minutes),
        focus_above_median: percent_above(user.total_focus_minutes, agg.median_focus_minutes as f64),
        percentile_rank,
    }
}

/// Build the aggregate from a set of users.
pub fn aggregate(all: &[UserStats]) -> AggregatedStats {
    if all.is_empty() {
        return AggregatedStats::default();
    }
    let n = all.len() as f64;
    let mut cycles: Vec<u64> = all.iter().map(|s| s.total_cycles).collect();
    let mut focus: Vec<u64> = all.iter().map(|s| s.total_focus_minutes).collect();
    cycles.sort_unstable();
    focus.sort_unstable();

    AggregatedStats {
        total_users: all.len() as u64,
        avg_cycles: cycles.iter().sum::<u64>() as f64 / n,
        avg_focus_minutes: focus.iter().sum::<u64>() as f64 / n,
        median_cycles: percentile(&cycles, 50),
        median_focus_minutes: percentile(&focus, 50),
        p75_cycles: percentile(&cycles, 75),
        p90_cycles: percentile(&cycles, 90),
        p75_focus_minutes: percentile(&focus, 75),
        p90_focus_minutes: percentile(&focus, 90),
    }
}

/// Shared stats kept in a [`KvStore`].
pub struct StatsStore<'a, S: KvStore + ?Sized> {
    store: &'a S,
    cache_secs: u64,
}

impl<'a, S: KvStore + ?Sized> StatsStore<'a, S> {
    pub fn new(store: &'a S) -> Self {
        Self {
            store,
            cache_secs: AGGREGATE_CACHE_SECS,
        }
    }

    pub fn with_cache_secs(mut self, secs: u64) -> Self {
        self.cache_secs = secs;
        self
    }

    fn key(user_id: &str) -> String {
        format!("{STATS_KEY_PREFIX}:{user_id}")
    }

    /// Publish a user's stats and drop the cached aggregate.
    pub fn store(&self, stats: &UserStats) -> Result<()> {
        if stats.user_id.trim().is_empty() {
            return Err(CoreError::invalid("userId", "Invalid stats data"));
        }
        let fields: BTreeMap<String, String> = [
            ("totalCycles", stats.total_cycles.to_string()),
            ("totalFocusMinutes", stats.total_focus_minutes.to_string()),
            ("totalTasksCompleted", stats.total_tasks_completed.to_string()),
            ("currentStreak", stats.current_streak.to_string()),
            ("longestStreak", stats.longest_streak.to_string()),
            ("lastActivityDate", stats.last_activity_date.to_rfc3339()),
            ("createdAt", stats.created_at.to_rfc3339()),
            ("totalEstimatedMinutes", stats.total_estimated_minutes.to_string()),
            ("totalActualMinutes", stats.total_actual_minutes.to_string()),
            ("totalTimeSaved", stats.total_time_saved.to_string()),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v))
        .collect();

        self.store.hset(&Self::key(&stats.user_id), &fields)?;
        self.store.sadd(USERS_KEY, &stats.user_id)?;
        if let Err(e) = self.store.del(AGGREGATED_KEY) {
            tracing::debug!(error = %e, "could not invalidate aggregate cache");
        }
        Ok(())
    }

    /// Read a user's published stats. Unparsable fields read as zero.
    pub fn load(&self, user_id: &str) -> Result<Option<UserStats>> {
        let data = self.store.hgetall(&Self::key(user_id))?;
        if data.is_empty() {
            return Ok(None);
        }
        let num = |field: &str| -> u64 {
            data.get(field)
                .and_then(|v| v.parse::<f64>().ok())
                .filter(|v| v.is_finite() && *v >= 0.0)
                .map_or(0, |v| v as u64)
        };
        let date = |field: &str| -> DateTime<Utc> {
            data.get(field)
                .and_then(|v| DateTime::parse_from_rfc3339(v).ok())
                .map_or_else(Utc::now, |d| d.with_timezone(&Utc))
        };
        Ok(Some(UserStats {
            user_id: user_id.to_string(),
            total_cycles: num("totalCycles"),
            total_focus_minutes: num("totalFocusMinutes"),
            total_tasks_completed: num("totalTasksCompleted"),
            current_streak: u32::try_from(num("currentStreak")).unwrap_or(u32::MAX),
            longest_streak: u32::try_from(num("longestStreak")).unwrap_or(u32::MAX),
            last_activity_date: date("lastActivityDate"),
            created_at: date("createdAt"),
            total_estimated_minutes: num("totalEstimatedMinutes"),
            total_actual_minutes: num("totalActualMinutes"),
            total_time_saved: num("totalTimeSaved"),
        }))
    }

    /// Aggregate over every published user.
    pub fn aggregate(&self) -> Result<AggregatedStats> {
        let mut all = Vec::new();
        for user_id in self.store.smembers(USERS_KEY)? {
            if let Some(stats) = self.load(&user_id)? {
                all.push(stats);
            }
        }
        Ok(aggregate(&all))
    }

    /// Aggregate, served from a short-lived cache.
    ///
    /// Never fails: store errors degrade to the zeroed aggregate.
    pub fn cached_aggregate(&self) -> AggregatedStats {
        match self.store.get(AGGREGATED_KEY) {
            Ok(Some(raw)) => match serde_json::from_str(&raw) {
                Ok(cached) => return cached,
                Err(e) => tracing::warn!(error = %e, "discarding unreadable aggregate cache"),
            },
            Ok(None) => {}
            Err(e) => {
                tracing::warn!(error = %e, "aggregate cache unavailable");
                return AggregatedStats::default();
            }
        }

        let stats = match self.aggregate() {
            Ok(stats) => stats,
            Err(e) => {
                tracing::warn!(error = %e, "failed to compute aggregate stats");
                return AggregatedStats::default();
            }
        };
        match serde_json::to_string(&stats) {
            Ok(json) => {
                if let Err(e) = self.store.set_ex(AGGREGATED_KEY, self.cache_secs, &json) {
                    tracing::debug!(error = %e, "could not cache aggregate stats");
                }
            }
            Err(e) => tracing::debug!(error = %e, "could not encode aggregate stats"),
        }
        stats
    }
}
