//! Strategy planner: up to three pillars, each broken into stones (milestones)
//! scheduled week by week.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::board::new_id;
use crate::error::{CoreError, Result, ValidationError};
use crate::integrations::{MilestoneSuggestion, DEFAULT_MILESTONE_WEEKS};

pub const MAX_PILLARS: usize = 3;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Pillar {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub win_definition: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub estimated_weeks: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub estimated_completion: Option<DateTime<Utc>>,
}

impl Pillar {
    fn empty(id: String) -> Self {
        Self {
            id,
            name: String::new(),
            win_definition: String::new(),
            estimated_weeks: None,
            estimated_completion: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Stone {
    pub id: String,
    pub pillar_id: String,
    pub name: String,
    #[serde(default)]
    pub completed: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub estimated_weeks: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scheduled_week: Option<u32>,
    #[serde(default)]
    pub in_progress: bool,
}

impl Stone {
    fn weeks(&self) -> u32 {
        self.estimated_weeks.unwrap_or(DEFAULT_MILESTONE_WEEKS)
    }
}

/// Partial update for [`Plan::update_pillar`]; `None` leaves a field alone.
#[derive(Debug, Clone, Default)]
pub struct PillarUpdate {
    pub name: Option<String>,
    pub win_definition: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Plan {
    pub pillars: Vec<Pillar>,
    #[serde(default)]
    pub stones: Vec<Stone>,
}

impl Default for Plan {
    fn default() -> Self {
        Self {
            pillars: vec![Pillar::empty("1".to_string())],
            stones: Vec::new(),
        }
    }
}

fn not_found(kind: &str, id: &str) -> CoreError {
    ValidationError::NotFound {
        kind: kind.to_string(),
        id: id.to_string(),
    }
    .into()
}

impl Plan {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn pillar(&self, id: &str) -> Option<&Pillar> {
        self.pillars.iter().find(|p| p.id == id)
    }

    pub fn stone(&self, id: &str) -> Option<&Stone> {
        self.stones.iter().find(|s| s.id == id)
    }

    pub fn stones_for<'a>(&'a self, pillar_id: &'a str) -> impl Iterator<Item = &'a Stone> + 'a {
        self.stones.iter().filter(move |s| s.pillar_id == pillar_id)
    }

    fn pillar_mut(&mut self, id: &str) -> Result<&mut Pillar> {
        self.pillars
            .iter_mut()
            .find(|p| p.id == id)
            .ok_or_else(|| not_found("pillar", id))
    }

    fn stone_mut(&mut self, id: &str) -> Result<&mut Stone> {
        self.stones
            .iter_mut()
            .find(|s| s.id == id)
            .ok_or_else(|| not_found("stone", id))
    }

    /// Add an empty pillar.
    ///
    /// # Errors
    /// Fails once [`MAX_PILLARS`] exist.
    pub fn add_pillar(&mut self) -> Result<&Pillar> {
        if self.pillars.len() >= MAX_PILLARS {
            return Err(CoreError::invalid(
                "pillars",
                format!("at most {MAX_PILLARS} pillars allowed"),
            ));
        }
        let next = self
            .pillars
            .iter()
            .filter_map(|p| p.id.parse::<u32>().ok())
            .max()
            .unwrap_or(0)
            + 1;
        self.pillars.push(Pillar::empty(next.to_string()));
        Ok(&self.pillars[self.pillars.len() - 1])
    }

    /// Remove a pillar together with its stones. The last pillar stays.
    pub fn remove_pillar(&mut self, id: &str) -> Result<Pillar> {
        let pos = self
            .pillars
            .iter()
            .position(|p| p.id == id)
            .ok_or_else(|| not_found("pillar", id))?;
        if self.pillars.len() <= 1 {
            return Err(CoreError::invalid("pillars", "at least one pillar is required"));
        }
        self.stones.retain(|s| s.pillar_id != id);
        Ok(self.pillars.remove(pos))
    }

    pub fn update_pillar(&mut self, id: &str, update: PillarUpdate) -> Result<&Pillar> {
        let pillar = self.pillar_mut(id)?;
        if let Some(name) = update.name {
            pillar.name = name.trim().to_string();
        }
        if let Some(win) = update.win_definition {
            pillar.win_definition = win.trim().to_string();
        }
        Ok(pillar)
    }

    pub fn add_stone(&mut self, pillar_id: &str, name: &str) -> Result<&Stone> {
        let name = name.trim();
        if name.is_empty() {
            return Err(ValidationError::Required("stone name".to_string()).into());
        }
        if self.pillar(pillar_id).is_none() {
            return Err(not_found("pillar", pillar_id));
        }
        self.stones.push(Stone {
            id: new_id(),
            pillar_id: pillar_id.to_string(),
            name: name.to_string(),
            completed: false,
            estimated_weeks: None,
            scheduled_week: None,
            in_progress: false,
        });
        Ok(&self.stones[self.stones.len() - 1])
    }

    pub fn remove_stone(&mut self, id: &str) -> Result<Stone> {
        let pos = self
            .stones
            .iter()
            .position(|s| s.id == id)
            .ok_or_else(|| not_found("stone", id))?;
        Ok(self.stones.remove(pos))
    }

    /// Append suggested milestones to a pillar, scheduled back to back after
    /// whatever the pillar already has scheduled, then refresh its timeline.
    /// Returns how many stones were added.
    pub fn add_milestones(
        &mut self,
        pillar_id: &str,
        milestones: &[MilestoneSuggestion],
        now: DateTime<Utc>,
    ) -> Result<usize> {
        if self.pillar(pillar_id).is_none() {
            return Err(not_found("pillar", pillar_id));
        }
        let mut week = self
            .stones_for(pillar_id)
            .filter_map(|s| s.scheduled_week.map(|w| w + s.weeks()))
            .max()
            .unwrap_or(1);

        let before = self.stones.len();
        for m in milestones.iter().filter(|m| !m.name.trim().is_empty()) {
            let weeks = if m.estimated_weeks == 0 {
                DEFAULT_MILESTONE_WEEKS
            } else {
                m.estimated_weeks
            };
            self.stones.push(Stone {
                id: new_id(),
                pillar_id: pillar_id.to_string(),
                name: m.name.trim().to_string(),
                completed: false,
                estimated_weeks: Some(weeks),
                scheduled_week: Some(week),
                in_progress: false,
            });
            week += weeks;
        }
        let added = self.stones.len() - before;
        if added > 0 {
            self.recalculate_timeline(now);
        }
        Ok(added)
    }

    /// Refresh each estimated pillar from its incomplete stones.
    ///
    /// Pillars without any estimated stone are left untouched, as are pillars
    /// whose stones are all complete.
    pub fn recalculate_timeline(&mut self, now: DateTime<Utc>) {
        for pillar in &mut self.pillars {
            let stones: Vec<&Stone> = self
                .stones
                .iter()
                .filter(|s| s.pillar_id == pillar.id)
                .collect();
            if !stones.iter().any(|s| s.estimated_weeks.is_some()) {
                continue;
            }
            let remaining: u32 = stones.iter().filter(|s| !s.completed).map(|s| s.weeks()).sum();
            if remaining > 0 {
                pillar.estimated_weeks = Some(remaining);
                pillar.estimated_completion = Some(now + Duration::days(i64::from(remaining) * 7));
            }
        }
    }

    /// Mark a stone as the one being worked on.
    ///
    /// # Errors
    /// Rejects completed stones and any start while another stone is in
    /// progress.
    pub fn start_stone(&mut self, id: &str) -> Result<&Stone> {
        if let Some(busy) = self.stones.iter().find(|s| s.in_progress && s.id != id) {
            return Err(CoreError::Conflict(format!(
                "stone '{}' is already in progress",
                busy.name
            )));
        }
        let stone = self.stone_mut(id)?;
        if stone.completed {
            return Err(CoreError::invalid("stone", "stone is already completed"));
        }
        stone.in_progress = true;
        Ok(stone)
    }

    pub fn complete_stone(&mut self, id: &str, now: DateTime<Utc>) -> Result<&Stone> {
        let stone = self.stone_mut(id)?;
        stone.completed = true;
        stone.in_progress = false;
        self.recalculate_timeline(now);
        self.stone(id).ok_or_else(|| not_found("stone", id))
    }

    /// Stones still to do, in plan order; these feed the board.
    pub fn pending_stones(&self) -> Vec<&Stone> {
        self.stones.iter().filter(|s| !s.completed).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap()
    }

    fn suggestion(name: &str, weeks: u32) -> MilestoneSuggestion {
        MilestoneSuggestion {
            name: name.to_string(),
            estimated_weeks: weeks,
        }
    }

    #[test]
    fn starts_with_one_empty_pillar() {
        let plan = Plan::new();
        assert_eq!(plan.pillars.len(), 1);
        assert_eq!(plan.pillars[0].id, "1");
        assert!(plan.pillars[0].name.is_empty());
    }

    #[test]
    fn pillar_count_is_bounded() {
        let mut plan = Plan::new();
        assert_eq!(plan.add_pillar().unwrap().id, "2");
        assert_eq!(plan.add_pillar().unwrap().id, "3");
        assert!(plan.add_pillar().is_err());

        plan.remove_pillar("2").unwrap();
        assert_eq!(plan.add_pillar().unwrap().id, "4");

        plan.remove_pillar("3").unwrap();
        plan.remove_pillar("4").unwrap();
        assert!(plan.remove_pillar("1").is_err());
    }

    #[test]
    fn removing_a_pillar_drops_its_stones() {
        let mut plan = Plan::new();
        let second = plan.add_pillar().unwrap().id.clone();
        plan.add_stone("1", "keep").unwrap();
        plan.add_stone(&second, "drop").unwrap();
        plan.remove_pillar(&second).unwrap();
        let names: Vec<&str> = plan.stones.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, vec!["keep"]);
    }

    #[test]
    fn update_pillar_trims_and_keeps_untouched_fields() {
        let mut plan = Plan::new();
        plan.update_pillar(
            "1",
            PillarUpdate {
                name: Some(" Health ".into()),
                win_definition: Some("Run a marathon".into()),
            },
        )
        .unwrap();
        let p = plan
            .update_pillar(
                "1",
                PillarUpdate {
                    name: None,
                    win_definition: Some("Run two".into()),
                },
            )
            .unwrap();
        assert_eq!(p.name, "Health");
        assert_eq!(p.win_definition, "Run two");
        assert!(plan.update_pillar("9", PillarUpdate::default()).is_err());
    }

    #[test]
    fn milestones_are_scheduled_back_to_back() {
        let mut plan = Plan::new();
        let added = plan
            .add_milestones(
                "1",
                &[suggestion("a", 2), suggestion("b", 3), suggestion("c", 0)],
                now(),
            )
            .unwrap();
        assert_eq!(added, 3);
        let weeks: Vec<Option<u32>> = plan.stones.iter().map(|s| s.scheduled_week).collect();
        assert_eq!(weeks, vec![Some(1), Some(3), Some(6)]);

        let pillar = plan.pillar("1").unwrap();
        assert_eq!(pillar.estimated_weeks, Some(7));
        assert_eq!(pillar.estimated_completion, Some(now() + Duration::days(49)));

        plan.add_milestones("1", &[suggestion("d", 1)], now()).unwrap();
        assert_eq!(plan.stones[3].scheduled_week, Some(8));
    }

    #[test]
    fn completing_stones_shrinks_the_timeline() {
        let mut plan = Plan::new();
        plan.add_milestones("1", &[suggestion("a", 2), suggestion("b", 3)], now())
            .unwrap();
        let first = plan.stones[0].id.clone();
        plan.complete_stone(&first, now()).unwrap();
        assert_eq!(plan.pillar("1").unwrap().estimated_weeks, Some(3));
        assert_eq!(plan.pending_stones().len(), 1);
    }

    #[test]
    fn manual_stones_do_not_create_a_timeline() {
        let mut plan = Plan::new();
        plan.add_stone("1", "by hand").unwrap();
        plan.recalculate_timeline(now());
        assert_eq!(plan.pillar("1").unwrap().estimated_weeks, None);
    }

    #[test]
    fn only_one_stone_in_progress() {
        let mut plan = Plan::new();
        let a = plan.add_stone("1", "a").unwrap().id.clone();
        let b = plan.add_stone("1", "b").unwrap().id.clone();

        assert!(plan.start_stone(&a).unwrap().in_progress);
        // restarting the same stone is fine
        assert!(plan.start_stone(&a).is_ok());
        assert!(matches!(plan.start_stone(&b), Err(CoreError::Conflict(_))));

        let done = plan.complete_stone(&a, now()).unwrap();
        assert!(done.completed && !done.in_progress);
        assert!(plan.start_stone(&a).is_err());
        assert!(plan.start_stone(&b).is_ok());
    }

    #[test]
    fn add_stone_validates_input() {
        let mut plan = Plan::new();
        assert!(plan.add_stone("1", "  ").is_err());
        assert!(plan.add_stone("7", "x").is_err());
        assert!(plan.remove_stone("missing").is_err());
    }
}
