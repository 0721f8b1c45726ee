//! Tactical board: tasks broken into subtasks, with time spent and saved.

use serde::{Deserialize, Serialize};

use crate::error::{CoreError, Result, ValidationError};
use crate::integrations::SubtaskSuggestion;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SubtaskSource {
    Ai,
    #[default]
    User,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Subtask {
    pub id: String,
    pub label: String,
    #[serde(default)]
    pub done: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub estimated_minutes: Option<u32>,
    #[serde(default)]
    pub source: SubtaskSource,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub id: String,
    pub label: String,
    #[serde(default)]
    pub subtasks: Vec<Subtask>,
    #[serde(default)]
    pub completed: bool,
    /// Focused minutes.
    #[serde(default)]
    pub time_spent: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub estimated_minutes: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub success_criteria: Option<String>,
    /// Minutes finished ahead of the subtask estimates.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time_saved: Option<u64>,
}

impl Task {
    /// Sum of subtask estimates.
    pub fn subtask_estimate(&self) -> u64 {
        self.subtasks
            .iter()
            .filter_map(|s| s.estimated_minutes)
            .map(u64::from)
            .sum()
    }
}

/// Emitted when a task goes from open to done.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskCompletion {
    pub task_id: String,
    pub label: String,
    pub estimated_minutes: u64,
    pub time_spent: u64,
    /// Positive when ahead of the estimate, negative when over it.
    /// `None` when either side is unknown.
    pub time_saved: Option<i64>,
}

/// "45m", "1h", "1h 30m".
pub fn format_minutes(minutes: u64) -> String {
    let (h, m) = (minutes / 60, minutes % 60);
    match (h, m) {
        (0, m) => format!("{m}m"),
        (h, 0) => format!("{h}h"),
        (h, m) => format!("{h}h {m}m"),
    }
}

pub(crate) fn new_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

fn non_empty(field: &str, value: &str) -> Result<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ValidationError::Required(field.to_string()).into());
    }
    Ok(trimmed.to_string())
}

fn not_found(kind: &str, id: &str) -> CoreError {
    ValidationError::NotFound {
        kind: kind.to_string(),
        id: id.to_string(),
    }
    .into()
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Board {
    #[serde(default)]
    pub tasks: Vec<Task>,
}

impl Board {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn task(&self, id: &str) -> Option<&Task> {
        self.tasks.iter().find(|t| t.id == id)
    }

    fn task_mut(&mut self, id: &str) -> Result<&mut Task> {
        self.tasks
            .iter_mut()
            .find(|t| t.id == id)
            .ok_or_else(|| not_found("task", id))
    }

    pub fn add_task(&mut self, label: &str) -> Result<&Task> {
        let label = non_empty("task label", label)?;
        self.tasks.push(Task {
            id: new_id(),
            label,
            subtasks: Vec::new(),
            completed: false,
            time_spent: 0,
            estimated_minutes: None,
            success_criteria: None,
            time_saved: None,
        });
        Ok(&self.tasks[self.tasks.len() - 1])
    }

    /// Add a task for a milestone unless one with the same label exists.
    /// Returns the task id either way.
    pub fn add_task_from_stone(&mut self, name: &str) -> Result<String> {
        let label = non_empty("stone name", name)?;
        if let Some(existing) = self.tasks.iter().find(|t| t.label == label) {
            return Ok(existing.id.clone());
        }
        Ok(self.add_task(&label)?.id.clone())
    }

    pub fn remove_task(&mut self, id: &str) -> Result<Task> {
        let pos = self
            .tasks
            .iter()
            .position(|t| t.id == id)
            .ok_or_else(|| not_found("task", id))?;
        Ok(self.tasks.remove(pos))
    }

    pub fn add_subtask(
        &mut self,
        task_id: &str,
        label: &str,
        estimated_minutes: Option<u32>,
    ) -> Result<&Subtask> {
        let label = non_empty("subtask label", label)?;
        let task = self.task_mut(task_id)?;
        task.subtasks.push(Subtask {
            id: new_id(),
            label,
            done: false,
            estimated_minutes,
            source: SubtaskSource::User,
            note: None,
        });
        Ok(&task.subtasks[task.subtasks.len() - 1])
    }

    /// Append AI suggestions as subtasks. Returns how many were added.
    pub fn add_suggestions(&mut self, task_id: &str, suggestions: &[SubtaskSuggestion]) -> Result<usize> {
        let task = self.task_mut(task_id)?;
        let before = task.subtasks.len();
        task.subtasks.extend(
            suggestions
                .iter()
                .filter(|s| !s.label.trim().is_empty())
                .map(|s| Subtask {
                    id: new_id(),
                    label: s.label.trim().to_string(),
                    done: false,
                    estimated_minutes: Some(s.estimated_minutes),
                    source: SubtaskSource::Ai,
                    note: None,
                }),
        );
        Ok(task.subtasks.len() - before)
    }

    /// Flip a subtask's done flag. Returns the new value.
    pub fn toggle_subtask(&mut self, task_id: &str, subtask_id: &str) -> Result<bool> {
        let task = self.task_mut(task_id)?;
        let subtask = task
            .subtasks
            .iter_mut()
            .find(|s| s.id == subtask_id)
            .ok_or_else(|| not_found("subtask", subtask_id))?;
        subtask.done = !subtask.done;
        Ok(subtask.done)
    }

    pub fn add_time(&mut self, task_id: &str, minutes: u64) -> Result<()> {
        let task = self.task_mut(task_id)?;
        task.time_spent += minutes;
        Ok(())
    }

    /// Flip a task's completed flag.
    ///
    /// Only the open -> done transition yields a [`TaskCompletion`].
    pub fn toggle_complete(&mut self, task_id: &str) -> Result<Option<TaskCompletion>> {
        let task = self.task_mut(task_id)?;
        task.completed = !task.completed;
        if !task.completed {
            return Ok(None);
        }

        let estimated = task.subtask_estimate();
        let time_saved = (estimated > 0 && task.time_spent > 0)
            .then(|| estimated as i64 - task.time_spent as i64);
        task.time_saved = time_saved.filter(|s| *s > 0).map(|s| s as u64);

        Ok(Some(TaskCompletion {
            task_id: task.id.clone(),
            label: task.label.clone(),
            estimated_minutes: estimated,
            time_spent: task.time_spent,
            time_saved,
        }))
    }
}
