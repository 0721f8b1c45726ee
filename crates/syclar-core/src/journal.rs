//! Journal: short free-text stories and a per-client accomplishments blob.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::{CoreError, Result, ValidationError};
use crate::storage::{get_json, set_json, KvStore};

const STORIES_KEY: &str = "stories";
const ACCOMPLISHMENTS_PREFIX: &str = "accomplishments";

pub const MAX_STORY_CHARS: usize = 2000;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Story {
    /// Creation time in epoch milliseconds, bumped to stay unique.
    pub id: i64,
    pub content: String,
    pub date: DateTime<Utc>,
    /// Human-readable day, e.g. "Monday, January 1, 2024".
    pub created_at: String,
}

pub struct Journal<'a, S: KvStore + ?Sized> {
    store: &'a S,
}

impl<'a, S: KvStore + ?Sized> Journal<'a, S> {
    pub fn new(store: &'a S) -> Self {
        Self { store }
    }

    fn stories(&self) -> Result<Vec<Story>> {
        Ok(get_json(self.store, STORIES_KEY)?.unwrap_or_default())
    }

    pub fn add_story(&self, content: &str, now: DateTime<Utc>) -> Result<Story> {
        let content = content.trim();
        if content.is_empty() {
            return Err(ValidationError::Required("story content".to_string()).into());
        }
        if content.chars().count() > MAX_STORY_CHARS {
            return Err(ValidationError::TooLong {
                field: "story".to_string(),
                max: MAX_STORY_CHARS,
            }
            .into());
        }

        let mut stories = self.stories()?;
        let latest = stories.iter().map(|s| s.id).max().unwrap_or(i64::MIN);
        let story = Story {
            id: now.timestamp_millis().max(latest.saturating_add(1)),
            content: content.to_string(),
            date: now,
            created_at: now.format("%A, %B %-d, %Y").to_string(),
        };
        stories.push(story.clone());
        set_json(self.store, STORIES_KEY, &stories)?;
        tracing::debug!(id = story.id, "story saved");
        Ok(story)
    }

    /// All stories, newest first.
    pub fn list_stories(&self) -> Result<Vec<Story>> {
        let mut stories = self.stories()?;
        stories.sort_by(|a, b| b.date.cmp(&a.date).then(b.id.cmp(&a.id)));
        Ok(stories)
    }

    /// Returns `false` when no story had that id.
    pub fn delete_story(&self, id: i64) -> Result<bool> {
        let mut stories = self.stories()?;
        let before = stories.len();
        stories.retain(|s| s.id != id);
        if stories.len() == before {
            return Ok(false);
        }
        set_json(self.store, STORIES_KEY, &stories)?;
        Ok(true)
    }

    fn accomplishments_key(client_id: &str) -> Result<String> {
        let client_id = client_id.trim();
        if client_id.is_empty() {
            return Err(ValidationError::Required("clientId".to_string()).into());
        }
        Ok(format!("{ACCOMPLISHMENTS_PREFIX}:{client_id}"))
    }

    /// Replace a client's accomplishments. Only JSON objects are accepted.
    pub fn save_accomplishments(&self, client_id: &str, accomplishments: &Value) -> Result<()> {
        let key = Self::accomplishments_key(client_id)?;
        if !accomplishments.is_object() {
            return Err(CoreError::invalid("accomplishments", "Invalid payload"));
        }
        set_json(self.store, &key, accomplishments)
    }

    /// A client's accomplishments; `{}` when nothing was saved.
    pub fn load_accomplishments(&self, client_id: &str) -> Result<Value> {
        let key = Self::accomplishments_key(client_id)?;
        Ok(get_json(self.store, &key)?.unwrap_or_else(|| Value::Object(Map::new())))
    }
}
