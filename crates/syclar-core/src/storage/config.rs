//! TOML-based application configuration.
//!
//! Stores:
//! - Tracker policy (allowance cost, unproductive domains)
//! - Focus earn rates and task completion points
//! - Store backend and aggregate cache lifetime
//! - Signup notification routing
//! - Suggestion model settings
//!
//! Configuration is stored at `<data_dir>/config.toml`. API keys are never
//! written here; they come from the environment.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use super::data_dir;
use crate::allowance::{Allowance, AllowancePolicy, DomainDenylist, DEFAULT_UNPRODUCTIVE_DOMAINS};
use crate::error::{ConfigError, Result};
use crate::focus::{EarnRates, TASK_COMPLETION_POINTS};

/// Tracker policy configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrackerConfig {
    #[serde(default = "default_allowance_cost")]
    pub allowance_cost_per_minute: Allowance,
    #[serde(default = "default_unproductive_domains")]
    pub unproductive_domains: Vec<String>,
}

/// Focus earn configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FocusConfig {
    #[serde(default = "default_block_minutes")]
    pub block_minutes: u64,
    #[serde(default = "default_allowance_per_block")]
    pub allowance_per_block: Allowance,
    #[serde(default = "default_one")]
    pub goodwill_per_block: u64,
    #[serde(default = "default_task_completion_points")]
    pub task_completion_points: i64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreBackend {
    #[default]
    Sqlite,
    Memory,
}

/// Store configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoreConfig {
    #[serde(default)]
    pub backend: StoreBackend,
    #[serde(default = "default_aggregate_cache_secs")]
    pub aggregate_cache_secs: u64,
}

/// Signup notification configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NotifyConfig {
    /// `none`, `resend` or `sendgrid`.
    #[serde(default = "default_provider")]
    pub provider: String,
    /// Where signup notifications are delivered.
    #[serde(default)]
    pub notify_email: String,
    #[serde(default = "default_from_email")]
    pub from_email: String,
}

/// Suggestion model configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AiConfig {
    #[serde(default = "default_model")]
    pub model: String,
    #[serde(default = "default_temperature")]
    pub temperature: f64,
    #[serde(default = "default_base_url")]
    pub base_url: String,
}

/// Application configuration.
///
/// Serialized to/from TOML at `<data_dir>/config.toml`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub tracker: TrackerConfig,
    #[serde(default)]
    pub focus: FocusConfig,
    #[serde(default)]
    pub store: StoreConfig,
    #[serde(default)]
    pub notify: NotifyConfig,
    #[serde(default)]
    pub ai: AiConfig,
}

// Default functions
fn default_allowance_cost() -> Allowance {
    crate::allowance::DEFAULT_ALLOWANCE_COST_PER_MINUTE
}
fn default_unproductive_domains() -> Vec<String> {
    DEFAULT_UNPRODUCTIVE_DOMAINS.iter().map(|d| d.to_string()).collect()
}
fn default_block_minutes() -> u64 {
    5
}
fn default_allowance_per_block() -> Allowance {
    EarnRates::default().allowance_per_block
}
fn default_one() -> u64 {
    1
}
fn default_task_completion_points() -> i64 {
    TASK_COMPLETION_POINTS
}
fn default_aggregate_cache_secs() -> u64 {
    300
}
fn default_provider() -> String {
    "none".into()
}
fn default_from_email() -> String {
    "waitlist@syclar.app".into()
}
fn default_model() -> String {
    "gpt-4o-mini".into()
}
fn default_temperature() -> f64 {
    0.7
}
fn default_base_url() -> String {
    "https://api.openai.com/v1".into()
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            allowance_cost_per_minute: default_allowance_cost(),
            unproductive_domains: default_unproductive_domains(),
        }
    }
}

impl Default for FocusConfig {
    fn default() -> Self {
        Self {
            block_minutes: default_block_minutes(),
            allowance_per_block: default_allowance_per_block(),
            goodwill_per_block: 1,
            task_completion_points: TASK_COMPLETION_POINTS,
        }
    }
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            backend: StoreBackend::Sqlite,
            aggregate_cache_secs: default_aggregate_cache_secs(),
        }
    }
}

impl Default for NotifyConfig {
    fn default() -> Self {
        Self {
            provider: default_provider(),
            notify_email: String::new(),
            from_email: default_from_email(),
        }
    }
}

impl Default for AiConfig {
    fn default() -> Self {
        Self {
            model: default_model(),
            temperature: default_temperature(),
            base_url: default_base_url(),
        }
    }
}

impl Config {
    fn get_json_value_by_path<'a>(
        root: &'a serde_json::Value,
        key: &str,
    ) -> Option<&'a serde_json::Value> {
        if key.is_empty() {
            return None;
        }

        let mut current = root;
        for part in key.split('.') {
            current = current.get(part)?;
        }
        Some(current)
    }

    fn set_json_value_by_path(root: &mut serde_json::Value, key: &str, value: &str) -> Result<()> {
        let unknown = || ConfigError::UnknownKey(key.to_string());
        let invalid = |message: String| ConfigError::InvalidValue {
            key: key.to_string(),
            message,
        };

        let mut parts = key.split('.').peekable();
        if key.is_empty() {
            return Err(unknown().into());
        }

        let mut current = root;
        while let Some(part) = parts.next() {
            let is_leaf = parts.peek().is_none();
            if is_leaf {
                let obj = current.as_object_mut().ok_or_else(unknown)?;
                let existing = obj.get(part).ok_or_else(unknown)?;

                let new_value = match existing {
                    serde_json::Value::Bool(_) => serde_json::Value::Bool(
                        value.parse::<bool>().map_err(|e| invalid(e.to_string()))?,
                    ),
                    serde_json::Value::Number(_) => {
                        if let Ok(n) = value.parse::<u64>() {
                            serde_json::Value::Number(n.into())
                        } else if let Ok(n) = value.parse::<i64>() {
                            serde_json::Value::Number(n.into())
                        } else if let Ok(n) = value.parse::<f64>() {
                            serde_json::Number::from_f64(n)
                                .map(serde_json::Value::Number)
                                .ok_or_else(|| invalid(format!("cannot parse '{value}' as number")))?
                        } else {
                            return Err(invalid(format!("cannot parse '{value}' as number")).into());
                        }
                    }
                    serde_json::Value::Object(_) | serde_json::Value::Array(_) => {
                        serde_json::from_str(value).map_err(|e| invalid(e.to_string()))?
                    }
                    _ => serde_json::Value::String(value.into()),
                };

                obj.insert(part.to_string(), new_value);
                return Ok(());
            }

            current = current.get_mut(part).ok_or_else(unknown)?;
        }

        Err(unknown().into())
    }

    pub fn path() -> Result<PathBuf> {
        Ok(data_dir()?.join("config.toml"))
    }

    /// Load from disk or return default.
    ///
    /// # Errors
    ///
    /// Returns an error if the config file exists but cannot be parsed,
    /// or if the default config cannot be written to disk.
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::path()?)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        match std::fs::read_to_string(path) {
            Ok(content) => toml::from_str(&content).map_err(|e| {
                ConfigError::LoadFailed {
                    path: path.to_path_buf(),
                    message: e.to_string(),
                }
                .into()
            }),
            Err(_) => {
                let cfg = Self::default();
                cfg.save_to(path)?;
                Ok(cfg)
            }
        }
    }

    /// Persist to disk.
    ///
    /// # Errors
    ///
    /// Returns an error if the config cannot be serialized or written to disk.
    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::path()?)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        let save_failed = |message: String| ConfigError::SaveFailed {
            path: path.to_path_buf(),
            message,
        };
        let content = toml::to_string_pretty(self).map_err(|e| save_failed(e.to_string()))?;
        std::fs::write(path, content).map_err(|e| save_failed(e.to_string()))?;
        Ok(())
    }

    /// Get a config value as string by dot-separated key.
    pub fn get(&self, key: &str) -> Option<String> {
        let json = serde_json::to_value(self).ok()?;
        let val = Self::get_json_value_by_path(&json, key)?;
        match val {
            serde_json::Value::String(s) => Some(s.clone()),
            other => Some(other.to_string()),
        }
    }

    /// Set a value by key in memory. Returns error if key is unknown or the
    /// value has the wrong shape.
    pub fn set_value(&mut self, key: &str, value: &str) -> Result<()> {
        let mut json = serde_json::to_value(&*self)?;
        Self::set_json_value_by_path(&mut json, key, value)?;
        *self = serde_json::from_value(json).map_err(|e| ConfigError::InvalidValue {
            key: key.to_string(),
            message: e.to_string(),
        })?;
        Ok(())
    }

    /// Set a value by key and persist.
    pub fn set(&mut self, key: &str, value: &str) -> Result<()> {
        self.set_value(key, value)?;
        self.save()
    }

    /// Restore defaults and persist.
    pub fn reset(&mut self) -> Result<()> {
        *self = Self::default();
        self.save()
    }

    pub fn allowance_policy(&self) -> AllowancePolicy {
        AllowancePolicy::new(self.tracker.allowance_cost_per_minute)
    }

    pub fn classifier(&self) -> DomainDenylist {
        DomainDenylist::new(self.tracker.unproductive_domains.iter().cloned())
    }

    pub fn earn_rates(&self) -> EarnRates {
        EarnRates {
            block_minutes: self.focus.block_minutes,
            allowance_per_block: self.focus.allowance_per_block,
            goodwill_per_block: self.focus.goodwill_per_block,
        }
    }
}
