//! Task breakdown and milestone suggestions from a chat-completions model.
//!
//! Without an API key the [`MockProvider`] answers with fixed suggestions so
//! that the board and planner stay usable offline.

use indoc::{formatdoc, indoc};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::error::{CoreError, Result, ValidationError};
use crate::storage::AiConfig;

/// Weeks assumed for a milestone when the model does not say.
pub const DEFAULT_MILESTONE_WEEKS: u32 = 2;
/// Minutes assumed for a subtask when the model does not say.
pub const DEFAULT_SUBTASK_MINUTES: u32 = 60;

const BREAKDOWN_SYSTEM_PROMPT: &str = indoc! {r#"
    You are a productivity coach. Break down tasks into 1-2 hour chunks. Each subtask should be:
    - Specific and actionable
    - 60-120 minutes to complete
    - Clear what "done" looks like
    - Sequential (can be done in order)

    Return ONLY a JSON object with a "subtasks" array. Each subtask has "label" (string) and "estimatedMinutes" (number 60-120).
"#};

const MILESTONES_SYSTEM_PROMPT: &str = indoc! {r#"
    You are a productivity coach for founders. Generate 4-5 concrete milestones (stones) that build toward a goal. Each milestone should be:
    - Specific and actionable
    - Sequential (build on each other)
    - Achievable in 1-4 weeks
    - Clear when complete

    Return ONLY a JSON object with a "milestones" array of milestone strings.
"#};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubtaskSuggestion {
    pub label: String,
    pub estimated_minutes: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MilestoneSuggestion {
    pub name: String,
    pub estimated_weeks: u32,
}

/// Structured suggestions from a prompt.
#[allow(async_fn_in_trait)]
pub trait SuggestionProvider {
    async fn breakdown_task(
        &self,
        task: &str,
        estimated_hours: Option<f64>,
    ) -> Result<Vec<SubtaskSuggestion>>;

    async fn generate_milestones(
        &self,
        pillar: &str,
        win_definition: &str,
    ) -> Result<Vec<MilestoneSuggestion>>;
}

fn require(field: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(ValidationError::Required(field.to_string()).into());
    }
    Ok(())
}

/// Deterministic offline suggestions.
#[derive(Debug, Default, Clone, Copy)]
pub struct MockProvider;

impl SuggestionProvider for MockProvider {
    async fn breakdown_task(
        &self,
        task: &str,
        _estimated_hours: Option<f64>,
    ) -> Result<Vec<SubtaskSuggestion>> {
        require("task", task)?;
        let labels = [
            "Research and gather requirements",
            "Set up initial structure",
            "Implement core functionality",
            "Test and refine",
        ];
        Ok(labels
            .iter()
            .zip((0u32..).map(|i| 60 + i * 15))
            .map(|(label, estimated_minutes)| SubtaskSuggestion {
                label: label.to_string(),
                estimated_minutes,
            })
            .collect())
    }

    async fn generate_milestones(
        &self,
        pillar: &str,
        win_definition: &str,
    ) -> Result<Vec<MilestoneSuggestion>> {
        require("pillar name", pillar)?;
        require("win definition", win_definition)?;
        let p = pillar.to_lowercase();
        Ok([
            format!("Validate {p}"),
            format!("Build MVP for {p}"),
            format!("Launch {p}"),
            format!("Get first users for {p}"),
        ]
        .into_iter()
        .map(|name| MilestoneSuggestion {
            name,
            estimated_weeks: DEFAULT_MILESTONE_WEEKS,
        })
        .collect())
    }
}

/// OpenAI-compatible chat-completions client.
pub struct OpenAiProvider {
    http_client: Client,
    api_key: String,
    config: AiConfig,
}

impl OpenAiProvider {
    pub fn new(api_key: impl Into<String>, config: AiConfig) -> Self {
        Self {
            http_client: Client::new(),
            api_key: api_key.into(),
            config,
        }
    }

    /// Send one system + user exchange and return the decoded JSON content.
    async fn complete_json(&self, system: &str, user: &str) -> Result<Value> {
        let url = format!("{}/chat/completions", self.config.base_url.trim_end_matches('/'));
        let body = json!({
            "model": self.config.model,
            "messages": [
                { "role": "system", "content": system },
                { "role": "user", "content": user },
            ],
            "response_format": { "type": "json_object" },
            "temperature": self.config.temperature,
        });

        let resp = self
            .http_client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await?;

        if !resp.status().is_success() {
            let status = resp.status();
            let text = resp.text().await.unwrap_or_default();
            return Err(CoreError::integration("openai", format!("HTTP {status}: {text}")));
        }

        let data: Value = resp.json().await?;
        let content = data["choices"][0]["message"]["content"]
            .as_str()
            .ok_or_else(|| CoreError::integration("openai", "response has no message content"))?;
        serde_json::from_str(content)
            .map_err(|e| CoreError::integration("openai", format!("content is not JSON: {e}")))
    }
}

/// Accept `[{label, estimatedMinutes}]` or bare strings; anything else is empty.
fn parse_subtasks(content: &Value) -> Vec<SubtaskSuggestion> {
    let Some(items) = content.get("subtasks").and_then(Value::as_array) else {
        return Vec::new();
    };
    items
        .iter()
        .filter_map(|item| match item {
            Value::String(label) => Some(SubtaskSuggestion {
                label: label.clone(),
                estimated_minutes: DEFAULT_SUBTASK_MINUTES,
            }),
            Value::Object(obj) => {
                let label = obj.get("label")?.as_str()?.to_string();
                let estimated_minutes = obj
                    .get("estimatedMinutes")
                    .and_then(Value::as_f64)
                    .map(|m| m.round().max(0.0) as u32)
                    .unwrap_or(DEFAULT_SUBTASK_MINUTES);
                Some(SubtaskSuggestion {
                    label,
                    estimated_minutes,
                })
            }
            _ => None,
        })
        .collect()
}

/// Accept `milestones` or `stones`, as strings or `{name, estimatedWeeks}`.
fn parse_milestones(content: &Value) -> Vec<MilestoneSuggestion> {
    let items = content
        .get("milestones")
        .or_else(|| content.get("stones"))
        .and_then(Value::as_array);
    let Some(items) = items else {
        return Vec::new();
    };
    items
        .iter()
        .filter_map(|item| match item {
            Value::String(name) => Some(MilestoneSuggestion {
                name: name.clone(),
                estimated_weeks: DEFAULT_MILESTONE_WEEKS,
            }),
            Value::Object(obj) => {
                let name = obj.get("name")?.as_str()?.to_string();
                let estimated_weeks = obj
                    .get("estimatedWeeks")
                    .and_then(Value::as_u64)
                    .map(|w| w as u32)
                    .unwrap_or(DEFAULT_MILESTONE_WEEKS);
                Some(MilestoneSuggestion {
                    name,
                    estimated_weeks,
                })
            }
            _ => None,
        })
        .collect()
}

impl SuggestionProvider for OpenAiProvider {
    async fn breakdown_task(
        &self,
        task: &str,
        estimated_hours: Option<f64>,
    ) -> Result<Vec<SubtaskSuggestion>> {
        require("task", task)?;
        let hours = estimated_hours
            .map(|h| format!("Estimated total time: {h} hours"))
            .unwrap_or_default();
        let user = formatdoc! {"
            Task: {task}
            {hours}

            Break this into 1-2 hour chunks. Return as JSON.",
            task = task,
            hours = hours,
        };
        let content = self.complete_json(BREAKDOWN_SYSTEM_PROMPT, &user).await?;
        Ok(parse_subtasks(&content))
    }

    async fn generate_milestones(
        &self,
        pillar: &str,
        win_definition: &str,
    ) -> Result<Vec<MilestoneSuggestion>> {
        require("pillar name", pillar)?;
        require("win definition", win_definition)?;
        let user = formatdoc! {"
            Pillar: {pillar}
            Win Definition: {win}

            Generate 4-5 milestones (stones) that build this pillar. Return as JSON.",
            pillar = pillar,
            win = win_definition,
        };
        let content = self.complete_json(MILESTONES_SYSTEM_PROMPT, &user).await?;
        Ok(parse_milestones(&content))
    }
}

/// Provider chosen at runtime.
pub enum AnyProvider {
    OpenAi(OpenAiProvider),
    Mock(MockProvider),
}

impl AnyProvider {
    pub fn is_mock(&self) -> bool {
        matches!(self, AnyProvider::Mock(_))
    }
}

impl SuggestionProvider for AnyProvider {
    async fn breakdown_task(
        &self,
        task: &str,
        estimated_hours: Option<f64>,
    ) -> Result<Vec<SubtaskSuggestion>> {
        match self {
            AnyProvider::OpenAi(p) => p.breakdown_task(task, estimated_hours).await,
            AnyProvider::Mock(p) => p.breakdown_task(task, estimated_hours).await,
        }
    }

    async fn generate_milestones(
        &self,
        pillar: &str,
        win_definition: &str,
    ) -> Result<Vec<MilestoneSuggestion>> {
        match self {
            AnyProvider::OpenAi(p) => p.generate_milestones(pillar, win_definition).await,
            AnyProvider::Mock(p) => p.generate_milestones(pillar, win_definition).await,
        }
    }
}

/// `OpenAiProvider` when `OPENAI_API_KEY` is set, the mock otherwise.
pub fn provider_from_env(config: &AiConfig) -> AnyProvider {
    match std::env::var("OPENAI_API_KEY") {
        Ok(key) if !key.trim().is_empty() => {
            AnyProvider::OpenAi(OpenAiProvider::new(key, config.clone()))
        }
        _ => {
            tracing::debug!("OPENAI_API_KEY not set; using mock suggestions");
            AnyProvider::Mock(MockProvider)
        }
    }
}
