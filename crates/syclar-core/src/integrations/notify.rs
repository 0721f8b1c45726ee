//! Signup notifications over transactional email APIs.

use chrono::Utc;
use indoc::formatdoc;
use reqwest::Client;
use serde_json::json;

use crate::error::{CoreError, Result};
use crate::storage::NotifyConfig;

const RESEND_ENDPOINT: &str = "https://api.resend.com/emails";
const SENDGRID_ENDPOINT: &str = "https://api.sendgrid.com/v3/mail/send";

/// Fire-and-forget notification that someone joined the waitlist.
#[allow(async_fn_in_trait)]
pub trait Notifier {
    /// Returns `Ok(false)` when notifications are disabled.
    async fn notify_new_signup(&self, email: &str, total: u64) -> Result<bool>;
}

fn subject(total: u64) -> String {
    format!("New Waitlist Signup - Total: {total}")
}

fn html_body(email: &str, total: u64) -> String {
    formatdoc! {"
        <h2>New Waitlist Signup!</h2>
        <p><strong>Email:</strong> {email}</p>
        <p><strong>Total Waitlist Count:</strong> {total}</p>
        <p><strong>Time:</strong> {time}</p>
        ",
        email = email,
        total = total,
        time = Utc::now().to_rfc2822(),
    }
}

async fn post(client: &Client, service: &str, endpoint: &str, api_key: &str, body: serde_json::Value) -> Result<bool> {
    let resp = client
        .post(endpoint)
        .bearer_auth(api_key)
        .json(&body)
        .send()
        .await?;

    if resp.status().is_success() {
        return Ok(true);
    }
    let status = resp.status();
    let text = resp.text().await.unwrap_or_default();
    Err(CoreError::integration(service, format!("HTTP {status}: {text}")))
}

pub struct ResendNotifier {
    http_client: Client,
    api_key: String,
    from: String,
    to: String,
    endpoint: String,
}

impl ResendNotifier {
    pub fn new(api_key: impl Into<String>, from: impl Into<String>, to: impl Into<String>) -> Self {
        Self {
            http_client: Client::new(),
            api_key: api_key.into(),
            from: from.into(),
            to: to.into(),
            endpoint: RESEND_ENDPOINT.to_string(),
        }
    }

    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }
}

impl Notifier for ResendNotifier {
    async fn notify_new_signup(&self, email: &str, total: u64) -> Result<bool> {
        let body = json!({
            "from": self.from,
            "to": self.to,
            "subject": subject(total),
            "html": html_body(email, total),
        });
        post(&self.http_client, "resend", &self.endpoint, &self.api_key, body).await
    }
}

pub struct SendGridNotifier {
    http_client: Client,
    api_key: String,
    from: String,
    to: String,
    endpoint: String,
}

impl SendGridNotifier {
    pub fn new(api_key: impl Into<String>, from: impl Into<String>, to: impl Into<String>) -> Self {
        Self {
            http_client: Client::new(),
            api_key: api_key.into(),
            from: from.into(),
            to: to.into(),
            endpoint: SENDGRID_ENDPOINT.to_string(),
        }
    }

    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }
}

impl Notifier for SendGridNotifier {
    async fn notify_new_signup(&self, email: &str, total: u64) -> Result<bool> {
        let body = json!({
            "personalizations": [{ "to": [{ "email": self.to }] }],
            "from": { "email": self.from },
            "subject": subject(total),
            "content": [{ "type": "text/html", "value": html_body(email, total) }],
        });
        post(&self.http_client, "sendgrid", &self.endpoint, &self.api_key, body).await
    }
}

/// Notifier used when no provider is configured.
#[derive(Debug, Default, Clone, Copy)]
pub struct DisabledNotifier;

impl Notifier for DisabledNotifier {
    async fn notify_new_signup(&self, _email: &str, _total: u64) -> Result<bool> {
        tracing::debug!("signup notifications disabled");
        Ok(false)
    }
}

/// Provider chosen at runtime.
pub enum AnyNotifier {
    Resend(ResendNotifier),
    SendGrid(SendGridNotifier),
    Disabled(DisabledNotifier),
}

impl AnyNotifier {
    pub fn name(&self) -> &'static str {
        match self {
            AnyNotifier::Resend(_) => "resend",
            AnyNotifier::SendGrid(_) => "sendgrid",
            AnyNotifier::Disabled(_) => "none",
        }
    }
}

impl Notifier for AnyNotifier {
    async fn notify_new_signup(&self, email: &str, total: u64) -> Result<bool> {
        match self {
            AnyNotifier::Resend(n) => n.notify_new_signup(email, total).await,
            AnyNotifier::SendGrid(n) => n.notify_new_signup(email, total).await,
            AnyNotifier::Disabled(n) => n.notify_new_signup(email, total).await,
        }
    }
}

fn env_key(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.trim().is_empty())
}

/// Pick the notifier from `config` and the provider API keys in the
/// environment (`RESEND_API_KEY`, `SENDGRID_API_KEY`).
///
/// `provider = "auto"` takes whichever key is present, Resend first.
pub fn notifier_from_env(config: &NotifyConfig) -> AnyNotifier {
    notifier_from_keys(config, env_key("RESEND_API_KEY"), env_key("SENDGRID_API_KEY"))
}

fn notifier_from_keys(
    config: &NotifyConfig,
    resend_key: Option<String>,
    sendgrid_key: Option<String>,
) -> AnyNotifier {
    if config.notify_email.trim().is_empty() {
        return AnyNotifier::Disabled(DisabledNotifier);
    }
    let from = config.from_email.clone();
    let to = config.notify_email.clone();

    let resend = |key: String| AnyNotifier::Resend(ResendNotifier::new(key, from.clone(), to.clone()));
    let sendgrid = |key: String| AnyNotifier::SendGrid(SendGridNotifier::new(key, from.clone(), to.clone()));

    match config.provider.as_str() {
        "resend" => resend_key.map(resend),
        "sendgrid" => sendgrid_key.map(sendgrid),
        "auto" => resend_key.map(resend).or_else(|| sendgrid_key.map(sendgrid)),
        _ => None,
    }
    .unwrap_or_else(|| {
        if config.provider != "none" {
            tracing::warn!(provider = %config.provider, "notification provider has no API key; disabled");
        }
        AnyNotifier::Disabled(DisabledNotifier)
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(provider: &str, to: &str) -> NotifyConfig {
        NotifyConfig {
            provider: provider.to_string(),
            notify_email: to.to_string(),
            from_email: "noreply@example.com".to_string(),
        }
    }

    #[test]
    fn missing_recipient_disables() {
        let n = notifier_from_keys(&config("resend", ""), Some("k".into()), None);
        assert_eq!(n.name(), "none");
    }

    #[test]
    fn provider_needs_its_key() {
        let cfg = config("sendgrid", "me@example.com");
        assert_eq!(notifier_from_keys(&cfg, Some("k".into()), None).name(), "none");
        assert_eq!(notifier_from_keys(&cfg, None, Some("k".into())).name(), "sendgrid");
    }

    #[test]
    fn auto_prefers_resend() {
        let cfg = config("auto", "me@example.com");
        assert_eq!(
            notifier_from_keys(&cfg, Some("a".into()), Some("b".into())).name(),
            "resend"
        );
        assert_eq!(notifier_from_keys(&cfg, None, Some("b".into())).name(), "sendgrid");
        assert_eq!(notifier_from_keys(&cfg, None, None).name(), "none");
    }

    #[tokio::test]
    async fn disabled_notifier_reports_false() {
        assert!(!DisabledNotifier.notify_new_signup("a@b.co", 1).await.unwrap());
    }

    #[tokio::test]
    async fn resend_posts_bearer_json() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/emails")
            .match_header("authorization", "Bearer re_test")
            .match_body(mockito::Matcher::PartialJson(json!({
                "to": "me@example.com",
                "subject": "New Waitlist Signup - Total: 7",
            })))
            .with_status(200)
            .with_body(r#"{"id":"1"}"#)
            .create_async()
            .await;

        let notifier = ResendNotifier::new("re_test", "noreply@example.com", "me@example.com")
            .with_endpoint(format!("{}/emails", server.url()));
        assert!(notifier.notify_new_signup("new@example.com", 7).await.unwrap());
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn sendgrid_error_status_is_integration_error() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/v3/mail/send")
            .with_status(401)
            .with_body("bad key")
            .create_async()
            .await;

        let notifier = SendGridNotifier::new("sg", "noreply@example.com", "me@example.com")
            .with_endpoint(format!("{}/v3/mail/send", server.url()));
        let err = notifier.notify_new_signup("new@example.com", 1).await.unwrap_err();
        match err {
            CoreError::Integration { service, message, .. } => {
                assert_eq!(service, "sendgrid");
                assert!(message.contains("bad key"));
            }
            other => panic!("unexpected error: {other}"),
        }
        mock.assert_async().await;
    }
}
