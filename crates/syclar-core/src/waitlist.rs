//! Email waitlist backed by a [`KvStore`] set plus a timestamp hash.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{CoreError, Result, ValidationError};
use crate::integrations::Notifier;
use crate::storage::KvStore;

const MEMBERS_KEY: &str = "waitlist";
const TIMESTAMPS_KEY: &str = "waitlist:timestamps";

pub const INVALID_EMAIL_MESSAGE: &str = "Please enter a valid email address format.";
pub const DUPLICATE_EMAIL_MESSAGE: &str = "Email already registered";

/// Check the shape of an email address and return it trimmed.
pub fn validate_email(email: &str) -> Result<String> {
    let invalid = || ValidationError::InvalidValue {
        field: "email".to_string(),
        message: INVALID_EMAIL_MESSAGE.to_string(),
    };

    let email = email.trim();
    if email.is_empty() || email.chars().any(char::is_whitespace) {
        return Err(invalid().into());
    }
    let (local, domain) = email.split_once('@').ok_or_else(invalid)?;
    if local.is_empty() || domain.contains('@') {
        return Err(invalid().into());
    }
    let labels: Vec<&str> = domain.split('.').collect();
    if labels.len() < 2 || labels.iter().any(|l| l.is_empty()) {
        return Err(invalid().into());
    }
    Ok(email.to_string())
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WaitlistEntry {
    pub email: String,
    pub timestamp: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WaitlistListing {
    pub count: usize,
    pub emails: Vec<WaitlistEntry>,
}

/// Outcome of a successful signup.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JoinOutcome {
    pub email: String,
    pub total: u64,
    pub notified: bool,
}

pub struct Waitlist<'a, S: KvStore + ?Sized> {
    store: &'a S,
}

impl<'a, S: KvStore + ?Sized> Waitlist<'a, S> {
    pub fn new(store: &'a S) -> Self {
        Self { store }
    }

    /// Store a new signup. Returns the new total.
    pub fn add(&self, email: &str, now: DateTime<Utc>) -> Result<u64> {
        let email = validate_email(email)?;
        if !self.store.sadd(MEMBERS_KEY, &email)? {
            return Err(CoreError::Conflict(DUPLICATE_EMAIL_MESSAGE.to_string()));
        }
        let mut stamp = BTreeMap::new();
        stamp.insert(email.clone(), now.to_rfc3339());
        self.store.hset(TIMESTAMPS_KEY, &stamp)?;
        tracing::info!(email = %email, "waitlist signup");
        Ok(self.count())
    }

    /// Store a new signup and tell the notifier about it.
    ///
    /// A notifier failure is logged and never fails the signup.
    pub async fn join<N: Notifier>(
        &self,
        email: &str,
        now: DateTime<Utc>,
        notifier: &N,
    ) -> Result<JoinOutcome> {
        let total = self.add(email, now)?;
        let email = email.trim().to_string();
        let notified = match notifier.notify_new_signup(&email, total).await {
            Ok(sent) => sent,
            Err(e) => {
                tracing::warn!(error = %e, "failed to send signup notification");
                false
            }
        };
        Ok(JoinOutcome {
            email,
            total,
            notified,
        })
    }

    /// Number of signups; 0 when the store cannot be read.
    pub fn count(&self) -> u64 {
        self.store.scard(MEMBERS_KEY).unwrap_or_else(|e| {
            tracing::warn!(error = %e, "failed to read waitlist count");
            0
        })
    }

    /// All signups, newest first; entries without a timestamp come last.
    pub fn entries(&self) -> Result<Vec<WaitlistEntry>> {
        let emails = self.store.smembers(MEMBERS_KEY)?;
        let stamps = self.store.hgetall(TIMESTAMPS_KEY)?;
        let mut entries: Vec<WaitlistEntry> = emails
            .into_iter()
            .map(|email| {
                let timestamp = stamps
                    .get(&email)
                    .and_then(|t| DateTime::parse_from_rfc3339(t).ok())
                    .map(|t| t.with_timezone(&Utc));
                WaitlistEntry { email, timestamp }
            })
            .collect();
        // None sorts before Some, so reversing puts newest first and missing last.
        entries.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
        Ok(entries)
    }

    /// Admin listing. When `expected_key` is set, `key` must match it.
    pub fn list(&self, key: Option<&str>, expected_key: Option<&str>) -> Result<WaitlistListing> {
        if let Some(expected) = expected_key.filter(|k| !k.is_empty()) {
            if key != Some(expected) {
                return Err(CoreError::Unauthorized);
            }
        }
        let emails = self.entries()?;
        Ok(WaitlistListing {
            count: emails.len(),
            emails,
        })
    }
}
