//! Productive/unproductive classification of the current context.

use url::Url;

/// Leisure and shopping sites that count as unproductive out of the box.
pub const DEFAULT_UNPRODUCTIVE_DOMAINS: &[&str] = &[
    "youtube.com",
    "facebook.com",
    "instagram.com",
    "twitter.com",
    "x.com",
    "tiktok.com",
    "reddit.com",
    "netflix.com",
    "hulu.com",
    "disney.com",
    "amazon.com",
    "ebay.com",
    "etsy.com",
    "pinterest.com",
    "twitch.tv",
    "discord.com",
    "9gag.com",
    "buzzfeed.com",
    "imgur.com",
];

/// Decides whether a context identifier (usually a URL) is unproductive.
pub trait ContextClassifier {
    fn is_unproductive(&self, identifier: &str) -> bool;
}

impl<F> ContextClassifier for F
where
    F: Fn(&str) -> bool,
{
    fn is_unproductive(&self, identifier: &str) -> bool {
        self(identifier)
    }
}

/// Host-based denylist. A URL is unproductive when its host equals a listed
/// domain or is a subdomain of one. Anything that does not parse as an
/// absolute URL with a host is productive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DomainDenylist {
    domains: Vec<String>,
}

impl DomainDenylist {
    pub fn new<I, S>(domains: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let domains = domains
            .into_iter()
            .map(|d| d.into().trim().trim_start_matches('.').to_ascii_lowercase())
            .filter(|d| !d.is_empty())
            .collect();
        Self { domains }
    }

    pub fn domains(&self) -> &[String] {
        &self.domains
    }

    fn host_matches(&self, host: &str) -> bool {
        self.domains.iter().any(|d| {
            host == d
                || host
                    .strip_suffix(d.as_str())
                    .is_some_and(|prefix| prefix.ends_with('.'))
        })
    }
}

impl Default for DomainDenylist {
    fn default() -> Self {
        Self::new(DEFAULT_UNPRODUCTIVE_DOMAINS.iter().copied())
    }
}

impl ContextClassifier for DomainDenylist {
    fn is_unproductive(&self, identifier: &str) -> bool {
        let Ok(url) = Url::parse(identifier.trim()) else {
            return false;
        };
        match url.host_str() {
            Some(host) => self.host_matches(&host.to_ascii_lowercase()),
            None => false,
        }
    }
}
