//! Page sources
//!
//! A `PageSource` is the document loaded for the current process lifetime.
//! It may still be loading when extraction starts, so callers poll
//! `snapshot()` until it yields a document.

use crate::config::UserAgentConfig;
use async_trait::async_trait;
use reqwest::{redirect::Policy, Client, StatusCode};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use thiserror::Error;
use url::Url;

/// Errors that make a page permanently unloadable for this lifetime
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum LoadError {
    #[error("HTTP {status_code} for {location}")]
    HttpStatus { location: String, status_code: u16 },

    #[error("Cannot resolve {location}: {message}")]
    InvalidLocation { location: String, message: String },

    #[error("Failed to load {location}: {message}")]
    Failed { location: String, message: String },
}

/// The document loaded at the current location
#[async_trait]
pub trait PageSource: Send + Sync {
    /// The location identifier this page was loaded for
    fn location(&self) -> &str;

    /// Returns the current document, or `None` while it is still loading
    async fn snapshot(&self) -> Result<Option<String>, LoadError>;
}

/// Builds an HTTP client with proper configuration
///
/// # Example
///
/// ```no_run
/// use tidewalk::config::UserAgentConfig;
/// use tidewalk::crawler::build_http_client;
///
/// let config = UserAgentConfig {
///     crawler_name: "Tidewalk".to_string(),
///     crawler_version: "1.0".to_string(),
///     contact_url: "https://example.com/about".to_string(),
///     contact_email: "admin@example.com".to_string(),
/// };
///
/// let client = build_http_client(&config).unwrap();
/// ```
pub fn build_http_client(config: &UserAgentConfig) -> Result<Client, reqwest::Error> {
    // Format: CrawlerName/Version (+ContactURL; ContactEmail)
    let user_agent = format!(
        "{}/{} (+{}; {})",
        config.crawler_name, config.crawler_version, config.contact_url, config.contact_email
    );

    Client::builder()
        .user_agent(user_agent)
        .timeout(Duration::from_secs(30))
        .connect_timeout(Duration::from_secs(10))
        .redirect(Policy::limited(10))
        .gzip(true)
        .brotli(true)
        .build()
}

/// A page fetched over HTTP
///
/// Each snapshot issues a fresh GET. Transient conditions (timeouts,
/// connection failures, 429, 5xx) read as "still loading" so the caller
/// keeps polling; other client errors are permanent.
pub struct HttpPage {
    client: Client,
    location: String,
    url: Url,
}

impl HttpPage {
    pub fn new(client: Client, location: impl Into<String>, url: Url) -> Self {
        Self {
            client,
            location: location.into(),
            url,
        }
    }

    pub fn url(&self) -> &Url {
        &self.url
    }
}

#[async_trait]
impl PageSource for HttpPage {
    fn location(&self) -> &str {
        &self.location
    }

    async fn snapshot(&self) -> Result<Option<String>, LoadError> {
        let response = match self.client.get(self.url.clone()).send().await {
            Ok(response) => response,
            Err(e) if e.is_timeout() || e.is_connect() => {
                tracing::debug!("{} not reachable yet: {}", self.url, e);
                return Ok(None);
            }
            Err(e) => {
                return Err(LoadError::Failed {
                    location: self.location.clone(),
                    message: e.to_string(),
                })
            }
        };

        let status = response.status();
        if status == StatusCode::TOO_MANY_REQUESTS || status.is_server_error() {
            tracing::debug!("{} answered {}, polling again", self.url, status);
            return Ok(None);
        }

        if !status.is_success() {
            return Err(LoadError::HttpStatus {
                location: self.location.clone(),
                status_code: status.as_u16(),
            });
        }

        match response.text().await {
            Ok(body) => Ok(Some(body)),
            Err(e) => {
                tracing::debug!("Body of {} incomplete: {}", self.url, e);
                Ok(None)
            }
        }
    }
}

/// A page with fixed content, for tests and offline replays
pub struct StaticPage {
    location: String,
    content: StaticContent,
    pending_polls: usize,
    polls: AtomicUsize,
}

enum StaticContent {
    Document(String),
    Unavailable(LoadError),
}

impl StaticPage {
    /// A fully loaded document
    pub fn loaded(location: impl Into<String>, html: impl Into<String>) -> Self {
        Self {
            location: location.into(),
            content: StaticContent::Document(html.into()),
            pending_polls: 0,
            polls: AtomicUsize::new(0),
        }
    }

    /// A document that reads as loading for the first `polls` snapshots
    pub fn loading(location: impl Into<String>, polls: usize, html: impl Into<String>) -> Self {
        Self {
            pending_polls: polls,
            ..Self::loaded(location, html)
        }
    }

    /// A page that cannot be loaded at all
    pub fn unavailable(location: impl Into<String>, error: LoadError) -> Self {
        Self {
            location: location.into(),
            content: StaticContent::Unavailable(error),
            pending_polls: 0,
            polls: AtomicUsize::new(0),
        }
    }

    /// Number of snapshots taken so far
    pub fn polls(&self) -> usize {
        self.polls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl PageSource for StaticPage {
    fn location(&self) -> &str {
        &self.location
    }

    async fn snapshot(&self) -> Result<Option<String>, LoadError> {
        let seen = self.polls.fetch_add(1, Ordering::SeqCst);
        match &self.content {
            StaticContent::Unavailable(error) => Err(error.clone()),
            StaticContent::Document(_) if seen < self.pending_polls => Ok(None),
            StaticContent::Document(html) => Ok(Some(html.clone())),
        }
    }
}
