//! CSS-selector driven extraction
//!
//! The page is polled until the ready selector matches, then each configured
//! field is read from the first element matching its selector. Raw values
//! are coerced into typed field values.

use crate::config::{ExtractionConfig, FieldRule};
use crate::crawler::adapter::{ExtractionAdapter, ExtractionFailure};
use crate::crawler::backoff::ExponentialBackoff;
use crate::crawler::page::PageSource;
use crate::state::{FieldValue, RecordFields};
use crate::ConfigError;
use async_trait::async_trait;
use scraper::{Html, Selector};
use std::time::Duration;
use tokio::time::Instant;

/// Upper bound on the delay between two readiness polls
const MAX_POLL_INTERVAL_MS: u64 = 2000;

struct FieldSelector {
    name: String,
    selector: Selector,
    attribute: Option<String>,
}

/// Extraction adapter configured from `[extraction]`
pub struct SelectorExtractor {
    ready_source: String,
    ready: Selector,
    fields: Vec<FieldSelector>,
    ready_timeout: Duration,
    backoff: ExponentialBackoff,
}

impl SelectorExtractor {
    pub fn from_config(config: &ExtractionConfig) -> Result<Self, ConfigError> {
        let ready = parse_selector(&config.ready_selector)?;
        let fields = config
            .fields
            .iter()
            .map(compile_field)
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            ready_source: config.ready_selector.clone(),
            ready,
            fields,
            ready_timeout: Duration::from_millis(config.ready_timeout_ms),
            backoff: ExponentialBackoff::new(
                config.poll_interval_ms,
                MAX_POLL_INTERVAL_MS.max(config.poll_interval_ms),
            ),
        })
    }

    /// Reads the configured fields once the ready selector matches
    ///
    /// Returns `None` while the document lacks the expected structure.
    fn read_fields(&self, html: &str) -> Option<RecordFields> {
        let document = Html::parse_document(html);
        document.select(&self.ready).next()?;

        let mut fields = RecordFields::new();
        for field in &self.fields {
            let Some(element) = document.select(&field.selector).next() else {
                continue;
            };

            let raw = match &field.attribute {
                Some(attribute) => element.value().attr(attribute).map(str::to_string),
                None => Some(element.text().collect::<String>()),
            };

            if let Some(raw) = raw.filter(|s| !s.trim().is_empty()) {
                fields.insert(field.name.clone(), FieldValue::coerce(&raw));
            }
        }

        Some(fields)
    }
}

#[async_trait]
impl ExtractionAdapter for SelectorExtractor {
    async fn extract(&self, page: &dyn PageSource) -> Result<RecordFields, ExtractionFailure> {
        let started = Instant::now();
        let deadline = started + self.ready_timeout;
        let mut saw_document = false;
        let mut poll = 0u32;

        loop {
            let remaining = deadline.saturating_duration_since(Instant::now());
            let snapshot = match tokio::time::timeout(remaining, page.snapshot()).await {
                Ok(snapshot) => snapshot,
                Err(_) => break,
            };

            match snapshot {
                Ok(Some(html)) => {
                    saw_document = true;
                    if let Some(fields) = self.read_fields(&html) {
                        tracing::debug!(
                            "Extracted {} fields from {} after {} polls",
                            fields.len(),
                            page.location(),
                            poll + 1
                        );
                        return Ok(fields);
                    }
                }
                Ok(None) => {}
                Err(e) => {
                    return Err(ExtractionFailure::Unavailable {
                        location: page.location().to_string(),
                        reason: e.to_string(),
                    });
                }
            }

            let delay = self.backoff.delay(poll);
            if Instant::now() + delay >= deadline {
                break;
            }
            tokio::time::sleep(delay).await;
            poll += 1;
        }

        if saw_document {
            Err(ExtractionFailure::StructureNotFound {
                location: page.location().to_string(),
                selector: self.ready_source.clone(),
            })
        } else {
            Err(ExtractionFailure::Timeout {
                location: page.location().to_string(),
                waited_ms: started.elapsed().as_millis() as u64,
            })
        }
    }
}

fn parse_selector(source: &str) -> Result<Selector, ConfigError> {
    Selector::parse(source)
        .map_err(|e| ConfigError::InvalidPattern(format!("selector '{}': {:?}", source, e)))
}

fn compile_field(rule: &FieldRule) -> Result<FieldSelector, ConfigError> {
    Ok(FieldSelector {
        name: rule.name.clone(),
        selector: parse_selector(&rule.selector)?,
        attribute: rule.attribute.clone(),
    })
}
