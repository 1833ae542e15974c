//! The extraction seam between the orchestrator and page-specific logic

use crate::crawler::page::PageSource;
use crate::state::RecordFields;
use async_trait::async_trait;
use thiserror::Error;

/// Why a record could not be extracted from the loaded page
///
/// Every variant counts as one failed attempt at the current location.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ExtractionFailure {
    #[error("Expected structure '{selector}' not found at {location}")]
    StructureNotFound { location: String, selector: String },

    #[error("Page at {location} was not ready after {waited_ms}ms")]
    Timeout { location: String, waited_ms: u64 },

    #[error("Page at {location} unavailable: {reason}")]
    Unavailable { location: String, reason: String },

    #[error("Loaded {actual} while {expected} was expected")]
    WrongLocation { expected: String, actual: String },
}

/// Extracts one record from a loaded page
///
/// Implementations wait for the page's expected structure to appear, bounded
/// by a hard timeout, and never retry on their own: retries belong to the
/// orchestrator.
#[async_trait]
pub trait ExtractionAdapter: Send + Sync {
    async fn extract(&self, page: &dyn PageSource) -> Result<RecordFields, ExtractionFailure>;
}
