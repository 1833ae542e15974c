//! Result sink traits and types
//!
//! This module defines the trait interface for result sinks and the final
//! report handed to them when a crawl ends.

use crate::state::{CrawlPlan, ExtractedRecord};
use crate::storage::StorageError;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Errors that can occur while delivering a report
#[derive(Debug, Error)]
pub enum SinkError {
    #[error("Failed to write output: {0}")]
    Write(String),

    #[error("Failed to serialize report: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),
}

/// Result type for sink operations
pub type SinkResult<T> = Result<T, SinkError>;

/// How a crawl ended
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CrawlStatus {
    /// Every location was processed
    Completed,
    /// The crawl was cancelled before reaching the end
    Cancelled,
    /// The plan stopped making progress and was expired
    Abandoned,
}

impl fmt::Display for CrawlStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Completed => "completed",
            Self::Cancelled => "cancelled",
            Self::Abandoned => "abandoned",
        };
        write!(f, "{}", s)
    }
}

/// Overall outcome as shown to users
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    Success,
    Partial,
    Failed,
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Success => "success",
            Self::Partial => "partial",
            Self::Failed => "fail",
        };
        write!(f, "{}", s)
    }
}

/// Final aggregate of a finished crawl
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CrawlReport {
    pub plan_id: String,
    pub status: CrawlStatus,
    pub total_locations: usize,
    pub results: Vec<ExtractedRecord>,

    /// Locations that exhausted their retries, in original order
    pub failed_locations: Vec<String>,

    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
}

impl CrawlReport {
    /// Builds the report, taking ownership of the plan's results
    pub fn from_plan(plan: CrawlPlan, status: CrawlStatus) -> Self {
        let failed_locations = plan.failed_in_order();
        Self {
            plan_id: plan.id,
            status,
            total_locations: plan.locations.len(),
            results: plan.results,
            failed_locations,
            started_at: plan.created_at,
            finished_at: Utc::now(),
        }
    }

    pub fn succeeded(&self) -> usize {
        self.results.len()
    }

    pub fn failed(&self) -> usize {
        self.failed_locations.len()
    }

    /// Locations that produced a result or a permanent failure
    pub fn attempted(&self) -> usize {
        self.succeeded() + self.failed()
    }

    /// Locations never reached (cancelled or abandoned crawls)
    pub fn unvisited(&self) -> usize {
        self.total_locations.saturating_sub(self.attempted())
    }

    pub fn verdict(&self) -> Verdict {
        if self.succeeded() == 0 {
            Verdict::Failed
        } else if self.failed() == 0 && self.unvisited() == 0 {
            Verdict::Success
        } else {
            Verdict::Partial
        }
    }

    /// Counts-only view of the report
    pub fn summary(&self) -> ReportSummary {
        ReportSummary {
            plan_id: self.plan_id.clone(),
            status: self.status,
            total_locations: self.total_locations,
            succeeded: self.succeeded(),
            failed: self.failed(),
            verdict: self.verdict(),
        }
    }
}

/// What remains visible to the caller after a report was handed to a sink
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportSummary {
    pub plan_id: String,
    pub status: CrawlStatus,
    pub total_locations: usize,
    pub succeeded: usize,
    pub failed: usize,
    pub verdict: Verdict,
}

impl fmt::Display for ReportSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "plan {} {} ({}): {} succeeded, {} failed of {}",
            self.plan_id,
            self.status,
            self.verdict,
            self.succeeded,
            self.failed,
            self.total_locations
        )
    }
}

/// Trait for result sinks
///
/// A sink takes ownership of the final report. Delivering an empty report
/// must succeed, and delivering the same report twice must be harmless.
#[async_trait]
pub trait ResultSink: Send + Sync {
    async fn deliver(&self, report: CrawlReport) -> SinkResult<()>;
}
