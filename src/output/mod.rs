//! Output module for finished crawls
//!
//! This module handles:
//! - The final `CrawlReport` handed over when a crawl ends
//! - Result sinks (JSON export, cached copy in the state store)
//! - Console rendering of reports and progress

mod json_output;
pub mod stats;
mod store_output;
mod traits;

pub use json_output::JsonFileSink;
pub use stats::{print_progress, print_report};
pub use store_output::{load_last_report, CacheSink};
pub use traits::{
    CrawlReport, CrawlStatus, ReportSummary, ResultSink, SinkError, SinkResult, Verdict,
};

use async_trait::async_trait;

/// Delivers each report to several sinks in order
///
/// Stops at the first failing sink; since sinks tolerate redelivery, the
/// whole chain can simply be retried.
pub struct MultiSink {
    sinks: Vec<Box<dyn ResultSink>>,
}

impl MultiSink {
    pub fn new(sinks: Vec<Box<dyn ResultSink>>) -> Self {
        Self { sinks }
    }

    pub fn len(&self) -> usize {
        self.sinks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sinks.is_empty()
    }
}

#[async_trait]
impl ResultSink for MultiSink {
    async fn deliver(&self, report: CrawlReport) -> SinkResult<()> {
        let Some((last, rest)) = self.sinks.split_last() else {
            return Ok(());
        };

        for sink in rest {
            sink.deliver(report.clone()).await?;
        }
        last.deliver(report).await
    }
}
