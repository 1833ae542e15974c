//! JSON file export
//!
//! Writes the final report to disk for downstream tooling.

use crate::output::traits::{CrawlReport, ResultSink, SinkResult};
use async_trait::async_trait;
use std::path::{Path, PathBuf};

/// Sink that writes each delivered report as pretty-printed JSON
///
/// Every delivery overwrites the file, so redelivering a report leaves the
/// same bytes behind.
#[derive(Debug, Clone)]
pub struct JsonFileSink {
    path: PathBuf,
}

impl JsonFileSink {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl ResultSink for JsonFileSink {
    async fn deliver(&self, report: CrawlReport) -> SinkResult<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await?;
            }
        }

        let json = serde_json::to_vec_pretty(&report)?;
        tokio::fs::write(&self.path, json).await?;

        tracing::info!(
            "Wrote {} records ({} failed) to {}",
            report.succeeded(),
            report.failed(),
            self.path.display()
        );
        Ok(())
    }
}
