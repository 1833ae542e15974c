//! Report persistence in the state store
//!
//! Keeps the most recent report in the TTL cache so it can still be picked up
//! by a later invocation when nothing was listening at completion time.

use crate::output::traits::{CrawlReport, ResultSink, SinkResult};
use crate::storage::keys::LAST_REPORT_ENTRY;
use crate::storage::{StorageResult, TtlCache};
use async_trait::async_trait;

/// Sink that stores the report as a cache entry
#[derive(Clone)]
pub struct CacheSink {
    cache: TtlCache,
}

impl CacheSink {
    pub fn new(cache: TtlCache) -> Self {
        Self { cache }
    }
}

#[async_trait]
impl ResultSink for CacheSink {
    async fn deliver(&self, report: CrawlReport) -> SinkResult<()> {
        self.cache.put(LAST_REPORT_ENTRY, &report).await?;
        tracing::debug!("Cached report for plan {}", report.plan_id);
        Ok(())
    }
}

/// Reads the most recent cached report, if it has not expired
pub async fn load_last_report(cache: &TtlCache) -> StorageResult<Option<CrawlReport>> {
    cache.get(LAST_REPORT_ENTRY).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::output::traits::CrawlStatus;
    use crate::state::{CrawlPlan, PlanOptions, RecordFields};
    use crate::storage::MemoryStore;
    use chrono::Duration;
    use std::sync::Arc;

    #[tokio::test]
    async fn test_cached_report_round_trip() {
        let cache = TtlCache::new(Arc::new(MemoryStore::new()), Duration::minutes(5));
        let sink = CacheSink::new(cache.clone());

        assert!(load_last_report(&cache).await.unwrap().is_none());

        let mut plan = CrawlPlan::new(vec!["a.html".to_string()], PlanOptions::default());
        plan.begin_attempt();
        plan.record_success(RecordFields::new());
        let report = CrawlReport::from_plan(plan, CrawlStatus::Completed);

        sink.deliver(report.clone()).await.unwrap();
        assert_eq!(load_last_report(&cache).await.unwrap(), Some(report));
    }
}
