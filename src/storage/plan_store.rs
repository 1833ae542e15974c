//! Typed access to the persisted crawl plan and its sibling keys

use crate::state::CrawlPlan;
use crate::storage::keys::{EXPORT_FLAG_KEY, NAVIGATION_KEY, PLAN_FLAG_KEYS, PLAN_KEY};
use crate::storage::traits::{StateStore, StorageResult, WriteBatch};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// A navigation the host should perform at the start of the next lifetime
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NavigationTarget {
    pub location: String,
    pub requested_at: DateTime<Utc>,
}

impl NavigationTarget {
    pub fn now(location: impl Into<String>) -> Self {
        Self {
            location: location.into(),
            requested_at: Utc::now(),
        }
    }
}

/// Plan persistence over a state store
///
/// Each process lifetime performs at most one plan read and one plan write
/// through this type.
#[derive(Clone)]
pub struct PlanStore {
    store: Arc<dyn StateStore>,
}

impl PlanStore {
    pub fn new(store: Arc<dyn StateStore>) -> Self {
        Self { store }
    }

    /// The underlying key/value store
    pub fn store(&self) -> &Arc<dyn StateStore> {
        &self.store
    }

    /// Reads the active plan, if any
    pub async fn load(&self) -> StorageResult<Option<CrawlPlan>> {
        match self.store.get(PLAN_KEY).await? {
            Some(json) => Ok(Some(serde_json::from_str(&json)?)),
            None => Ok(None),
        }
    }

    /// Overwrites the active plan
    pub async fn save(&self, plan: &CrawlPlan) -> StorageResult<()> {
        let json = serde_json::to_string(plan)?;
        self.store.set(PLAN_KEY, &json).await
    }

    /// Installs a new plan and clears every one-shot flag in one write
    pub async fn begin(&self, plan: &CrawlPlan) -> StorageResult<()> {
        let json = serde_json::to_string(plan)?;
        let batch = PLAN_FLAG_KEYS
            .iter()
            .fold(WriteBatch::new(), |batch, key| batch.remove(*key))
            .set(PLAN_KEY, json);
        self.store.write_batch(batch).await
    }

    /// Persists a step together with the location the next lifetime must load
    ///
    /// Both keys land in one write, so a lifetime never starts with a plan
    /// whose cursor has moved past the recorded navigation target.
    pub async fn checkpoint(&self, plan: &CrawlPlan, next: &NavigationTarget) -> StorageResult<()> {
        let batch = WriteBatch::new()
            .set(PLAN_KEY, serde_json::to_string(plan)?)
            .set(NAVIGATION_KEY, serde_json::to_string(next)?);
        self.store.write_batch(batch).await
    }

    /// Records that the report for `plan_id` reached the sink
    pub async fn mark_exported(&self, plan_id: &str) -> StorageResult<()> {
        self.store.set(EXPORT_FLAG_KEY, plan_id).await
    }

    /// Removes a delivered plan and records that its report was exported
    pub async fn finish(&self, plan_id: &str) -> StorageResult<()> {
        let batch = WriteBatch::new()
            .remove(PLAN_KEY)
            .remove(NAVIGATION_KEY)
            .set(EXPORT_FLAG_KEY, plan_id);
        self.store.write_batch(batch).await
    }

    /// Drops the plan without exporting anything
    pub async fn discard(&self) -> StorageResult<()> {
        self.store.remove(&[PLAN_KEY, NAVIGATION_KEY]).await
    }

    /// Id of the plan whose report was already delivered
    pub async fn export_flag(&self) -> StorageResult<Option<String>> {
        self.store.get(EXPORT_FLAG_KEY).await
    }

    pub async fn navigation_target(&self) -> StorageResult<Option<NavigationTarget>> {
        match self.store.get(NAVIGATION_KEY).await? {
            Some(json) => Ok(Some(serde_json::from_str(&json)?)),
            None => Ok(None),
        }
    }

    pub async fn set_navigation_target(&self, target: &NavigationTarget) -> StorageResult<()> {
        let json = serde_json::to_string(target)?;
        self.store.set(NAVIGATION_KEY, &json).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::PlanOptions;
    use crate::storage::MemoryStore;

    fn plan_store() -> (Arc<MemoryStore>, PlanStore) {
        let store = Arc::new(MemoryStore::new());
        (store.clone(), PlanStore::new(store))
    }

    fn sample_plan() -> CrawlPlan {
        CrawlPlan::new(
            vec!["a.html".to_string(), "b.html".to_string()],
            PlanOptions::default(),
        )
    }

    #[tokio::test]
    async fn test_load_absent_plan() {
        let (_, plans) = plan_store();
        assert!(plans.load().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_save_then_load() {
        let (_, plans) = plan_store();
        let mut plan = sample_plan();
        plan.begin_attempt();

        plans.save(&plan).await.unwrap();
        assert_eq!(plans.load().await.unwrap(), Some(plan));
    }

    #[tokio::test]
    async fn test_begin_clears_leftover_flags() {
        let (store, plans) = plan_store();
        store.set(EXPORT_FLAG_KEY, "previous-plan").await.unwrap();
        plans
            .set_navigation_target(&NavigationTarget::now("old.html"))
            .await
            .unwrap();

        let plan = sample_plan();
        plans.begin(&plan).await.unwrap();

        assert_eq!(plans.export_flag().await.unwrap(), None);
        assert_eq!(plans.navigation_target().await.unwrap(), None);
        assert_eq!(plans.load().await.unwrap(), Some(plan));
    }

    #[tokio::test]
    async fn test_finish_sets_export_flag() {
        let (_, plans) = plan_store();
        let plan = sample_plan();
        plans.begin(&plan).await.unwrap();
        plans
            .set_navigation_target(&NavigationTarget::now("a.html"))
            .await
            .unwrap();

        plans.finish(&plan.id).await.unwrap();

        assert!(plans.load().await.unwrap().is_none());
        assert!(plans.navigation_target().await.unwrap().is_none());
        assert_eq!(plans.export_flag().await.unwrap(), Some(plan.id));
    }

    #[tokio::test]
    async fn test_checkpoint_writes_plan_and_target() {
        let (_, plans) = plan_store();
        let mut plan = sample_plan();
        plans.begin(&plan).await.unwrap();

        plan.begin_attempt();
        plan.record_success(Default::default());
        plans
            .checkpoint(&plan, &NavigationTarget::now("b.html"))
            .await
            .unwrap();

        assert_eq!(plans.load().await.unwrap(), Some(plan));
        let target = plans.navigation_target().await.unwrap().unwrap();
        assert_eq!(target.location, "b.html");
    }

    #[tokio::test]
    async fn test_mark_exported_keeps_plan() {
        let (_, plans) = plan_store();
        let plan = sample_plan();
        plans.begin(&plan).await.unwrap();

        plans.mark_exported(&plan.id).await.unwrap();

        assert_eq!(plans.export_flag().await.unwrap(), Some(plan.id.clone()));
        assert_eq!(plans.load().await.unwrap(), Some(plan));
    }

    #[tokio::test]
    async fn test_corrupt_plan_is_an_error() {
        let (store, plans) = plan_store();
        store.set(PLAN_KEY, "{not json").await.unwrap();
        assert!(plans.load().await.is_err());

        plans.discard().await.unwrap();
        assert!(plans.load().await.unwrap().is_none());
    }
}
