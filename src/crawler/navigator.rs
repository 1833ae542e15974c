//! Navigation requests
//!
//! Navigating away ends the current process lifetime. The orchestrator only
//! asks for a navigation after the plan has been persisted.

use crate::storage::{NavigationTarget, PlanStore};
use crate::{Result, TidewalkError};
use async_trait::async_trait;

#[async_trait]
pub trait Navigator: Send + Sync {
    /// Requests that the next lifetime load `location`
    async fn navigate_to(&self, location: &str) -> Result<()>;
}

/// Records the navigation target in the durable store for the host to follow
pub struct StoreNavigator {
    plans: PlanStore,
}

impl StoreNavigator {
    pub fn new(plans: PlanStore) -> Self {
        Self { plans }
    }
}

#[async_trait]
impl Navigator for StoreNavigator {
    async fn navigate_to(&self, location: &str) -> Result<()> {
        self.plans
            .set_navigation_target(&NavigationTarget::now(location))
            .await
            .map_err(|e| TidewalkError::Navigation {
                location: location.to_string(),
                message: e.to_string(),
            })?;
        tracing::debug!("Navigation requested: {}", location);
        Ok(())
    }
}
