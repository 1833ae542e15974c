//! Crawl orchestration across process lifetimes
//!
//! Each lifetime performs at most one step: load the plan, extract from the
//! page that was loaded, persist the updated plan, then request the next
//! navigation. Nothing survives between lifetimes except what is persisted,
//! so a step never navigates before its write has succeeded.

use crate::config::CrawlConfig;
use crate::crawler::adapter::{ExtractionAdapter, ExtractionFailure};
use crate::crawler::navigator::Navigator;
use crate::crawler::page::PageSource;
use crate::crawler::progress::{LogProgress, ProgressReporter};
use crate::location::filter_locations;
use crate::output::{CrawlReport, CrawlStatus, ReportSummary, ResultSink};
use crate::state::{CrawlPlan, FailureDisposition, PlanOptions, PlanProgress};
use crate::storage::{NavigationTarget, PlanStore, StateStore, StorageError};
use crate::{Result, TidewalkError};
use chrono::{Duration, Utc};
use std::sync::Arc;

/// Limits and policy applied to new plans
#[derive(Debug, Clone)]
pub struct CrawlSettings {
    pub location_pattern: String,
    pub max_items: usize,
    pub skip_offset: u64,
    pub retry_limit: u32,

    /// Time without forward progress after which a plan is abandoned
    pub plan_max_age: Duration,

    pub config_hash: Option<String>,
}

impl CrawlSettings {
    pub fn from_config(config: &CrawlConfig, config_hash: Option<String>) -> Self {
        Self {
            location_pattern: config.location_pattern.clone(),
            max_items: config.max_items,
            skip_offset: config.skip_offset,
            retry_limit: config.retry_limit,
            plan_max_age: Duration::seconds(config.plan_max_age_secs as i64),
            config_hash,
        }
    }
}

impl Default for CrawlSettings {
    fn default() -> Self {
        Self::from_config(&CrawlConfig::default(), None)
    }
}

/// What a single resume step did
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StepOutcome {
    /// No plan is active
    NotCrawling,

    /// The attempt failed and the same location will be loaded again
    Retrying { location: String, attempt: u32 },

    /// The cursor moved forward and `next` will be loaded
    Advanced { next: String, cursor: usize },

    /// The pending navigation was re-issued without taking a step
    Renavigated { location: String },

    /// The crawl ended and its report went to the sink
    Completed(ReportSummary),

    /// The plan stopped making progress and was abandoned
    Expired(ReportSummary),
}

impl StepOutcome {
    /// Returns true when no further lifetime is needed
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            Self::NotCrawling | Self::Completed(_) | Self::Expired(_)
        )
    }
}

/// Drives one crawl plan forward, one step per process lifetime
///
/// An orchestrator holds no crawl state of its own. A fresh instance is built
/// for every lifetime and everything it knows comes from the plan store.
pub struct Orchestrator {
    plans: PlanStore,
    adapter: Arc<dyn ExtractionAdapter>,
    navigator: Arc<dyn Navigator>,
    progress: Arc<dyn ProgressReporter>,
    sink: Arc<dyn ResultSink>,
    settings: CrawlSettings,
}

impl Orchestrator {
    pub fn new(
        store: Arc<dyn StateStore>,
        adapter: Arc<dyn ExtractionAdapter>,
        navigator: Arc<dyn Navigator>,
        sink: Arc<dyn ResultSink>,
        settings: CrawlSettings,
    ) -> Self {
        Self {
            plans: PlanStore::new(store),
            adapter,
            navigator,
            progress: Arc::new(LogProgress),
            sink,
            settings,
        }
    }

    pub fn with_progress(mut self, progress: Arc<dyn ProgressReporter>) -> Self {
        self.progress = progress;
        self
    }

    pub fn settings(&self) -> &CrawlSettings {
        &self.settings
    }

    /// Starts a new crawl over `locations`, replacing any active plan
    ///
    /// Locations are filtered against the configured pattern and truncated to
    /// `max_items` before the plan is written. The plan and the cleared
    /// one-shot flags land in one write; navigation to the first location is
    /// requested only after that write succeeds.
    ///
    /// # Arguments
    ///
    /// * `locations` - Candidate location identifiers, in crawl order
    ///
    /// # Returns
    ///
    /// * `Ok(usize)` - Number of locations accepted into the new plan
    /// * `Err(TidewalkError::EmptyInput)` - Nothing survived filtering; no plan
    ///   was written and no navigation happened
    /// * `Err(TidewalkError::Storage)` - The plan could not be written
    ///
    /// # Example
    ///
    /// ```no_run
    /// # use tidewalk::crawler::Orchestrator;
    /// # async fn example(orchestrator: Orchestrator) -> tidewalk::Result<()> {
    /// let queued = orchestrator.start_crawl(["a.html", "", "b.html"]).await?;
    /// assert_eq!(queued, 2);
    /// # Ok(())
    /// # }
    /// ```
    pub async fn start_crawl<I, S>(&self, locations: I) -> Result<usize>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let submitted: Vec<String> = locations
            .into_iter()
            .map(|s| s.as_ref().to_string())
            .collect();
        let accepted = filter_locations(
            &submitted,
            &self.settings.location_pattern,
            self.settings.max_items,
        );

        let Some(first) = accepted.first().cloned() else {
            tracing::warn!(
                "None of the {} submitted locations match '{}'",
                submitted.len(),
                self.settings.location_pattern
            );
            return Err(TidewalkError::EmptyInput {
                submitted: submitted.len(),
            });
        };

        let plan = CrawlPlan::new(
            accepted,
            PlanOptions {
                max_items: self.settings.max_items,
                skip_offset: self.settings.skip_offset,
                retry_limit: self.settings.retry_limit,
                config_hash: self.settings.config_hash.clone(),
            },
        );
        let total = plan.total();

        self.plans.begin(&plan).await?;
        tracing::info!(
            "Started plan {} with {} of {} submitted locations",
            plan.id,
            total,
            submitted.len()
        );

        self.progress.render(0);
        self.navigator.navigate_to(&first).await?;
        Ok(total)
    }

    /// Takes one crawl step against the page loaded in this lifetime
    ///
    /// Counts an attempt at `locations[cursor]`, runs the extraction adapter
    /// and applies the retry policy. The updated plan and the next navigation
    /// target are persisted in one write before any navigation is requested.
    /// A page loaded for some other location counts as a failed attempt.
    ///
    /// # Arguments
    ///
    /// * `page` - The document the host loaded for this lifetime
    ///
    /// # Returns
    ///
    /// * `Ok(StepOutcome)` - What the step did; `Completed` and `Expired` mean
    ///   the report was handed to the sink and the plan was cleared
    /// * `Err(TidewalkError::Storage)` - A write failed; durable state is as
    ///   the previous lifetime left it and the next lifetime repeats the step
    /// * `Err(TidewalkError::Navigation)` - The step was persisted but the
    ///   navigator failed; the stored target already names the next location
    ///
    /// # Example
    ///
    /// ```no_run
    /// # use tidewalk::crawler::{Orchestrator, StaticPage, StepOutcome};
    /// # async fn example(orchestrator: Orchestrator) -> tidewalk::Result<()> {
    /// let page = StaticPage::loaded("a.html", "<main>...</main>");
    /// match orchestrator.resume_step(&page).await? {
    ///     StepOutcome::Completed(summary) => println!("{}", summary),
    ///     other => println!("{:?}", other),
    /// }
    /// # Ok(())
    /// # }
    /// ```
    pub async fn resume_step(&self, page: &dyn PageSource) -> Result<StepOutcome> {
        let Some(mut plan) = self.plans.load().await? else {
            tracing::debug!("No active plan");
            return Ok(StepOutcome::NotCrawling);
        };

        self.check_config_hash(&plan);

        if plan.is_stale(self.settings.plan_max_age, Utc::now()) {
            return self.expire(plan).await;
        }

        let Some((location, attempt)) = plan.begin_attempt() else {
            return self.complete(plan).await;
        };

        tracing::debug!(
            "Plan {} step {}/{}: {} (attempt {}/{})",
            plan.id,
            plan.cursor + 1,
            plan.total(),
            location,
            attempt,
            plan.retry_limit
        );

        let extracted = if page.location() == location {
            self.adapter.extract(page).await
        } else {
            Err(ExtractionFailure::WrongLocation {
                expected: location.clone(),
                actual: page.location().to_string(),
            })
        };

        let cursor_before = plan.cursor;
        match extracted {
            Ok(fields) => {
                plan.record_success(fields);
                tracing::info!("Extracted record {} from {}", plan.results.len(), location);
            }
            Err(failure) => match plan.record_failure() {
                Some(FailureDisposition::Retry { attempt }) => {
                    tracing::warn!("Attempt {} at {} failed: {}", attempt, location, failure);
                }
                Some(FailureDisposition::Exhausted { attempt }) => {
                    tracing::warn!(
                        "Giving up on {} after {} attempts: {}",
                        location,
                        attempt,
                        failure
                    );
                }
                None => {}
            },
        }

        let next = plan.current_location().map(str::to_string);
        match &next {
            Some(next) => {
                self.plans
                    .checkpoint(&plan, &NavigationTarget::now(next.as_str()))
                    .await?
            }
            None => self.plans.save(&plan).await?,
        }
        self.progress.render(plan.percent_complete());

        let Some(next) = next else {
            return self.complete(plan).await;
        };

        self.navigator.navigate_to(&next).await?;

        if plan.cursor == cursor_before {
            Ok(StepOutcome::Retrying {
                location: next,
                attempt,
            })
        } else {
            Ok(StepOutcome::Advanced {
                next,
                cursor: plan.cursor,
            })
        }
    }

    /// Re-issues the navigation for the current location without taking a step
    ///
    /// Used when a lifetime starts with a plan but no recorded navigation
    /// target.
    pub async fn renavigate(&self) -> Result<StepOutcome> {
        let Some(plan) = self.plans.load().await? else {
            return Ok(StepOutcome::NotCrawling);
        };

        if plan.is_stale(self.settings.plan_max_age, Utc::now()) {
            return self.expire(plan).await;
        }

        let Some(location) = plan.current_location().map(str::to_string) else {
            return self.complete(plan).await;
        };

        tracing::info!("Re-issuing navigation to {}", location);
        self.navigator.navigate_to(&location).await?;
        Ok(StepOutcome::Renavigated { location })
    }

    /// Cancels the active crawl; it finishes with partial results on next resume
    ///
    /// Returns false when no plan is active.
    pub async fn cancel(&self) -> Result<bool> {
        let Some(mut plan) = self.plans.load().await? else {
            return Ok(false);
        };

        plan.cancel();
        self.plans.save(&plan).await?;
        tracing::info!(
            "Cancelled plan {} with {} results",
            plan.id,
            plan.results.len()
        );
        Ok(true)
    }

    /// Progress of the active plan, if any
    pub async fn status(&self) -> Result<Option<PlanProgress>> {
        Ok(self.plans.load().await?.map(|plan| plan.progress()))
    }

    /// Abandons a plan that stopped making progress
    ///
    /// A plan that can no longer be decoded is discarded outright.
    pub async fn sweep_stale(&self) -> Result<Option<ReportSummary>> {
        let plan = match self.plans.load().await {
            Ok(Some(plan)) => plan,
            Ok(None) => return Ok(None),
            Err(StorageError::Serialization(e)) => {
                tracing::warn!("Discarding unreadable plan: {}", e);
                self.plans.discard().await?;
                return Ok(None);
            }
            Err(e) => return Err(e.into()),
        };

        if !plan.is_stale(self.settings.plan_max_age, Utc::now()) {
            return Ok(None);
        }

        match self.expire(plan).await? {
            StepOutcome::Expired(summary) => Ok(Some(summary)),
            _ => Ok(None),
        }
    }

    async fn complete(&self, plan: CrawlPlan) -> Result<StepOutcome> {
        let status = if plan.cancelled {
            CrawlStatus::Cancelled
        } else {
            CrawlStatus::Completed
        };

        let summary = self.finalize(plan, status).await?;
        self.progress.render_complete();
        tracing::info!("Crawl finished: {}", summary);
        Ok(StepOutcome::Completed(summary))
    }

    async fn expire(&self, plan: CrawlPlan) -> Result<StepOutcome> {
        tracing::warn!(
            "Plan {} made no progress since {}; abandoning it",
            plan.id,
            plan.progressed_at.to_rfc3339()
        );

        let summary = self.finalize(plan, CrawlStatus::Abandoned).await?;
        self.progress.dismiss();
        Ok(StepOutcome::Expired(summary))
    }

    /// Hands the report to the sink once, then retires the plan
    async fn finalize(&self, plan: CrawlPlan, status: CrawlStatus) -> Result<ReportSummary> {
        let already_exported = self.plans.export_flag().await?.as_deref() == Some(plan.id.as_str());
        let report = CrawlReport::from_plan(plan, status);
        let summary = report.summary();

        if already_exported {
            tracing::debug!("Report for plan {} was already delivered", summary.plan_id);
        } else {
            self.sink.deliver(report).await?;
            self.plans.mark_exported(&summary.plan_id).await?;
        }

        self.plans.finish(&summary.plan_id).await?;
        Ok(summary)
    }

    fn check_config_hash(&self, plan: &CrawlPlan) {
        if let (Some(planned), Some(current)) = (&plan.config_hash, &self.settings.config_hash) {
            if planned != current {
                tracing::warn!(
                    "Configuration changed since plan {} started; keeping its original limits",
                    plan.id
                );
            }
        }
    }
}
