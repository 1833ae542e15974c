//! Process host
//!
//! The host plays the part of the environment that reloads the process on
//! every navigation. Each lifetime it builds a fresh orchestrator, loads the
//! page named by the persisted navigation target, and runs one resume step.

use crate::config::Config;
use crate::crawler::extractor::SelectorExtractor;
use crate::crawler::navigator::StoreNavigator;
use crate::crawler::orchestrator::{CrawlSettings, Orchestrator, StepOutcome};
use crate::crawler::page::{build_http_client, HttpPage, LoadError, PageSource, StaticPage};
use crate::location::resolve_location;
use crate::output::{CacheSink, JsonFileSink, MultiSink, ResultSink};
use crate::storage::{PlanStore, StateStore, TtlCache};
use crate::Result;
use reqwest::Client;
use std::sync::Arc;
use std::time::Duration;
use url::Url;

/// Per-crawl overrides supplied when starting
#[derive(Debug, Clone, Default)]
pub struct StartOptions {
    pub max_items: Option<usize>,
    pub skip_offset: Option<u64>,
}

pub struct Host {
    config: Config,
    config_hash: Option<String>,
    store: Arc<dyn StateStore>,
    client: Client,
    base_url: Option<Url>,
    extractor: Arc<SelectorExtractor>,
}

impl Host {
    pub fn new(config: Config, config_hash: Option<String>, store: Arc<dyn StateStore>) -> Result<Self> {
        let client = build_http_client(&config.user_agent)?;
        let base_url = config
            .host
            .base_url
            .as_deref()
            .map(Url::parse)
            .transpose()?;
        let extractor = Arc::new(SelectorExtractor::from_config(&config.extraction)?);

        Ok(Self {
            config,
            config_hash,
            store,
            client,
            base_url,
            extractor,
        })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// The supplementary cache, using the configured entry lifetime
    pub fn cache(&self) -> TtlCache {
        TtlCache::new(
            self.store.clone(),
            chrono::Duration::seconds(self.config.storage.cache_max_age_secs as i64),
        )
    }

    /// Builds a fresh orchestrator, as a new process lifetime would
    pub fn orchestrator(&self) -> Orchestrator {
        self.orchestrator_with(CrawlSettings::from_config(
            &self.config.crawl,
            self.config_hash.clone(),
        ))
    }

    fn orchestrator_with(&self, settings: CrawlSettings) -> Orchestrator {
        Orchestrator::new(
            self.store.clone(),
            self.extractor.clone(),
            Arc::new(StoreNavigator::new(PlanStore::new(self.store.clone()))),
            Arc::new(self.sink()),
            settings,
        )
    }

    fn sink(&self) -> MultiSink {
        let mut sinks: Vec<Box<dyn ResultSink>> = Vec::new();
        if let Some(path) = &self.config.output.results_path {
            sinks.push(Box::new(JsonFileSink::new(path)));
        }
        sinks.push(Box::new(CacheSink::new(self.cache())));
        MultiSink::new(sinks)
    }

    /// Starts a crawl, replacing any active plan
    pub async fn start<I, S>(&self, locations: I, options: StartOptions) -> Result<usize>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut settings = CrawlSettings::from_config(&self.config.crawl, self.config_hash.clone());
        if let Some(max_items) = options.max_items {
            settings.max_items = max_items;
        }
        if let Some(skip_offset) = options.skip_offset {
            settings.skip_offset = skip_offset;
        }

        self.orchestrator_with(settings).start_crawl(locations).await
    }

    /// Runs a single process lifetime
    pub async fn run_lifetime(&self) -> Result<StepOutcome> {
        let orchestrator = self.orchestrator();
        let plans = PlanStore::new(self.store.clone());

        let Some(target) = plans.navigation_target().await? else {
            return orchestrator.renavigate().await;
        };

        tracing::debug!("Loading {}", target.location);
        let page = self.page_for(&target.location);
        orchestrator.resume_step(page.as_ref()).await
    }

    /// Runs lifetimes until the crawl ends or `max_lifetimes` is reached
    pub async fn drive(&self, max_lifetimes: Option<usize>) -> Result<StepOutcome> {
        match self.cache().purge_expired().await {
            Ok(0) => {}
            Ok(purged) => tracing::debug!("Purged {} expired cache entries", purged),
            Err(e) => tracing::warn!("Failed to purge cache: {}", e),
        }

        let delay = Duration::from_millis(self.config.host.navigation_delay_ms);
        let mut lifetimes = 0usize;

        loop {
            let outcome = self.run_lifetime().await?;
            lifetimes += 1;

            if outcome.is_terminal() || max_lifetimes.is_some_and(|max| lifetimes >= max) {
                return Ok(outcome);
            }

            tracing::debug!("Lifetime {} ended with {:?}", lifetimes, outcome);
            tokio::time::sleep(delay).await;
        }
    }

    fn page_for(&self, location: &str) -> Box<dyn PageSource> {
        match resolve_location(location, self.base_url.as_ref()) {
            Ok(url) => Box::new(HttpPage::new(self.client.clone(), location, url)),
            Err(e) => Box::new(StaticPage::unavailable(
                location,
                LoadError::InvalidLocation {
                    location: location.to_string(),
                    message: e.to_string(),
                },
            )),
        }
    }
}
