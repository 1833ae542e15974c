//! Crawler module for step-per-lifetime crawling
//!
//! This module contains the core crawling logic, including:
//! - Page sources that may still be loading when a lifetime starts
//! - Selector-driven extraction with a bounded readiness wait
//! - The orchestrator that persists progress before each navigation
//! - The host that runs lifetimes back to back

mod adapter;
mod backoff;
mod extractor;
mod host;
mod navigator;
mod orchestrator;
mod page;
mod progress;

pub use adapter::{ExtractionAdapter, ExtractionFailure};
pub use backoff::ExponentialBackoff;
pub use extractor::SelectorExtractor;
pub use host::{Host, StartOptions};
pub use navigator::{Navigator, StoreNavigator};
pub use orchestrator::{CrawlSettings, Orchestrator, StepOutcome};
pub use page::{build_http_client, HttpPage, LoadError, PageSource, StaticPage};
pub use progress::{LogProgress, NoProgress, ProgressReporter};
