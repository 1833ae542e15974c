//! State module for tracking crawl progress
//!
//! # Components
//!
//! - `CrawlPlan`: the single persisted aggregate for the active crawl
//! - `ExtractedRecord`: one record per successfully visited location
//! - `FieldValue`: typed values coerced from raw page text

mod plan;
mod record;

pub use plan::{CrawlPlan, FailureDisposition, PlanOptions, PlanProgress};
pub use record::{ExtractedRecord, FieldValue, RecordFields};
