//! The persisted crawl plan
//!
//! A `CrawlPlan` is the whole continuation of a crawl. It is read once at the
//! start of every process lifetime, mutated in memory for a single step, and
//! written back before the next navigation.

use crate::state::record::{ExtractedRecord, RecordFields};
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::{BTreeMap, BTreeSet};

/// Caller-supplied settings fixed at plan creation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlanOptions {
    pub max_items: usize,
    pub skip_offset: u64,
    pub retry_limit: u32,
    pub config_hash: Option<String>,
}

impl Default for PlanOptions {
    fn default() -> Self {
        Self {
            max_items: 100,
            skip_offset: 0,
            retry_limit: 2,
            config_hash: None,
        }
    }
}

/// What happened to a location after a failed extraction attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureDisposition {
    /// The location stays at the cursor and will be visited again
    Retry { attempt: u32 },
    /// The retry budget is spent; the location was recorded and skipped
    Exhausted { attempt: u32 },
}

/// The durable aggregate describing one in-progress crawl
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CrawlPlan {
    pub id: String,

    /// Target locations, fixed at creation and never reordered
    pub locations: Vec<String>,

    /// Index of the next location to process
    pub cursor: usize,

    /// Successful records, in location order
    pub results: Vec<ExtractedRecord>,

    /// Locations that spent their retry budget
    pub failed_locations: BTreeSet<String>,

    /// Attempts made per location
    pub attempts: BTreeMap<String, u32>,

    pub created_at: DateTime<Utc>,

    /// Last time the cursor moved forward
    pub progressed_at: DateTime<Utc>,

    pub max_items: usize,
    pub skip_offset: u64,
    pub retry_limit: u32,

    #[serde(default)]
    pub config_hash: Option<String>,

    #[serde(default)]
    pub cancelled: bool,
}

impl CrawlPlan {
    /// Creates a fresh plan with the cursor at the first location
    ///
    /// The caller is responsible for filtering and truncating `locations`.
    pub fn new(locations: Vec<String>, options: PlanOptions) -> Self {
        let now = Utc::now();
        Self {
            id: plan_id(&locations, now),
            locations,
            cursor: 0,
            results: Vec::new(),
            failed_locations: BTreeSet::new(),
            attempts: BTreeMap::new(),
            created_at: now,
            progressed_at: now,
            max_items: options.max_items,
            skip_offset: options.skip_offset,
            retry_limit: options.retry_limit.max(1),
            config_hash: options.config_hash,
            cancelled: false,
        }
    }

    /// Total number of locations in the plan
    pub fn total(&self) -> usize {
        self.locations.len()
    }

    /// Location under the cursor, if any remain
    pub fn current_location(&self) -> Option<&str> {
        self.locations.get(self.cursor).map(String::as_str)
    }

    /// Returns true once every location has been processed
    pub fn is_finished(&self) -> bool {
        self.cursor >= self.locations.len()
    }

    /// Progress as a whole percentage: `round(cursor / total * 100)`
    pub fn percent_complete(&self) -> u8 {
        if self.locations.is_empty() {
            return 100;
        }
        let ratio = self.cursor.min(self.locations.len()) as f64 / self.locations.len() as f64;
        (ratio * 100.0).round() as u8
    }

    /// Externally visible 1-based item number for a location index
    pub fn item_number(&self, index: usize) -> u64 {
        self.skip_offset + index as u64 + 1
    }

    /// Attempts made so far at `location`
    pub fn attempts_for(&self, location: &str) -> u32 {
        self.attempts.get(location).copied().unwrap_or(0)
    }

    /// Counts a new attempt at the current location
    ///
    /// Returns the location and its attempt number, or `None` when the plan
    /// is already finished.
    pub fn begin_attempt(&mut self) -> Option<(String, u32)> {
        let location = self.current_location()?.to_string();
        let count = self.attempts.entry(location.clone()).or_insert(0);
        *count += 1;
        Some((location, *count))
    }

    /// Appends the record for the current location and advances the cursor
    pub fn record_success(&mut self, fields: RecordFields) {
        let Some(location) = self.current_location().map(str::to_string) else {
            return;
        };

        self.results.push(ExtractedRecord {
            item_number: self.item_number(self.cursor),
            location,
            fields,
            extracted_at: Utc::now(),
        });
        self.advance();
    }

    /// Applies the retry policy to a failed attempt at the current location
    ///
    /// # Returns
    ///
    /// `Retry` while the attempt count is below `retry_limit`. Otherwise the
    /// location goes to `failed_locations`, the cursor advances and the result
    /// is `Exhausted`. `None` if the plan is already finished.
    pub fn record_failure(&mut self) -> Option<FailureDisposition> {
        let location = self.current_location()?.to_string();
        let attempt = self.attempts_for(&location);

        if attempt < self.retry_limit {
            return Some(FailureDisposition::Retry { attempt });
        }

        self.failed_locations.insert(location);
        self.advance();
        Some(FailureDisposition::Exhausted { attempt })
    }

    /// Forces completion on the next resume without discarding results
    pub fn cancel(&mut self) {
        self.cursor = self.locations.len();
        self.cancelled = true;
    }

    /// Returns true if the plan has made no forward progress within `max_age`
    pub fn is_stale(&self, max_age: Duration, now: DateTime<Utc>) -> bool {
        !self.is_finished() && now - self.progressed_at > max_age
    }

    /// Failed locations in their original order
    pub fn failed_in_order(&self) -> Vec<String> {
        self.locations
            .iter()
            .filter(|loc| self.failed_locations.contains(*loc))
            .cloned()
            .collect()
    }

    /// A read-only progress snapshot
    pub fn progress(&self) -> PlanProgress {
        PlanProgress {
            plan_id: self.id.clone(),
            cursor: self.cursor,
            total: self.locations.len(),
            succeeded: self.results.len(),
            failed: self.failed_locations.len(),
            percent: self.percent_complete(),
            current_location: self.current_location().map(str::to_string),
            created_at: self.created_at,
            cancelled: self.cancelled,
        }
    }

    fn advance(&mut self) {
        if self.cursor < self.locations.len() {
            self.cursor += 1;
        }
        self.progressed_at = Utc::now();
    }
}

/// Snapshot of plan progress for status displays
#[derive(Debug, Clone, PartialEq)]
pub struct PlanProgress {
    pub plan_id: String,
    pub cursor: usize,
    pub total: usize,
    pub succeeded: usize,
    pub failed: usize,
    pub percent: u8,
    pub current_location: Option<String>,
    pub created_at: DateTime<Utc>,
    pub cancelled: bool,
}

fn plan_id(locations: &[String], created_at: DateTime<Utc>) -> String {
    let mut hasher = Sha256::new();
    hasher.update(created_at.to_rfc3339().as_bytes());
    for location in locations {
        hasher.update(location.as_bytes());
        hasher.update(b"\n");
    }
    let digest = hex::encode(hasher.finalize());
    digest[..16].to_string()
}
