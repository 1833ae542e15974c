//! Well-known storage keys
//!
//! Crawl state lives under one versioned namespace. Cache entries use a
//! separate namespace so a cache purge can never touch a plan.

/// Prefix for all crawl plan keys
pub const CRAWL_NAMESPACE: &str = "tidewalk:crawl:v1:";

/// The single active crawl plan
pub const PLAN_KEY: &str = "tidewalk:crawl:v1:plan";

/// Id of the plan whose report has already been handed to the result sink
pub const EXPORT_FLAG_KEY: &str = "tidewalk:crawl:v1:export_triggered";

/// Location the next process lifetime should load
pub const NAVIGATION_KEY: &str = "tidewalk:crawl:v1:navigation";

/// One-shot keys cleared in the same write that starts a new plan
pub const PLAN_FLAG_KEYS: &[&str] = &[EXPORT_FLAG_KEY, NAVIGATION_KEY];

/// Prefix for TTL cache entries
pub const CACHE_NAMESPACE: &str = "tidewalk:cache:v1:";

/// Cache entry holding the most recent crawl report
pub const LAST_REPORT_ENTRY: &str = "last_report";
