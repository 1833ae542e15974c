//! Tidewalk: a crawl engine that survives the restart behind every navigation
//!
//! This crate visits a bounded list of locations one at a time, extracting one
//! record per location. Every navigation ends the current process lifetime, so
//! all crawl progress lives in a durable key/value store and each new lifetime
//! resumes from the last checkpoint.

pub mod config;
pub mod crawler;
pub mod location;
pub mod output;
pub mod state;
pub mod storage;

use thiserror::Error;

/// Main error type for Tidewalk operations
#[derive(Debug, Error)]
pub enum TidewalkError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("No valid locations to crawl ({submitted} submitted)")]
    EmptyInput { submitted: usize },

    #[error("Storage error: {0}")]
    Storage(#[from] storage::StorageError),

    #[error("Navigation to {location} failed: {message}")]
    Navigation { location: String, message: String },

    #[error("Result sink error: {0}")]
    Sink(#[from] output::SinkError),

    #[error("HTTP client error: {0}")]
    Reqwest(#[from] reqwest::Error),

    #[error("URL parse error: {0}")]
    UrlParse(#[from] ::url::ParseError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid URL in config: {0}")]
    InvalidUrl(String),

    #[error("Invalid pattern: {0}")]
    InvalidPattern(String),
}

/// Result type alias for Tidewalk operations
pub type Result<T> = std::result::Result<T, TidewalkError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

// Re-export commonly used types
pub use config::Config;
pub use crawler::{Orchestrator, StepOutcome};
pub use state::{CrawlPlan, ExtractedRecord, FieldValue};
pub use storage::{MemoryStore, SqliteStore, StateStore};
