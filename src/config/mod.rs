//! Configuration module for Tidewalk
//!
//! This module handles loading, parsing, and validating TOML configuration files.
//!
//! # Example
//!
//! ```no_run
//! use tidewalk::config::load_config;
//! use std::path::Path;
//!
//! let config = load_config(Path::new("tidewalk.toml")).unwrap();
//! println!("Retry limit: {}", config.crawl.retry_limit);
//! ```

mod parser;
mod types;
mod validation;

// Re-export types
pub use types::{
    Config, CrawlConfig, ExtractionConfig, FieldRule, HostConfig, OutputConfig, StorageConfig,
    UserAgentConfig,
};

// Re-export parser functions
pub use parser::{compute_config_hash, load_config, load_config_with_hash, parse_config};
