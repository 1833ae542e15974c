use crate::config::types::Config;
use crate::config::validation::validate;
use crate::ConfigError;
use sha2::{Digest, Sha256};
use std::path::Path;

/// Loads and parses a configuration file from the given path
///
/// # Arguments
///
/// * `path` - Path to the TOML configuration file
///
/// # Returns
///
/// * `Ok(Config)` - Successfully loaded and validated configuration
/// * `Err(ConfigError)` - Failed to load, parse, or validate the configuration
pub fn load_config(path: &Path) -> Result<Config, ConfigError> {
    let content = std::fs::read_to_string(path)?;
    parse_config(&content)
}

/// Parses and validates configuration text
pub fn parse_config(content: &str) -> Result<Config, ConfigError> {
    let config: Config = toml::from_str(content)?;
    validate(&config)?;
    Ok(config)
}

/// Computes a SHA-256 hash of the configuration file content
///
/// New crawl plans are stamped with this hash so a resumed lifetime can tell
/// whether the configuration changed underneath it.
pub fn compute_config_hash(path: &Path) -> Result<String, ConfigError> {
    let content = std::fs::read_to_string(path)?;
    let mut hasher = Sha256::new();
    hasher.update(content.as_bytes());
    Ok(hex::encode(hasher.finalize()))
}

/// Loads a configuration and returns both the config and its hash
pub fn load_config_with_hash(path: &Path) -> Result<(Config, String), ConfigError> {
    let config = load_config(path)?;
    let hash = compute_config_hash(path)?;
    Ok((config, hash))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    const MINIMAL: &str = r#"
[storage]
database-path = "./tidewalk.db"

[extraction]
ready-selector = "h1"

[user-agent]
crawler-name = "TestWalker"
crawler-version = "1.0"
contact-url = "https://example.com/about"
contact-email = "admin@example.com"
"#;

    fn create_temp_config(content: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file.flush().unwrap();
        file
    }

    #[test]
    fn test_minimal_config_uses_defaults() {
        let config = parse_config(MINIMAL).unwrap();

        assert_eq!(config.crawl.max_items, 100);
        assert_eq!(config.crawl.retry_limit, 2);
        assert_eq!(config.crawl.skip_offset, 0);
        assert_eq!(config.crawl.location_pattern, "*");
        assert_eq!(config.storage.cache_max_age_secs, 300);
        assert_eq!(config.extraction.ready_timeout_ms, 10_000);
        assert_eq!(config.host.navigation_delay_ms, 1500);
        assert!(config.output.results_path.is_none());
        assert!(config.extraction.fields.is_empty());
    }

    #[test]
    fn test_load_full_config() {
        let content = r#"
[crawl]
max-items = 20
retry-limit = 3
skip-offset = 40
location-pattern = "*.html"

[storage]
database-path = "./crawl.db"
cache-max-age-secs = 60

[extraction]
ready-selector = ".product"
ready-timeout-ms = 5000
poll-interval-ms = 100

[[extraction.fields]]
name = "name"
selector = ".product h1"

[[extraction.fields]]
name = "image"
selector = ".product img"
attribute = "src"

[user-agent]
crawler-name = "TestWalker"
crawler-version = "1.0"
contact-url = "https://example.com/about"
contact-email = "admin@example.com"

[host]
base-url = "https://shop.example.com/"
navigation-delay-ms = 0

[output]
results-path = "./results.json"
"#;

        let file = create_temp_config(content);
        let config = load_config(file.path()).unwrap();

        assert_eq!(config.crawl.max_items, 20);
        assert_eq!(config.crawl.skip_offset, 40);
        assert_eq!(config.extraction.fields.len(), 2);
        assert_eq!(
            config.extraction.fields[1].attribute.as_deref(),
            Some("src")
        );
        assert_eq!(
            config.host.base_url.as_deref(),
            Some("https://shop.example.com/")
        );
        assert_eq!(config.output.results_path.as_deref(), Some("./results.json"));
    }

    #[test]
    fn test_load_config_with_invalid_path() {
        let result = load_config(Path::new("/nonexistent/tidewalk.toml"));
        assert!(matches!(result, Err(ConfigError::Io(_))));
    }

    #[test]
    fn test_load_config_with_invalid_toml() {
        let result = parse_config("this is not valid TOML {{{");
        assert!(matches!(result, Err(ConfigError::Parse(_))));
    }

    #[test]
    fn test_zero_retry_limit_rejected() {
        let content = format!("[crawl]\nretry-limit = 0\n{}", MINIMAL);
        let result = parse_config(&content);
        assert!(matches!(result, Err(ConfigError::Validation(_))));
    }

    #[test]
    fn test_compute_config_hash() {
        let file = create_temp_config("test content");

        let hash1 = compute_config_hash(file.path()).unwrap();
        let hash2 = compute_config_hash(file.path()).unwrap();

        assert_eq!(hash1, hash2);
        assert_eq!(hash1.len(), 64);
    }

    #[test]
    fn test_different_content_different_hash() {
        let file1 = create_temp_config("content 1");
        let file2 = create_temp_config("content 2");

        let hash1 = compute_config_hash(file1.path()).unwrap();
        let hash2 = compute_config_hash(file2.path()).unwrap();

        assert_ne!(hash1, hash2);
    }
}
