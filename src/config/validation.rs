use crate::config::types::{
    Config, CrawlConfig, ExtractionConfig, HostConfig, OutputConfig, StorageConfig,
    UserAgentConfig,
};
use crate::ConfigError;
use scraper::Selector;
use std::collections::HashSet;
use url::Url;

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_crawl_config(&config.crawl)?;
    validate_storage_config(&config.storage)?;
    validate_extraction_config(&config.extraction)?;
    validate_user_agent_config(&config.user_agent)?;
    validate_host_config(&config.host)?;
    validate_output_config(&config.output)?;
    Ok(())
}

/// Validates crawl limits
fn validate_crawl_config(config: &CrawlConfig) -> Result<(), ConfigError> {
    if config.max_items < 1 {
        return Err(ConfigError::Validation(
            "max_items must be >= 1, got 0".to_string(),
        ));
    }

    if config.retry_limit < 1 {
        return Err(ConfigError::Validation(format!(
            "retry_limit must be >= 1, got {}",
            config.retry_limit
        )));
    }

    if config.location_pattern.trim().is_empty() {
        return Err(ConfigError::InvalidPattern(
            "location_pattern cannot be empty".to_string(),
        ));
    }

    if config.plan_max_age_secs < 60 {
        return Err(ConfigError::Validation(format!(
            "plan_max_age_secs must be >= 60, got {}",
            config.plan_max_age_secs
        )));
    }

    Ok(())
}

fn validate_storage_config(config: &StorageConfig) -> Result<(), ConfigError> {
    if config.database_path.is_empty() {
        return Err(ConfigError::Validation(
            "database_path cannot be empty".to_string(),
        ));
    }

    Ok(())
}

/// Validates selectors and polling bounds
fn validate_extraction_config(config: &ExtractionConfig) -> Result<(), ConfigError> {
    validate_selector(&config.ready_selector)?;

    if config.poll_interval_ms < 10 {
        return Err(ConfigError::Validation(format!(
            "poll_interval_ms must be >= 10ms, got {}ms",
            config.poll_interval_ms
        )));
    }

    if config.ready_timeout_ms < config.poll_interval_ms {
        return Err(ConfigError::Validation(format!(
            "ready_timeout_ms ({}ms) must be >= poll_interval_ms ({}ms)",
            config.ready_timeout_ms, config.poll_interval_ms
        )));
    }

    let mut seen = HashSet::new();
    for field in &config.fields {
        if field.name.trim().is_empty() {
            return Err(ConfigError::Validation(
                "extraction field name cannot be empty".to_string(),
            ));
        }

        if !seen.insert(field.name.as_str()) {
            return Err(ConfigError::Validation(format!(
                "duplicate extraction field '{}'",
                field.name
            )));
        }

        validate_selector(&field.selector)?;

        if let Some(attribute) = &field.attribute {
            if attribute.trim().is_empty() {
                return Err(ConfigError::Validation(format!(
                    "attribute for field '{}' cannot be empty",
                    field.name
                )));
            }
        }
    }

    Ok(())
}

/// Validates user agent configuration
fn validate_user_agent_config(config: &UserAgentConfig) -> Result<(), ConfigError> {
    if config.crawler_name.is_empty() {
        return Err(ConfigError::Validation(
            "crawler_name cannot be empty".to_string(),
        ));
    }

    if !config
        .crawler_name
        .chars()
        .all(|c| c.is_alphanumeric() || c == '-')
    {
        return Err(ConfigError::Validation(format!(
            "crawler_name must contain only alphanumeric characters and hyphens, got '{}'",
            config.crawler_name
        )));
    }

    Url::parse(&config.contact_url)
        .map_err(|e| ConfigError::InvalidUrl(format!("Invalid contact_url: {}", e)))?;

    validate_email(&config.contact_email)?;

    Ok(())
}

fn validate_host_config(config: &HostConfig) -> Result<(), ConfigError> {
    if let Some(base) = &config.base_url {
        let url = Url::parse(base)
            .map_err(|e| ConfigError::InvalidUrl(format!("Invalid base_url '{}': {}", base, e)))?;

        if url.scheme() != "http" && url.scheme() != "https" {
            return Err(ConfigError::InvalidUrl(format!(
                "base_url '{}' must use http or https",
                base
            )));
        }
    }

    Ok(())
}

fn validate_output_config(config: &OutputConfig) -> Result<(), ConfigError> {
    if let Some(path) = &config.results_path {
        if path.is_empty() {
            return Err(ConfigError::Validation(
                "results_path cannot be empty when set".to_string(),
            ));
        }
    }

    Ok(())
}

fn validate_selector(selector: &str) -> Result<(), ConfigError> {
    Selector::parse(selector)
        .map(|_| ())
        .map_err(|e| ConfigError::InvalidPattern(format!("Invalid selector '{}': {:?}", selector, e)))
}

/// Basic email validation
fn validate_email(email: &str) -> Result<(), ConfigError> {
    if email.is_empty() {
        return Err(ConfigError::Validation(
            "contact_email cannot be empty".to_string(),
        ));
    }

    let parts: Vec<&str> = email.split('@').collect();
    if parts.len() != 2 || parts[0].is_empty() || parts[1].is_empty() {
        return Err(ConfigError::Validation(format!(
            "Invalid email format: '{}'",
            email
        )));
    }

    if !parts[1].contains('.') {
        return Err(ConfigError::Validation(format!(
            "Invalid email domain: '{}'",
            email
        )));
    }

    Ok(())
}
