use crate::config::types::{Config, CrawlerConfig, TransformConfig, UserAgentConfig};
use crate::{parse_seed_url, ConfigError};
use url::Url;

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_crawler_config(&config.crawler)?;
    validate_seed_urls(&config.crawler.seed_urls)?;
    validate_user_agent_config(&config.user_agent)?;
    validate_transform_config(&config.transform)?;
    Ok(())
}

/// Validates fetch limits and paths
fn validate_crawler_config(config: &CrawlerConfig) -> Result<(), ConfigError> {
    if config.max_concurrent_fetches < 1 || config.max_concurrent_fetches > 100 {
        return Err(ConfigError::Validation(format!(
            "max_concurrent_fetches must be between 1 and 100, got {}",
            config.max_concurrent_fetches
        )));
    }

    if config.request_timeout_secs < 1 || config.request_timeout_secs > 600 {
        return Err(ConfigError::Validation(format!(
            "request_timeout_secs must be between 1 and 600, got {}",
            config.request_timeout_secs
        )));
    }

    if config.output_dir.as_os_str().is_empty() {
        return Err(ConfigError::Validation(
            "output_dir cannot be empty".to_string(),
        ));
    }

    if config.metadata_path.as_os_str().is_empty() {
        return Err(ConfigError::Validation(
            "metadata_path cannot be empty".to_string(),
        ));
    }

    Ok(())
}

/// Validates that every seed is an absolute http(s) URL
fn validate_seed_urls(seeds: &[String]) -> Result<(), ConfigError> {
    for seed in seeds {
        parse_seed_url(seed)
            .map_err(|e| ConfigError::InvalidUrl(format!("Invalid seed URL '{}': {}", seed, e)))?;
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

    if let Some(contact) = &config.contact_url {
        Url::parse(contact)
            .map_err(|e| ConfigError::InvalidUrl(format!("Invalid contact_url: {}", e)))?;
    }

    Ok(())
}

fn validate_transform_config(config: &TransformConfig) -> Result<(), ConfigError> {
    if config.enabled && config.text_dir.as_os_str().is_empty() {
        return Err(ConfigError::Validation(
            "text_dir cannot be empty when the transform is enabled".to_string(),
        ));
    }
    Ok(())
}
