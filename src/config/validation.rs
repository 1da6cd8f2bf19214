use crate::config::types::{Config, CrawlerConfig, SitemapConfig, UserAgentConfig};
use crate::{ConfigError, ConfigResult};

/// Validates the entire configuration
pub fn validate(config: &Config) -> ConfigResult<()> {
    validate_crawler_config(&config.crawler)?;
    validate_user_agent_config(&config.user_agent)?;
    validate_sitemap_config(&config.sitemap)?;
    Ok(())
}

/// Validates crawler configuration
fn validate_crawler_config(config: &CrawlerConfig) -> ConfigResult<()> {
    if config.concurrency < 1 || config.concurrency > 100 {
        return Err(ConfigError::Validation(format!(
            "concurrency must be between 1 and 100, got {}",
            config.concurrency
        )));
    }

    if config.timeout_ms < 100 || config.timeout_ms > 120_000 {
        return Err(ConfigError::Validation(format!(
            "timeout_ms must be between 100 and 120000, got {}ms",
            config.timeout_ms
        )));
    }

    if config.max_hops < 1 || config.max_hops > 50 {
        return Err(ConfigError::Validation(format!(
            "max_hops must be between 1 and 50, got {}",
            config.max_hops
        )));
    }

    if config.max_retries_per_hop > 10 {
        return Err(ConfigError::Validation(format!(
            "max_retries_per_hop must be <= 10, got {}",
            config.max_retries_per_hop
        )));
    }

    Ok(())
}

/// Validates user agent configuration
fn validate_user_agent_config(config: &UserAgentConfig) -> ConfigResult<()> {
    // Validate crawler name: non-empty, alphanumeric + hyphens only
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

    if config.crawler_version.is_empty() || config.crawler_version.contains(char::is_whitespace) {
        return Err(ConfigError::Validation(format!(
            "crawler_version must be a non-empty token, got '{}'",
            config.crawler_version
        )));
    }

    Ok(())
}

/// Validates sitemap discovery configuration
fn validate_sitemap_config(config: &SitemapConfig) -> ConfigResult<()> {
    if config.max_depth < 1 || config.max_depth > 32 {
        return Err(ConfigError::Validation(format!(
            "sitemap max_depth must be between 1 and 32, got {}",
            config.max_depth
        )));
    }

    for path in &config.fallback_paths {
        if !path.starts_with('/') {
            return Err(ConfigError::Validation(format!(
                "fallback path '{}' must start with '/'",
                path
            )));
        }
    }

    Ok(())
}
