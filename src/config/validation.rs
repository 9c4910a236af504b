use crate::config::types::{Config, CrawlConfig, RendererConfig, RetryConfig};
use crate::ConfigError;
use std::time::Duration;

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_crawl_config(&config.crawler)?;
    validate_renderer_config(&config.renderer)?;
    Ok(())
}

/// Validates crawl parameters
pub fn validate_crawl_config(config: &CrawlConfig) -> Result<(), ConfigError> {
    // max_depth >= 0 is always true for u32, so no check needed

    if config.max_pages < 1 {
        return Err(ConfigError::Validation(format!(
            "max_pages must be >= 1, got {}",
            config.max_pages
        )));
    }

    if config.workers < 1 || config.workers > 100 {
        return Err(ConfigError::Validation(format!(
            "workers must be between 1 and 100, got {}",
            config.workers
        )));
    }

    if config.page_timeout.is_zero() {
        return Err(ConfigError::Validation(
            "page_timeout must be greater than zero".to_string(),
        ));
    }

    if !config.rate_limit.is_finite() || config.rate_limit < 0.0 {
        return Err(ConfigError::Validation(format!(
            "rate_limit must be a finite number >= 0, got {}",
            config.rate_limit
        )));
    }

    if config.rate_limit > 0.0 && Duration::try_from_secs_f64(1.0 / config.rate_limit).is_err() {
        return Err(ConfigError::Validation(format!(
            "rate_limit {} is too small to pace requests",
            config.rate_limit
        )));
    }

    for domain in &config.allowed_domains {
        if domain.trim().is_empty() {
            return Err(ConfigError::Validation(
                "allowed_domains cannot contain empty entries".to_string(),
            ));
        }
    }

    validate_retry_config(&config.retry)?;

    Ok(())
}

/// Validates the backoff policy
fn validate_retry_config(config: &RetryConfig) -> Result<(), ConfigError> {
    if !config.backoff_multiplier.is_finite() || config.backoff_multiplier < 1.0 {
        return Err(ConfigError::Validation(format!(
            "backoff_multiplier must be >= 1.0, got {}",
            config.backoff_multiplier
        )));
    }

    if config.initial_delay > config.max_delay {
        return Err(ConfigError::Validation(format!(
            "initial_delay ({:?}) cannot exceed max_delay ({:?})",
            config.initial_delay, config.max_delay
        )));
    }

    Ok(())
}

/// Validates renderer settings
fn validate_renderer_config(config: &RendererConfig) -> Result<(), ConfigError> {
    if config.user_agent.trim().is_empty() {
        return Err(ConfigError::Validation(
            "user_agent cannot be empty".to_string(),
        ));
    }

    if let Some(path) = &config.browser_path {
        if path.as_os_str().is_empty() {
            return Err(ConfigError::Validation(
                "browser_path cannot be empty".to_string(),
            ));
        }
    }

    Ok(())
}
