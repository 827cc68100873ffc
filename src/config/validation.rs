use crate::config::types::{
    Config, EnrichmentConfig, HttpConfig, RetryConfig, SchedulerConfig, SourceConfig,
    StorageConfig,
};
use crate::ConfigError;
use url::Url;

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_source_config(&config.source)?;
    validate_http_config(&config.http)?;
    validate_retry_config(&config.retry)?;
    validate_enrichment_config(&config.enrichment)?;
    validate_scheduler_config(&config.scheduler)?;
    validate_storage_config(&config.storage)?;
    Ok(())
}

/// Validates the listing source
fn validate_source_config(config: &SourceConfig) -> Result<(), ConfigError> {
    if !config.listing_url_template.contains("{page}") {
        return Err(ConfigError::Validation(format!(
            "listing_url_template must contain a {{page}} placeholder, got '{}'",
            config.listing_url_template
        )));
    }

    if config.pages.is_empty() {
        return Err(ConfigError::Validation(
            "pages must list at least one page number".to_string(),
        ));
    }

    // Every page URL must parse; checking the first is enough since only the
    // placeholder differs
    let sample = config.listing_url(config.pages[0]);
    let url = Url::parse(&sample)
        .map_err(|e| ConfigError::InvalidUrl(format!("Invalid listing URL '{}': {}", sample, e)))?;

    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(ConfigError::Validation(format!(
            "Listing URL '{}' must use HTTP or HTTPS",
            sample
        )));
    }

    Ok(())
}

/// Validates request headers and timeouts
fn validate_http_config(config: &HttpConfig) -> Result<(), ConfigError> {
    if config.user_agent.trim().is_empty() {
        return Err(ConfigError::Validation(
            "user_agent cannot be empty".to_string(),
        ));
    }

    if config.listing_timeout_secs == 0 || config.detail_timeout_secs == 0 {
        return Err(ConfigError::Validation(format!(
            "timeouts must be >= 1s, got listing={}s detail={}s",
            config.listing_timeout_secs, config.detail_timeout_secs
        )));
    }

    Ok(())
}

/// Validates the retry policy
fn validate_retry_config(config: &RetryConfig) -> Result<(), ConfigError> {
    if config.max_retries < 1 || config.max_retries > 10 {
        return Err(ConfigError::Validation(format!(
            "max_retries must be between 1 and 10, got {}",
            config.max_retries
        )));
    }

    if config.jitter_min_ms > config.jitter_max_ms {
        return Err(ConfigError::Validation(format!(
            "jitter_min_ms ({}) cannot exceed jitter_max_ms ({})",
            config.jitter_min_ms, config.jitter_max_ms
        )));
    }

    Ok(())
}

/// Validates the enrichment fan-out
fn validate_enrichment_config(config: &EnrichmentConfig) -> Result<(), ConfigError> {
    if config.concurrency < 1 || config.concurrency > 100 {
        return Err(ConfigError::Validation(format!(
            "concurrency must be between 1 and 100, got {}",
            config.concurrency
        )));
    }

    if config.min_delay_ms > config.max_delay_ms {
        return Err(ConfigError::Validation(format!(
            "min_delay_ms ({}) cannot exceed max_delay_ms ({})",
            config.min_delay_ms, config.max_delay_ms
        )));
    }

    Ok(())
}

/// Validates scheduler settings
fn validate_scheduler_config(config: &SchedulerConfig) -> Result<(), ConfigError> {
    if config.interval_secs < 1 {
        return Err(ConfigError::Validation(
            "interval_secs must be >= 1".to_string(),
        ));
    }

    Ok(())
}

/// Validates storage settings
fn validate_storage_config(config: &StorageConfig) -> Result<(), ConfigError> {
    if config.database_path.is_empty() {
        return Err(ConfigError::Validation(
            "database_path cannot be empty".to_string(),
        ));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn source(template: &str, pages: Vec<u32>) -> SourceConfig {
        SourceConfig {
            listing_url_template: template.to_string(),
            pages,
            detail_suffix: String::new(),
            page_delay_ms: 0,
        }
    }

    #[test]
    fn test_validate_source_config() {
        assert!(validate_source_config(&source("https://example.kz/?page={page}", vec![1])).is_ok());

        // Missing placeholder
        assert!(validate_source_config(&source("https://example.kz/", vec![1])).is_err());
        // No pages
        assert!(validate_source_config(&source("https://example.kz/?page={page}", vec![])).is_err());
        // Not a URL
        assert!(matches!(
            validate_source_config(&source("not a url {page}", vec![1])),
            Err(ConfigError::InvalidUrl(_))
        ));
        // Wrong scheme
        assert!(validate_source_config(&source("ftp://example.kz/{page}", vec![1])).is_err());
    }

    #[test]
    fn test_validate_retry_config() {
        assert!(validate_retry_config(&RetryConfig::default()).is_ok());

        let zero = RetryConfig {
            max_retries: 0,
            ..RetryConfig::default()
        };
        assert!(validate_retry_config(&zero).is_err());

        let inverted = RetryConfig {
            jitter_min_ms: 900,
            jitter_max_ms: 100,
            ..RetryConfig::default()
        };
        assert!(validate_retry_config(&inverted).is_err());
    }

    #[test]
    fn test_validate_enrichment_config() {
        assert!(validate_enrichment_config(&EnrichmentConfig::default()).is_ok());

        let too_wide = EnrichmentConfig {
            concurrency: 101,
            ..EnrichmentConfig::default()
        };
        assert!(validate_enrichment_config(&too_wide).is_err());

        let inverted = EnrichmentConfig {
            min_delay_ms: 300,
            max_delay_ms: 200,
            ..EnrichmentConfig::default()
        };
        assert!(validate_enrichment_config(&inverted).is_err());
    }

    #[test]
    fn test_validate_http_config() {
        assert!(validate_http_config(&HttpConfig::default()).is_ok());

        let no_timeout = HttpConfig {
            detail_timeout_secs: 0,
            ..HttpConfig::default()
        };
        assert!(validate_http_config(&no_timeout).is_err());
    }
}
