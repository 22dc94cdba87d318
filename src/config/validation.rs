use crate::config::types::{Config, CrawlerConfig, HeuristicsConfig, OutputConfig, UserAgentConfig};
use crate::ConfigError;
use url::Url;

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_crawler_config(&config.crawler)?;
    validate_user_agent_config(&config.user_agent)?;
    validate_output_config(&config.output)?;
    validate_heuristics_config(&config.heuristics)?;
    Ok(())
}

/// Validates crawler configuration
fn validate_crawler_config(config: &CrawlerConfig) -> Result<(), ConfigError> {
    let url = Url::parse(&config.start_url)
        .map_err(|e| ConfigError::InvalidUrl(format!("Invalid start-url: {}", e)))?;

    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(ConfigError::Validation(format!(
            "start-url must use http or https, got '{}'",
            config.start_url
        )));
    }

    validate_seconds("delay", config.delay, true)?;
    validate_seconds("timeout", config.timeout, false)?;
    validate_seconds("backoff-base", config.backoff_base, true)?;
    validate_seconds("backoff-max", config.backoff_max, true)?;

    if config.max_attempts < 1 || config.max_attempts > 10 {
        return Err(ConfigError::Validation(format!(
            "max-attempts must be between 1 and 10, got {}",
            config.max_attempts
        )));
    }

    if config.backoff_max < config.backoff_base {
        return Err(ConfigError::Validation(format!(
            "backoff-max ({}s) must not be smaller than backoff-base ({}s)",
            config.backoff_max, config.backoff_base
        )));
    }

    Ok(())
}

/// Checks that a seconds value is finite and in range for `Duration::from_secs_f64`
fn validate_seconds(name: &str, value: f64, allow_zero: bool) -> Result<(), ConfigError> {
    if !value.is_finite() || value < 0.0 || value > 86_400.0 {
        return Err(ConfigError::Validation(format!(
            "{} must be between 0 and 86400 seconds, got {}",
            name, value
        )));
    }

    if !allow_zero && value == 0.0 {
        return Err(ConfigError::Validation(format!(
            "{} must be greater than zero",
            name
        )));
    }

    Ok(())
}

/// Validates user agent configuration
fn validate_user_agent_config(config: &UserAgentConfig) -> Result<(), ConfigError> {
    // Validate crawler name: non-empty, alphanumeric + hyphens only
    if config.crawler_name.is_empty() {
        return Err(ConfigError::Validation(
            "crawler-name cannot be empty".to_string(),
        ));
    }

    if !config
        .crawler_name
        .chars()
        .all(|c| c.is_alphanumeric() || c == '-')
    {
        return Err(ConfigError::Validation(format!(
            "crawler-name must contain only alphanumeric characters and hyphens, got '{}'",
            config.crawler_name
        )));
    }

    Url::parse(&config.contact_url)
        .map_err(|e| ConfigError::InvalidUrl(format!("Invalid contact-url: {}", e)))?;

    Ok(())
}

/// Validates output configuration
fn validate_output_config(config: &OutputConfig) -> Result<(), ConfigError> {
    if config.directory.as_os_str().is_empty() {
        return Err(ConfigError::Validation(
            "output directory cannot be empty".to_string(),
        ));
    }

    if config.state_file.is_empty()
        || config.state_file.contains('/')
        || config.state_file.contains('\\')
    {
        return Err(ConfigError::Validation(format!(
            "state-file must be a plain file name, got '{}'",
            config.state_file
        )));
    }

    Ok(())
}

fn validate_heuristics_config(config: &HeuristicsConfig) -> Result<(), ConfigError> {
    if config.next_link_texts.iter().any(|t| t.trim().is_empty()) {
        return Err(ConfigError::Validation(
            "next-link-texts cannot contain empty entries".to_string(),
        ));
    }

    if config.detail_link_texts.iter().any(|t| t.trim().is_empty()) {
        return Err(ConfigError::Validation(
            "detail-link-texts cannot contain empty entries".to_string(),
        ));
    }

    Ok(())
}
