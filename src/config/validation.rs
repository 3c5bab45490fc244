use crate::config::types::{Config, FetchConfig, JobsConfig, ServerConfig};
use crate::ConfigError;
use url::Url;

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_server_config(&config.server)?;
    validate_fetch_config(&config.fetch)?;
    validate_jobs_config(&config.jobs)?;
    Ok(())
}

/// Validates the HTTP listener configuration
fn validate_server_config(config: &ServerConfig) -> Result<(), ConfigError> {
    config.socket_addr().map_err(|e| {
        ConfigError::Validation(format!(
            "bind_address '{}' is not a socket address: {}",
            config.bind_address, e
        ))
    })?;

    for origin in &config.allowed_origins {
        Url::parse(origin)
            .map_err(|e| ConfigError::InvalidUrl(format!("Invalid origin '{}': {}", origin, e)))?;
    }

    Ok(())
}

/// Validates outbound fetch configuration
fn validate_fetch_config(config: &FetchConfig) -> Result<(), ConfigError> {
    if config.user_agent.trim().is_empty() {
        return Err(ConfigError::Validation(
            "user_agent cannot be empty".to_string(),
        ));
    }

    for (name, value) in [
        ("page_timeout_secs", config.page_timeout_secs),
        ("asset_timeout_secs", config.asset_timeout_secs),
        ("connect_timeout_secs", config.connect_timeout_secs),
    ] {
        if value < 1 {
            return Err(ConfigError::Validation(format!(
                "{} must be >= 1s, got {}s",
                name, value
            )));
        }
    }

    Ok(())
}

/// Validates retrieval job configuration
fn validate_jobs_config(config: &JobsConfig) -> Result<(), ConfigError> {
    if config.poll_interval_ms < 50 || config.poll_interval_ms > 60_000 {
        return Err(ConfigError::Validation(format!(
            "poll_interval_ms must be between 50 and 60000, got {}",
            config.poll_interval_ms
        )));
    }

    if config.sweep_interval_secs < 1 {
        return Err(ConfigError::Validation(format!(
            "sweep_interval_secs must be >= 1, got {}",
            config.sweep_interval_secs
        )));
    }

    if config.stale_after_secs < 1 {
        return Err(ConfigError::Validation(format!(
            "stale_after_secs must be >= 1, got {}",
            config.stale_after_secs
        )));
    }

    if config.keep_alive_secs < 1 {
        return Err(ConfigError::Validation(format!(
            "keep_alive_secs must be >= 1, got {}",
            config.keep_alive_secs
        )));
    }

    if config.default_zip_name.trim().is_empty() {
        return Err(ConfigError::Validation(
            "default_zip_name cannot be empty".to_string(),
        ));
    }

    Ok(())
}
