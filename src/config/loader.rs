//! Configuration Loader - File Loading and Validation
//!
//! Handles loading `config.toml`, validating all parameters,
//! and providing clear error messages for misconfiguration.

use std::path::Path;

use anyhow::{Context, Result};
use tracing::info;

use super::AppConfig;

/// Upper bound on marketplace retries; backoff doubles per attempt.
const MAX_RETRIES: u32 = 10;

/// Load and validate configuration from a TOML file.
///
/// # Errors
/// Returns detailed error if:
/// - File doesn't exist or can't be read
/// - TOML parsing fails
/// - Validation rules are violated
pub fn load_config(path: &str) -> Result<AppConfig> {
  let path = Path::new(path);

  let content = std::fs::read_to_string(path)
    .with_context(|| format!("Failed to read config file: {}", path.display()))?;

  let config = parse_config(&content)?;

  info!(
    name = %config.bot.name,
    marketplace = %config.marketplace.base_url,
    settings_file = %config.persistence.settings_file,
    "Configuration loaded successfully"
  );

  Ok(config)
}

/// Parse and validate configuration from TOML text.
///
/// # Errors
/// Returns an error if parsing or validation fails.
pub fn parse_config(content: &str) -> Result<AppConfig> {
  let config: AppConfig =
    toml::from_str(content).with_context(|| "Failed to parse config.toml")?;
  validate_config(&config)?;
  Ok(config)
}

/// Validate all configuration parameters.
///
/// Checks for:
/// - Non-empty endpoints and env var names
/// - Ordered delay bounds
/// - Positive HTTP budgets and a bounded retry count
fn validate_config(config: &AppConfig) -> Result<()> {
  // Engine validation
  anyhow::ensure!(
    config.engine.min_delay_seconds <= config.engine.max_delay_seconds,
    "engine.min_delay_seconds ({}) must not exceed max_delay_seconds ({})",
    config.engine.min_delay_seconds,
    config.engine.max_delay_seconds
  );

  // Marketplace validation
  anyhow::ensure!(
    config.marketplace.base_url.starts_with("http"),
    "marketplace.base_url must be an http(s) URL, got '{}'",
    config.marketplace.base_url
  );
  anyhow::ensure!(
    !config.marketplace.api_key_env.is_empty(),
    "marketplace.api_key_env must not be empty"
  );
  anyhow::ensure!(
    config.marketplace.max_concurrent > 0,
    "marketplace.max_concurrent must be positive"
  );
  anyhow::ensure!(
    config.marketplace.max_retries <= MAX_RETRIES,
    "marketplace.max_retries must be at most {MAX_RETRIES}, got {}",
    config.marketplace.max_retries
  );
  anyhow::ensure!(
    config.marketplace.requests_per_second > 0,
    "marketplace.requests_per_second must be positive"
  );
  anyhow::ensure!(
    (1..=200).contains(&config.marketplace.page_limit),
    "marketplace.page_limit must be in [1, 200], got {}",
    config.marketplace.page_limit
  );

  // Persistence validation
  anyhow::ensure!(
    !config.persistence.settings_file.is_empty(),
    "persistence.settings_file must not be empty"
  );
  anyhow::ensure!(
    config.persistence.settings_poll_seconds > 0,
    "persistence.settings_poll_seconds must be positive"
  );

  Ok(())
}
