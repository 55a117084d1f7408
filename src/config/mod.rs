//! Configuration Module - TOML-based Bot Configuration
//!
//! Loads and validates configuration from `config.toml`. Secrets
//! (marketplace API key, signing key) come from environment variables
//! named here, optionally populated from a `.env` file.
//!
//! Trading policy is NOT part of this file: per-network settings live
//! in a separate JSON document that can be replaced at runtime.

pub mod hot_reload;
pub mod loader;

use std::time::Duration;

use serde::Deserialize;

/// Top-level bot configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
  /// Bot identity and metadata.
  pub bot: BotConfig,
  /// Loop timings.
  #[serde(default)]
  pub engine: EngineConfig,
  /// Marketplace API endpoint and HTTP behaviour.
  pub marketplace: MarketplaceConfig,
  /// Account file and signing key sources.
  #[serde(default)]
  pub accounts: AccountsConfig,
  /// Settings file and activity journal.
  #[serde(default)]
  pub persistence: PersistenceConfig,
  /// Health/metrics server.
  #[serde(default)]
  pub metrics: MetricsConfig,
}

/// Bot identity configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct BotConfig {
  /// Human-readable bot name.
  pub name: String,
  /// Log level (trace, debug, info, warn, error).
  #[serde(default = "default_log_level")]
  pub log_level: String,
  /// Start the automation loop as soon as the process is up.
  #[serde(default = "default_true")]
  pub autostart: bool,
}

/// Automation loop timings.
#[derive(Debug, Clone, Deserialize)]
pub struct EngineConfig {
  /// Wait after a price-limit rejection (seconds).
  #[serde(default = "default_policy_skip")]
  pub policy_skip_seconds: u64,
  /// Wait after any cycle error (seconds).
  #[serde(default = "default_error_backoff")]
  pub error_backoff_seconds: u64,
  /// Lower bound of the randomized inter-cycle delay (seconds).
  #[serde(default = "default_min_delay")]
  pub min_delay_seconds: u64,
  /// Upper bound of the randomized inter-cycle delay (seconds).
  #[serde(default = "default_max_delay")]
  pub max_delay_seconds: u64,
  /// Fixed RNG seed for reproducible runs.
  pub seed: Option<u64>,
}

impl Default for EngineConfig {
  fn default() -> Self {
    Self {
      policy_skip_seconds: default_policy_skip(),
      error_backoff_seconds: default_error_backoff(),
      min_delay_seconds: default_min_delay(),
      max_delay_seconds: default_max_delay(),
      seed: None,
    }
  }
}

/// Marketplace API configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct MarketplaceConfig {
  /// REST API base URL (no trailing slash).
  pub base_url: String,
  /// Environment variable holding the API key.
  #[serde(default = "default_api_key_env")]
  pub api_key_env: String,
  /// Request timeout in seconds.
  #[serde(default = "default_timeout")]
  pub timeout_seconds: u64,
  /// Maximum in-flight requests.
  #[serde(default = "default_max_concurrent")]
  pub max_concurrent: usize,
  /// Retries on 429/5xx/transport failures.
  #[serde(default = "default_max_retries")]
  pub max_retries: u32,
  /// Base delay for exponential backoff (milliseconds).
  #[serde(default = "default_retry_base_delay")]
  pub retry_base_delay_ms: u64,
  /// Client-side request budget.
  #[serde(default = "default_requests_per_second")]
  pub requests_per_second: u32,
  /// Page size for collection and item listings.
  #[serde(default = "default_page_limit")]
  pub page_limit: u32,
}

impl MarketplaceConfig {
  pub const fn timeout(&self) -> Duration {
    Duration::from_secs(self.timeout_seconds)
  }

  pub const fn retry_base_delay(&self) -> Duration {
    Duration::from_millis(self.retry_base_delay_ms)
  }
}

/// Account storage configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct AccountsConfig {
  /// Line-delimited `kind:secret` file.
  #[serde(default = "default_accounts_file")]
  pub file: String,
  /// Environment variable that, when set, overrides the file's key.
  #[serde(default = "default_private_key_env")]
  pub private_key_env: String,
}

impl Default for AccountsConfig {
  fn default() -> Self {
    Self {
      file: default_accounts_file(),
      private_key_env: default_private_key_env(),
    }
  }
}

/// Persistence configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct PersistenceConfig {
  /// Directory for the activity journal.
  #[serde(default = "default_data_dir")]
  pub data_dir: String,
  /// JSON document with per-network trading settings.
  #[serde(default = "default_settings_file")]
  pub settings_file: String,
  /// How often the settings file is checked for changes (seconds).
  #[serde(default = "default_settings_poll")]
  pub settings_poll_seconds: u64,
}

impl Default for PersistenceConfig {
  fn default() -> Self {
    Self {
      data_dir: default_data_dir(),
      settings_file: default_settings_file(),
      settings_poll_seconds: default_settings_poll(),
    }
  }
}

/// Metrics and monitoring configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct MetricsConfig {
  /// Serve /live, /ready, /status and /metrics.
  #[serde(default = "default_true")]
  pub enabled: bool,
  /// Server bind address.
  #[serde(default = "default_metrics_addr")]
  pub bind_address: String,
}

impl Default for MetricsConfig {
  fn default() -> Self {
    Self {
      enabled: true,
      bind_address: default_metrics_addr(),
    }
  }
}

// Default value functions for serde

fn default_log_level() -> String {
  "info".to_string()
}

const fn default_true() -> bool {
  true
}

const fn default_policy_skip() -> u64 {
  30
}

const fn default_error_backoff() -> u64 {
  60
}

const fn default_min_delay() -> u64 {
  5 * 60
}

const fn default_max_delay() -> u64 {
  15 * 60
}

fn default_api_key_env() -> String {
  "OPENSEA_API_KEY".to_string()
}

const fn default_timeout() -> u64 {
  30
}

const fn default_max_concurrent() -> usize {
  4
}

const fn default_max_retries() -> u32 {
  3
}

const fn default_retry_base_delay() -> u64 {
  500
}

const fn default_requests_per_second() -> u32 {
  2
}

const fn default_page_limit() -> u32 {
  50
}

fn default_accounts_file() -> String {
  "accounts.txt".to_string()
}

fn default_private_key_env() -> String {
  "NFT_BOT_PRIVATE_KEY".to_string()
}

fn default_data_dir() -> String {
  "data".to_string()
}

fn default_settings_file() -> String {
  "settings.json".to_string()
}

const fn default_settings_poll() -> u64 {
  60
}

fn default_metrics_addr() -> String {
  "0.0.0.0:9090".to_string()
}
