use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Top-level application configuration
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct AppConfig {
    #[serde(default)]
    pub provider: ProviderConfig,
    #[serde(default)]
    pub cache: CacheConfig,
}

/// Market data provider (Yahoo Finance) configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ProviderConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Page hit once per session to obtain the consent cookie.
    #[serde(default = "default_session_url")]
    pub session_url: String,

    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    #[serde(default = "default_request_delay_ms")]
    pub request_delay_ms: u64,

    #[serde(default = "default_jitter_ms")]
    pub jitter_ms: u64,

    #[serde(default = "default_max_retries")]
    pub max_retries: u32,

    #[serde(default = "default_retry_backoff_ms")]
    pub retry_backoff_ms: u64,

    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    /// Appended to bare IDX codes: BBCA → BBCA.JK
    #[serde(default = "default_exchange_suffix")]
    pub exchange_suffix: String,

    #[serde(default = "default_history_range")]
    pub history_range: String,

    #[serde(default = "default_history_interval")]
    pub history_interval: String,
}

/// Lookup cache configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CacheConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Freshness window per ticker.
    #[serde(default = "default_ttl_secs")]
    pub ttl_secs: u64,
}

impl CacheConfig {
    pub fn ttl(&self) -> Duration {
        Duration::from_secs(self.ttl_secs)
    }
}

// ── Defaults ─────────────────────────────────────────────────────────────────

fn default_base_url() -> String {
    "https://query2.finance.yahoo.com".to_string()
}
fn default_session_url() -> String {
    "https://fc.yahoo.com".to_string()
}
fn default_timeout_secs() -> u64 {
    20
}
fn default_request_delay_ms() -> u64 {
    200
}
fn default_jitter_ms() -> u64 {
    300
}
fn default_max_retries() -> u32 {
    3
}
fn default_retry_backoff_ms() -> u64 {
    500
}
fn default_user_agent() -> String {
    "Mozilla/5.0 (X11; Linux x86_64) idx-analyzer/0.1".to_string()
}
fn default_exchange_suffix() -> String {
    ".JK".to_string()
}
fn default_history_range() -> String {
    "5y".to_string()
}
fn default_history_interval() -> String {
    "1mo".to_string()
}
fn default_true() -> bool {
    true
}
fn default_ttl_secs() -> u64 {
    3600
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            session_url: default_session_url(),
            timeout_secs: default_timeout_secs(),
            request_delay_ms: default_request_delay_ms(),
            jitter_ms: default_jitter_ms(),
            max_retries: default_max_retries(),
            retry_backoff_ms: default_retry_backoff_ms(),
            user_agent: default_user_agent(),
            exchange_suffix: default_exchange_suffix(),
            history_range: default_history_range(),
            history_interval: default_history_interval(),
        }
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            ttl_secs: default_ttl_secs(),
        }
    }
}

// ── Loader ───────────────────────────────────────────────────────────────────

/// `IDX_<SECTION>__<KEY>`, e.g. `IDX_CACHE__TTL_SECS=60`
fn env_overrides() -> config::Environment {
    config::Environment::with_prefix("IDX")
        .prefix_separator("_")
        .separator("__")
}

impl AppConfig {
    /// Load configuration from file + environment overrides
    pub fn load() -> Result<Self> {
        dotenv::dotenv().ok();
        Self::layered(env_overrides())
    }

    fn layered(env: config::Environment) -> Result<Self> {
        let cfg = config::Config::builder()
            .add_source(
                config::File::with_name("config/default")
                    .required(false)
                    .format(config::FileFormat::Toml),
            )
            .add_source(
                config::File::with_name("config/local")
                    .required(false)
                    .format(config::FileFormat::Toml),
            )
            .add_source(env)
            .build()
            .context("Failed to read configuration")?;

        cfg.try_deserialize().context("Invalid configuration")
    }

    pub fn from_toml(src: &str) -> Result<Self> {
        let cfg = config::Config::builder()
            .add_source(config::File::from_str(src, config::FileFormat::Toml))
            .build()?;
        Ok(cfg.try_deserialize()?)
    }
}
