//! Service configuration.
//!
//! Tunables live in a TOML file (`floodsense.toml` by default) so operators
//! can adjust cadence and endpoints without a rebuild; secrets come from the
//! environment (loaded from `.env` by the entry point) and never from the
//! config file. Missing tunables fall back to defaults; missing secrets are
//! hard errors at startup.

use serde::Deserialize;
use std::time::Duration;

use crate::logging::LogLevel;

// ---------------------------------------------------------------------------
// File config
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize, Default)]
pub struct ServiceConfig {
    #[serde(default)]
    pub scheduler: SchedulerConfig,
    #[serde(default)]
    pub provider: ProviderConfig,
    #[serde(default)]
    pub smtp: Option<SmtpFileConfig>,
    #[serde(default)]
    pub sms: Option<SmsFileConfig>,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SchedulerConfig {
    /// Minutes between pipeline cycles. Must be at least 1.
    #[serde(default = "default_interval_minutes")]
    pub interval_minutes: u64,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        SchedulerConfig {
            interval_minutes: default_interval_minutes(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ProviderConfig {
    #[serde(default = "default_provider_base_url")]
    pub base_url: String,
    /// Per-call fetch timeout, seconds.
    #[serde(default = "default_provider_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        ProviderConfig {
            base_url: default_provider_base_url(),
            timeout_secs: default_provider_timeout_secs(),
        }
    }
}

impl ProviderConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// SMTP settings minus credentials (those come from the environment).
/// Omitting the whole `[smtp]` table leaves the email channel unconfigured.
#[derive(Debug, Clone, Deserialize)]
pub struct SmtpFileConfig {
    pub host: String,
    #[serde(default = "default_smtp_port")]
    pub port: u16,
    #[serde(default = "default_from_address")]
    pub from_address: String,
    #[serde(default = "default_transport_timeout_secs")]
    pub timeout_secs: u64,
}

/// SMS gateway settings minus the auth token. Omitting `[sms]` leaves the
/// SMS channel unconfigured.
#[derive(Debug, Clone, Deserialize)]
pub struct SmsFileConfig {
    pub gateway_url: String,
    #[serde(default = "default_transport_timeout_secs")]
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// One of "debug", "info", "warn", "error".
    #[serde(default = "default_log_level")]
    pub level: String,
    #[serde(default)]
    pub file: Option<String>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        LoggingConfig {
            level: default_log_level(),
            file: None,
        }
    }
}

impl LoggingConfig {
    /// Unknown names fall back to Info rather than failing startup.
    pub fn min_level(&self) -> LogLevel {
        match self.level.as_str() {
            "debug" => LogLevel::Debug,
            "warn" => LogLevel::Warning,
            "error" => LogLevel::Error,
            _ => LogLevel::Info,
        }
    }
}

fn default_interval_minutes() -> u64 {
    30
}

fn default_provider_base_url() -> String {
    crate::ingest::openweather::DEFAULT_BASE_URL.to_string()
}

fn default_provider_timeout_secs() -> u64 {
    crate::ingest::openweather::DEFAULT_TIMEOUT_SECS
}

fn default_smtp_port() -> u16 {
    crate::notify::email::DEFAULT_SMTP_PORT
}

fn default_from_address() -> String {
    "alerts@floodsense.lk".to_string()
}

fn default_transport_timeout_secs() -> u64 {
    15
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Loads the TOML config file. A missing file is not an error — everything
/// has a default; only a present-but-invalid file fails.
pub fn load_config(path: &str) -> Result<ServiceConfig, ConfigError> {
    let contents = match std::fs::read_to_string(path) {
        Ok(contents) => contents,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
            return Ok(ServiceConfig::default());
        }
        Err(err) => return Err(ConfigError::Io(path.to_string(), err.to_string())),
    };
    parse_config(path, &contents)
}

fn parse_config(path: &str, contents: &str) -> Result<ServiceConfig, ConfigError> {
    let config: ServiceConfig =
        toml::from_str(contents).map_err(|e| ConfigError::Parse(path.to_string(), e.to_string()))?;

    // A zero interval has no meaningful slot grid; the scheduler's next-slot
    // arithmetic requires a positive step.
    if config.scheduler.interval_minutes == 0 {
        return Err(ConfigError::Parse(
            path.to_string(),
            "scheduler.interval_minutes must be at least 1".to_string(),
        ));
    }

    Ok(config)
}

// ---------------------------------------------------------------------------
// Environment secrets
// ---------------------------------------------------------------------------

/// Secrets read from the environment at startup.
#[derive(Debug, Clone)]
pub struct Secrets {
    pub database_url: String,
    pub openweather_api_key: String,
    pub smtp_username: Option<String>,
    pub smtp_password: Option<String>,
    pub sms_gateway_token: Option<String>,
}

impl Secrets {
    pub fn from_env() -> Result<Self, ConfigError> {
        Ok(Secrets {
            database_url: require_env("DATABASE_URL")?,
            openweather_api_key: require_env("OPENWEATHER_API_KEY")?,
            smtp_username: std::env::var("SMTP_USER").ok(),
            smtp_password: std::env::var("SMTP_PASSWORD").ok(),
            sms_gateway_token: std::env::var("SMS_GATEWAY_TOKEN").ok(),
        })
    }
}

fn require_env(name: &'static str) -> Result<String, ConfigError> {
    std::env::var(name).map_err(|_| ConfigError::MissingEnv(name))
}

// ---------------------------------------------------------------------------
// Error type
// ---------------------------------------------------------------------------

#[derive(Debug, PartialEq)]
pub enum ConfigError {
    Io(String, String),
    Parse(String, String),
    MissingEnv(&'static str),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::Io(path, err) => write!(f, "failed to read {}: {}", path, err),
            ConfigError::Parse(path, err) => write!(f, "failed to parse {}: {}", path, err),
            ConfigError::MissingEnv(name) => {
                write!(f, "required environment variable {} is not set", name)
            }
        }
    }
}

impl std::error::Error for ConfigError {}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
