//! Environment-driven configuration, following the teacher's
//! `ferrex-config` shape: one composed [`Config`] assembled by
//! [`Config::from_env`], split into small per-concern sub-structs, with
//! sensible defaults for everything (§6: "Sensible defaults for all").

mod error;
mod loader;

pub use error::ConfigLoadError;

/// Top-level process configuration.
#[derive(Debug, Clone)]
pub struct Config {
    pub database: DatabaseConfig,
    pub redis: RedisConfig,
    pub secrets: SecretsConfig,
    pub snmp: SnmpConfig,
    pub flow: FlowConfig,
    pub ping: PingConfig,
    pub smtp: SmtpConfig,
    pub device: DeviceConfig,
}

impl Config {
    /// Load configuration from the process environment, falling back to
    /// the documented defaults for anything unset (§6).
    pub fn from_env() -> Result<Self, ConfigLoadError> {
        loader::load_from_env()
    }
}

#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    pub url: String,
}

#[derive(Debug, Clone)]
pub struct RedisConfig {
    pub url: String,
}

/// The application secret the encryption key is derived from (§4.7). Never
/// implements `Debug`/`Display` over the raw value.
#[derive(Clone)]
pub struct SecretsConfig {
    pub application_secret: String,
}

impl std::fmt::Debug for SecretsConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SecretsConfig")
            .field("application_secret", &"<redacted>")
            .finish()
    }
}

#[derive(Debug, Clone)]
pub struct SnmpConfig {
    pub community: String,
    pub poll_interval_seconds: u64,
    pub timeout_seconds: u64,
    pub retries: u32,
}

#[derive(Debug, Clone)]
pub struct FlowConfig {
    pub netflow_port: u16,
    pub sflow_port: u16,
    pub retention_days: i64,
    pub rollup_backfill_days: i64,
}

#[derive(Debug, Clone)]
pub struct PingConfig {
    pub interval_seconds: u64,
    pub timeout_ms: u64,
}

#[derive(Debug, Clone)]
pub struct SmtpConfig {
    pub enabled: bool,
    pub host: String,
    pub port: u16,
    pub username: String,
    pub password: String,
    pub use_tls: bool,
    pub from_address: String,
    pub from_name: String,
}

/// Flags consulted by outbound device clients. `ssl_verify` gates the
/// Arista eAPI / config-fetch HTTP clients (out of core scope, §6) but is
/// seeded here so it has one source of truth.
#[derive(Debug, Clone)]
pub struct DeviceConfig {
    pub ssl_verify: bool,
}
