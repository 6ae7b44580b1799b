use crate::error::{ConfigError, Result};
use serde_derive::Deserialize;
use std::str::FromStr;

fn default_log_level() -> String {
    "info".to_string()
}

#[derive(Deserialize, Debug)]
pub struct AppConfig {
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl AppConfig {
    pub fn log_level(&self) -> tracing::Level {
        tracing::Level::from_str(self.log_level.as_str()).unwrap_or(tracing::Level::INFO)
    }
}

pub(crate) fn load_app_config() -> Result<AppConfig, ConfigError> {
    envy::from_env::<AppConfig>()
        .map_err(|err| ConfigError::env_parse(format!("AppConfig: {}", err)))
}

fn default_portal_url() -> String {
    "https://energia.eon-hungaria.hu/W1000".to_string()
}

fn default_scan_interval_min() -> u64 {
    60
}

fn default_http_timeout_sec() -> u64 {
    30
}

fn default_session_max_age_min() -> u64 {
    10
}

/// Configuration for the W1000 portal client.
///
/// `reports` is a comma-separated list of report names exactly as they
/// appear as window names in the operator's portal work areas.
#[derive(Deserialize, Debug, Clone)]
pub struct PortalConfig {
    #[serde(default = "default_portal_url")]
    pub url: String,
    pub user: String,
    pub password: String,
    pub reports: String,
    #[serde(default = "default_scan_interval_min")]
    pub scan_interval_min: u64,
    #[serde(default = "default_http_timeout_sec")]
    pub http_timeout_sec: u64,
    // one uniform freshness window for the login session
    #[serde(default = "default_session_max_age_min")]
    pub session_max_age_min: u64,
}

impl PortalConfig {
    /// Splits the configured report list into trimmed, non-empty names.
    pub fn report_names(&self) -> Vec<String> {
        self.reports
            .split(',')
            .map(|name| name.trim().to_string())
            .filter(|name| !name.is_empty())
            .collect()
    }
}

pub(crate) fn load_portal_config() -> Result<PortalConfig, ConfigError> {
    envy::prefixed("W1000_")
        .from_env::<PortalConfig>()
        .map_err(|err| ConfigError::env_parse(format!("PortalConfig: {}", err)))
}

#[derive(Deserialize, Debug)]
pub struct InfluxConfig {
    pub url: String,
    pub token: String,
    pub org: String,
    pub bucket: String,
}

pub fn load_influx_config() -> Result<InfluxConfig, ConfigError> {
    envy::prefixed("INFLUXDB_")
        .from_env::<InfluxConfig>()
        .map_err(|err| ConfigError::env_parse(format!("InfluxConfig: {}", err)))
}

/// Loads every configuration section in one go, converging the parse
/// failures into the top-level error type.
pub(crate) fn load_all() -> Result<(AppConfig, PortalConfig, InfluxConfig)> {
    Ok((load_app_config()?, load_portal_config()?, load_influx_config()?))
}
