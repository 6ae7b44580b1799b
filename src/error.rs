//! Error types for the W1000 to InfluxDB2 forwarder.
//!
//! This module defines typed errors for the different components of the
//! application, providing better error categorization and enabling specific
//! error handling strategies at the per-report and per-login boundaries.

use thiserror::Error;

/// Result type alias using our custom error types.
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Top-level error type that encompasses all application errors.
#[derive(Error, Debug)]
pub enum Error {
    /// Configuration-related errors
    #[error("configuration error")]
    Config(#[from] ConfigError),

    /// W1000 portal communication and parsing errors
    #[error("portal error")]
    Portal(#[from] PortalError),

    /// InfluxDB storage errors
    #[error("storage error")]
    Storage(#[from] StorageError),

    /// Generic errors that don't fit other categories
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Configuration-related errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Environment variable parsing failed
    #[error("failed to parse environment variables: {0}")]
    EnvParse(String),
}

/// W1000 portal communication and parsing errors.
///
/// These map onto the failure modes of the portal protocol: a rejected or
/// locked account, an unexpected HTTP status, an unresolvable report name,
/// a network-level failure, or a response body the client cannot interpret.
#[derive(Error, Debug)]
pub enum PortalError {
    /// Login page or login response did not carry the expected
    /// authentication material (verification token or session payload).
    /// Usually means invalid credentials or a locked account.
    #[error("authentication failed: {0}")]
    Auth(String),

    /// Server returned an unexpected HTTP status
    #[error("unexpected portal response (status {status})")]
    Protocol { status: u16, body: String },

    /// Configured report name has no matching window in any work area
    #[error("report '{0}' not found in any work area")]
    NotFound(String),

    /// Network-level failure, timeout, connection reset
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// Response body could not be parsed (session document, curve JSON)
    #[error("malformed portal payload: {0}")]
    Payload(String),
}

/// InfluxDB storage errors.
#[derive(Error, Debug)]
pub enum StorageError {
    /// InfluxDB client error
    #[error("InfluxDB error: {0}")]
    Client(#[from] influxdb2::RequestError),

    /// Write operation failed
    #[error("failed to write {count} statistic points: {message}")]
    WriteFailed { count: usize, message: String },
}

impl ConfigError {
    /// Creates a new environment parse error.
    pub fn env_parse(err: impl std::fmt::Display) -> Self {
        Self::EnvParse(err.to_string())
    }
}

impl PortalError {
    /// Creates an authentication error.
    pub fn auth(message: impl Into<String>) -> Self {
        Self::Auth(message.into())
    }

    /// Creates a protocol error from HTTP status and response body.
    pub fn protocol(status: reqwest::StatusCode, body: String) -> Self {
        Self::Protocol {
            status: status.as_u16(),
            body,
        }
    }

    /// Creates a payload error.
    pub fn payload(err: impl std::fmt::Display) -> Self {
        Self::Payload(err.to_string())
    }
}

impl StorageError {
    /// Creates a write failed error.
    pub fn write_failed(count: usize, err: impl std::fmt::Display) -> Self {
        Self::WriteFailed {
            count,
            message: err.to_string(),
        }
    }
}
