//! Error types and handling for shellypv
//!
//! This module defines the error types used throughout the application,
//! providing consistent error handling and reporting.

use thiserror::Error;

/// Result type alias for shellypv operations
pub type Result<T> = std::result::Result<T, ShellyPvError>;

/// Main error type for shellypv
#[derive(Debug, Error)]
pub enum ShellyPvError {
    /// Configuration-related errors
    #[error("Configuration error: {message}")]
    Config { message: String },

    /// Validation errors
    #[error("Validation error: {field} - {message}")]
    Validation { field: String, message: String },

    /// Transport-level failures talking to the meter
    #[error("Network error: {message}")]
    Network { message: String },

    /// Request took longer than the client timeout
    #[error("Timeout error: {message}")]
    Timeout { message: String },

    /// Meter answered with a non-success HTTP status
    #[error("HTTP error {status}: {message}")]
    Http { status: u16, message: String },

    /// Meter answered with a body we cannot use
    #[error("Parse error: {message}")]
    Parse { message: String },

    /// D-Bus communication errors
    #[error("D-Bus error: {message}")]
    DBus { message: String },

    /// Serialization/deserialization errors
    #[error("Serialization error: {message}")]
    Serialization { message: String },

    /// File I/O errors
    #[error("I/O error: {message}")]
    Io { message: String },

    /// Generic errors with context
    #[error("Error: {message}")]
    Generic { message: String },
}

impl ShellyPvError {
    /// Create a new configuration error
    pub fn config<S: Into<String>>(message: S) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Create a new validation error
    pub fn validation<S: Into<String>>(field: S, message: S) -> Self {
        Self::Validation {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Create a new network error
    pub fn network<S: Into<String>>(message: S) -> Self {
        Self::Network {
            message: message.into(),
        }
    }

    /// Create a new timeout error
    pub fn timeout<S: Into<String>>(message: S) -> Self {
        Self::Timeout {
            message: message.into(),
        }
    }

    /// Create a new HTTP status error
    pub fn http<S: Into<String>>(status: u16, message: S) -> Self {
        Self::Http {
            status,
            message: message.into(),
        }
    }

    /// Create a new parse error
    pub fn parse<S: Into<String>>(message: S) -> Self {
        Self::Parse {
            message: message.into(),
        }
    }

    /// Create a new D-Bus error
    pub fn dbus<S: Into<String>>(message: S) -> Self {
        Self::DBus {
            message: message.into(),
        }
    }

    /// Create a new I/O error
    pub fn io<S: Into<String>>(message: S) -> Self {
        Self::Io {
            message: message.into(),
        }
    }

    /// Create a new generic error
    pub fn generic<S: Into<String>>(message: S) -> Self {
        Self::Generic {
            message: message.into(),
        }
    }

    /// Whether this error means the meter could not be read this cycle
    pub fn is_upstream(&self) -> bool {
        matches!(
            self,
            Self::Network { .. } | Self::Timeout { .. } | Self::Http { .. } | Self::Parse { .. }
        )
    }
}

impl From<std::io::Error> for ShellyPvError {
    fn from(err: std::io::Error) -> Self {
        Self::io(err.to_string())
    }
}

impl From<serde_yaml::Error> for ShellyPvError {
    fn from(err: serde_yaml::Error) -> Self {
        Self::Serialization {
            message: err.to_string(),
        }
    }
}

impl From<serde_json::Error> for ShellyPvError {
    fn from(err: serde_json::Error) -> Self {
        Self::parse(err.to_string())
    }
}

impl From<reqwest::Error> for ShellyPvError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::timeout(err.to_string())
        } else if let Some(status) = err.status() {
            Self::http(status.as_u16(), err.to_string())
        } else if err.is_decode() {
            Self::parse(err.to_string())
        } else {
            Self::network(err.to_string())
        }
    }
}

impl From<zbus::Error> for ShellyPvError {
    fn from(err: zbus::Error) -> Self {
        Self::dbus(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_creation() {
        let err = ShellyPvError::config("test config error");
        assert!(matches!(err, ShellyPvError::Config { .. }));

        let err = ShellyPvError::http(503, "busy");
        assert!(matches!(err, ShellyPvError::Http { status: 503, .. }));

        let err = ShellyPvError::validation("field", "test validation error");
        assert!(matches!(err, ShellyPvError::Validation { .. }));
    }

    #[test]
    fn test_error_display() {
        let err = ShellyPvError::config("test error");
        assert_eq!(format!("{}", err), "Configuration error: test error");

        let err = ShellyPvError::validation("test_field", "invalid value");
        assert_eq!(
            format!("{}", err),
            "Validation error: test_field - invalid value"
        );

        let err = ShellyPvError::http(401, "unauthorized");
        assert_eq!(format!("{}", err), "HTTP error 401: unauthorized");
    }

    #[test]
    fn upstream_classification() {
        assert!(ShellyPvError::network("refused").is_upstream());
        assert!(ShellyPvError::timeout("5s").is_upstream());
        assert!(ShellyPvError::http(500, "x").is_upstream());
        assert!(ShellyPvError::parse("empty").is_upstream());
        assert!(!ShellyPvError::dbus("gone").is_upstream());
        assert!(!ShellyPvError::config("bad").is_upstream());
    }

    #[test]
    fn json_errors_become_parse_errors() {
        let err: ShellyPvError = serde_json::from_str::<serde_json::Value>("{oops")
            .unwrap_err()
            .into();
        assert!(matches!(err, ShellyPvError::Parse { .. }));
    }
}
