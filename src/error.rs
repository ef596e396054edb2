use std::path::PathBuf;
use thiserror::Error;

/// Failures of a single backend request.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ApiError {
    /// The request never produced a response (connect, TLS, timeout, body read).
    #[error("Network error: {0}")]
    Network(String),

    /// The backend answered with a non-2xx status.
    #[error("HTTP {code}: {body}")]
    Status {
        code: u16,
        body: String,
        detail: Option<String>,
    },

    /// A 2xx response whose body could not be decoded.
    #[error("Invalid response: {0}")]
    Decode(String),
}

impl ApiError {
    #[cfg(test)]
    pub fn status_code(&self) -> Option<u16> {
        match self {
            ApiError::Status { code, .. } => Some(*code),
            _ => None,
        }
    }
}

impl From<reqwest::Error> for ApiError {
    fn from(err: reqwest::Error) -> Self {
        ApiError::Network(err.to_string())
    }
}

impl From<serde_json::Error> for ApiError {
    fn from(err: serde_json::Error) -> Self {
        ApiError::Decode(err.to_string())
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read configuration file: {path}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid configuration at {path}: {message}")]
    Parse { path: PathBuf, message: String },

    #[error("Configuration file not found: {0}")]
    NotFound(PathBuf),
}

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("Failed to read cookie file {path}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to write cookie file {path}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_error_display_includes_code() {
        let err = ApiError::Status {
            code: 422,
            body: "{}".to_string(),
            detail: None,
        };
        assert!(err.to_string().contains("422"));
        assert_eq!(err.status_code(), Some(422));
    }

    #[test]
    fn network_error_has_no_status() {
        let err = ApiError::Network("connection refused".to_string());
        assert_eq!(err.status_code(), None);
        assert!(err.to_string().contains("connection refused"));
    }

    #[test]
    fn decode_error_from_serde() {
        let serde_err = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        let err = ApiError::from(serde_err);
        assert!(matches!(err, ApiError::Decode(_)));
    }

    #[test]
    fn config_read_error_chains_source() {
        let err = ConfigError::Read {
            path: PathBuf::from("/etc/sprintsync/config.toml"),
            source: std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied"),
        };
        assert!(err.to_string().contains("/etc/sprintsync/config.toml"));
        assert!(std::error::Error::source(&err).is_some());
    }

    #[test]
    fn session_write_error_names_path() {
        let err = SessionError::Write {
            path: PathBuf::from("/tmp/cookies"),
            source: std::io::Error::new(std::io::ErrorKind::Other, "disk full"),
        };
        assert!(err.to_string().contains("/tmp/cookies"));
    }
}
