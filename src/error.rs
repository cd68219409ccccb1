//! Centralized error types for mailtriage.

use std::path::PathBuf;
use thiserror::Error;

/// All errors produced by the mailtriage library.
#[derive(Error, Debug)]
pub enum TriageError {
    /// The HTTP request never produced a usable response.
    #[error("Transport error during {op}: {source}")]
    Transport {
        op: &'static str,
        source: reqwest::Error,
    },

    /// The remote store answered with a non-success status.
    #[error("Remote store rejected {op} (HTTP {status}): {message}")]
    Api {
        op: &'static str,
        status: u16,
        message: String,
    },

    /// A content blob could not be decoded into text.
    #[error("Body decoding error: {0}")]
    Decode(String),

    /// Reading the operator's decision failed.
    #[error("Unable to read operator input: {0}")]
    Input(std::io::Error),

    /// The input stream ended while a decision was pending.
    #[error("Operator input closed before a decision was made")]
    InputClosed,

    /// Writing progress or prompts failed.
    #[error("Unable to write output: {0}")]
    Output(std::io::Error),

    /// I/O error with the associated file path.
    #[error("I/O error reading '{path}': {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    /// The configuration file exists but is not valid TOML for [`Config`].
    ///
    /// [`Config`]: crate::config::Config
    #[error("Invalid config file '{path}': {message}")]
    Config { path: PathBuf, message: String },

    /// No access token file exists at the resolved location.
    #[error("Access token file not found: {0}")]
    TokenNotFound(PathBuf),

    /// The access token is present but unusable.
    #[error("Invalid access token: {0}")]
    InvalidToken(String),

    /// A JSON document could not be parsed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Convenience alias for `Result<T, TriageError>`.
pub type Result<T> = std::result::Result<T, TriageError>;

impl TriageError {
    /// Create an `Io` variant from a path and an `io::Error`.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Create a `Transport` variant tagged with the remote operation.
    pub fn transport(op: &'static str, source: reqwest::Error) -> Self {
        Self::Transport { op, source }
    }

    /// Whether retrying the same request may succeed.
    ///
    /// Transport failures and throttling/server-side statuses are transient.
    /// Everything else (auth, not found, bad input, decoding) is permanent.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Transport { source, .. } => {
                source.is_timeout() || source.is_connect() || source.is_request() || source.is_body()
            }
            Self::Api { status, .. } => matches!(status, 429 | 500 | 502 | 503 | 504),
            _ => false,
        }
    }

    /// The remote store reported that the item does not exist.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::Api { status: 404, .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn api(status: u16) -> TriageError {
        TriageError::Api {
            op: "list",
            status,
            message: "x".into(),
        }
    }

    #[test]
    fn test_throttling_and_server_errors_are_transient() {
        for status in [429, 500, 502, 503, 504] {
            assert!(api(status).is_transient(), "status {status}");
        }
    }

    #[test]
    fn test_client_errors_are_permanent() {
        for status in [400, 401, 403, 404] {
            assert!(!api(status).is_transient(), "status {status}");
        }
        assert!(!TriageError::Decode("bad".into()).is_transient());
        assert!(!TriageError::InputClosed.is_transient());
    }

    #[test]
    fn test_not_found() {
        assert!(api(404).is_not_found());
        assert!(!api(410).is_not_found());
        assert!(!TriageError::InputClosed.is_not_found());
    }

    #[test]
    fn test_api_error_message() {
        let msg = api(403).to_string();
        assert!(msg.contains("HTTP 403"));
        assert!(msg.contains("list"));
    }
}
