//! Access token loading and construction of the authenticated channel.
//!
//! Obtaining and refreshing tokens is left to external OAuth tooling. This
//! module only reads an already issued token, either from
//! `MAILTRIAGE_ACCESS_TOKEN` or from a JSON token file.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::config::{self, Config};
use crate::error::{Result, TriageError};
use crate::remote::gmail::GmailClient;
use crate::remote::retry::RetryingStore;

/// Environment variable holding a raw access token.
pub const TOKEN_ENV: &str = "MAILTRIAGE_ACCESS_TOKEN";

/// The remote store handle the pipeline runs against.
pub type Channel = RetryingStore<GmailClient>;

/// OAuth token as persisted by common tooling (`token.json`).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoredToken {
    pub access_token: String,
    #[serde(default)]
    pub token_type: String,
    #[serde(default, alias = "expires_at")]
    pub expiry: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,
}

impl StoredToken {
    /// Checks if the token is expired. Pre-epoch timestamps mean "no expiry".
    #[must_use]
    pub fn is_expired(&self) -> bool {
        self.expiry
            .is_some_and(|exp| exp.timestamp() > 0 && Utc::now() >= exp)
    }
}

/// Read a token file.
pub fn load_token(path: &Path) -> Result<StoredToken> {
    if !path.exists() {
        return Err(TriageError::TokenNotFound(path.to_path_buf()));
    }
    let contents = std::fs::read_to_string(path).map_err(|e| TriageError::io(path, e))?;
    let token: StoredToken = serde_json::from_str(&contents)?;
    Ok(token)
}

/// Where the token file is looked up when nothing is configured.
pub fn default_token_path() -> Option<PathBuf> {
    config::config_dir().map(|d| d.join("token.json"))
}

/// Pick the access token: an explicit value first, then the token file.
pub fn resolve_access_token(env_value: Option<String>, token_file: Option<&Path>) -> Result<String> {
    if let Some(token) = env_value.map(|t| t.trim().to_string()).filter(|t| !t.is_empty()) {
        info!("Using access token from {TOKEN_ENV}");
        return Ok(token);
    }

    let path = token_file
        .map(Path::to_path_buf)
        .or_else(default_token_path)
        .ok_or_else(|| TriageError::InvalidToken("no token file location available".into()))?;

    let token = load_token(&path)?;
    if token.access_token.trim().is_empty() {
        return Err(TriageError::InvalidToken(format!(
            "'{}' has an empty access_token",
            path.display()
        )));
    }
    if token.is_expired() {
        warn!(path = %path.display(), "Access token looks expired, trying it anyway");
    }
    info!(path = %path.display(), "Loaded access token");
    Ok(token.access_token)
}

/// Build the authenticated, retrying Gmail channel from configuration.
///
/// `token_override` (the `--token` flag) wins over `auth.token_file`.
pub fn obtain_channel(config: &Config, token_override: Option<&Path>) -> Result<Channel> {
    let token_file = token_override.or(config.auth.token_file.as_deref());
    let access_token = resolve_access_token(std::env::var(TOKEN_ENV).ok(), token_file)?;
    let client = GmailClient::new(
        config.api.base_url.clone(),
        config.api.user_id.clone(),
        access_token,
        config.api.timeout(),
    )?
    .with_delete_mode(config.review.delete_mode);
    Ok(RetryingStore::new(client, config.retry.to_policy()))
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    fn token_file(contents: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_env_value_wins() {
        let token = resolve_access_token(Some(" ya29.env ".into()), None).unwrap();
        assert_eq!(token, "ya29.env");
    }

    #[test]
    fn test_token_file_is_read() {
        let file = token_file(
            r#"{"access_token":"ya29.file","token_type":"Bearer","refresh_token":"1//r","expiry":"2019-03-12T10:00:00.5-07:00"}"#,
        );
        let token = resolve_access_token(None, Some(file.path())).unwrap();
        assert_eq!(token, "ya29.file");
    }

    #[test]
    fn test_blank_env_falls_through_to_file() {
        let file = token_file(r#"{"access_token":"ya29.file"}"#);
        let token = resolve_access_token(Some("  ".into()), Some(file.path())).unwrap();
        assert_eq!(token, "ya29.file");
    }

    #[test]
    fn test_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("token.json");
        let err = resolve_access_token(None, Some(&path)).unwrap_err();
        assert!(matches!(err, TriageError::TokenNotFound(p) if p == path));
    }

    #[test]
    fn test_empty_access_token_rejected() {
        let file = token_file(r#"{"access_token":""}"#);
        let err = resolve_access_token(None, Some(file.path())).unwrap_err();
        assert!(matches!(err, TriageError::InvalidToken(_)));
    }

    #[test]
    fn test_garbage_file_is_json_error() {
        let file = token_file("not json");
        let err = resolve_access_token(None, Some(file.path())).unwrap_err();
        assert!(matches!(err, TriageError::Json(_)));
    }

    #[test]
    fn test_expiry() {
        let mut token: StoredToken =
            serde_json::from_str(r#"{"access_token":"a","expires_at":"2001-01-01T00:00:00Z"}"#)
                .unwrap();
        assert!(token.is_expired());
        token.expiry = None;
        assert!(!token.is_expired());
        token.expiry = "0001-01-01T00:00:00Z".parse().ok();
        assert!(!token.is_expired());
    }
}
