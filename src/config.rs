//! Application configuration.
//!
//! Configuration is loaded from a TOML file at:
//! 1. `$MAILTRIAGE_CONFIG` (environment variable)
//! 2. `~/.config/mailtriage/config.toml` (Linux/macOS)
//!    `%APPDATA%\mailtriage\config.toml` (Windows)
//! 3. Built-in defaults

use std::path::{Path, PathBuf};
use std::time::Duration;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::{Result, TriageError};
use crate::fetch::DetailErrorPolicy;
use crate::model::message::DEFAULT_WEB_URL;
use crate::query::SearchQuery;
use crate::remote::gmail::{DeleteMode, DEFAULT_BASE_URL};
use crate::remote::retry::RetryPolicy;

/// Top-level configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// General behavior settings.
    pub general: GeneralConfig,
    /// Where the access token lives.
    pub auth: AuthConfig,
    /// Remote API endpoints and timeouts.
    pub api: ApiConfig,
    /// The mailbox search.
    pub query: QueryConfig,
    /// Fetch behavior.
    pub fetch: FetchConfig,
    /// Retry of transient remote failures.
    pub retry: RetryConfig,
    /// Review loop behavior.
    pub review: ReviewConfig,
}

/// General behavior settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// Override cache directory for logs.
    pub cache_dir: Option<PathBuf>,
    /// Log level: "error", "warn", "info", "debug", "trace".
    pub log_level: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AuthConfig {
    /// Token file path. Defaults to `<config dir>/mailtriage/token.json`.
    pub token_file: Option<PathBuf>,
}

/// Remote API settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    /// Base of the Gmail `users` resource.
    pub base_url: String,
    /// Mailbox owner, `me` for the authenticated user.
    pub user_id: String,
    /// Per-request timeout in seconds.
    pub timeout_secs: u64,
    /// Prefix of the web link printed for each message.
    pub web_url: String,
}

/// Values for the fixed-shape mailbox search.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct QueryConfig {
    /// Only messages after this date.
    pub after: NaiveDate,
    /// Folder scope (`in:`), empty for every folder.
    pub folder: String,
    /// Categories excluded from the search.
    pub exclude_categories: Vec<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct FetchConfig {
    /// "abort" (default) or "skip" when a single message cannot be fetched.
    pub on_detail_error: DetailErrorPolicy,
}

/// Retry settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryConfig {
    /// Total attempts per remote call (1 disables retrying).
    pub max_attempts: u32,
    /// First backoff delay in milliseconds.
    pub initial_backoff_ms: u64,
    /// Longest backoff delay in milliseconds.
    pub max_backoff_ms: u64,
}

/// Review loop settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ReviewConfig {
    /// Print the server snippet above the body.
    pub show_snippet: bool,
    /// "delete" (permanent) or "trash".
    pub delete_mode: DeleteMode,
    /// Never call the remote delete; only report what would be deleted.
    pub dry_run: bool,
}

// ── Default implementations ─────────────────────────────────────

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            cache_dir: None,
            log_level: "warn".to_string(),
        }
    }
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            user_id: "me".to_string(),
            timeout_secs: 30,
            web_url: DEFAULT_WEB_URL.to_string(),
        }
    }
}

impl Default for QueryConfig {
    fn default() -> Self {
        let query = SearchQuery::default();
        Self {
            after: query.after,
            folder: query.folder,
            exclude_categories: query.exclude_categories,
        }
    }
}

impl Default for RetryConfig {
    fn default() -> Self {
        let policy = RetryPolicy::default();
        Self {
            max_attempts: policy.max_attempts,
            initial_backoff_ms: policy.initial_backoff.as_millis() as u64,
            max_backoff_ms: policy.max_backoff.as_millis() as u64,
        }
    }
}

// ── Conversions ─────────────────────────────────────────────────

impl ApiConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl QueryConfig {
    pub fn to_query(&self) -> SearchQuery {
        SearchQuery {
            after: self.after,
            folder: self.folder.clone(),
            exclude_categories: self.exclude_categories.clone(),
        }
    }
}

impl RetryConfig {
    pub fn to_policy(&self) -> RetryPolicy {
        RetryPolicy {
            max_attempts: self.max_attempts.max(1),
            initial_backoff: Duration::from_millis(self.initial_backoff_ms),
            max_backoff: Duration::from_millis(self.max_backoff_ms),
        }
    }
}

// ── Load ────────────────────────────────────────────────────────

/// Load the configuration from [`config_file_path`].
///
/// A missing file yields the defaults silently. An unreadable or invalid
/// file is logged and also yields the defaults, so a bad config never
/// blocks a triage run.
pub fn load_config() -> Config {
    let Some(path) = config_file_path() else {
        return Config::default();
    };
    if !path.exists() {
        tracing::debug!(path = %path.display(), "No config file, using defaults");
        return Config::default();
    }
    match read_config(&path) {
        Ok(cfg) => {
            tracing::info!(path = %path.display(), "Loaded config");
            cfg
        }
        Err(e) => {
            tracing::warn!(error = %e, "Ignoring config file, using defaults");
            Config::default()
        }
    }
}

/// Read and parse one config file.
pub fn read_config(path: &Path) -> Result<Config> {
    let contents = std::fs::read_to_string(path).map_err(|e| TriageError::io(path, e))?;
    toml::from_str(&contents).map_err(|e| TriageError::Config {
        path: path.to_path_buf(),
        message: e.to_string(),
    })
}

/// Determine the config file path (checking env var first, then standard dirs).
pub fn config_file_path() -> Option<PathBuf> {
    if let Ok(env_path) = std::env::var("MAILTRIAGE_CONFIG") {
        return Some(PathBuf::from(env_path));
    }
    config_dir().map(|d| d.join("config.toml"))
}

/// The per-user mailtriage configuration directory.
pub fn config_dir() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("mailtriage"))
}

/// Return the cache directory for logs.
pub fn cache_dir(config: &Config) -> PathBuf {
    if let Some(ref dir) = config.general.cache_dir {
        return dir.clone();
    }
    dirs::cache_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("mailtriage")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let cfg = Config::default();
        assert_eq!(cfg.general.log_level, "warn");
        assert_eq!(cfg.api.user_id, "me");
        assert_eq!(cfg.query.folder, "inbox");
        assert_eq!(cfg.fetch.on_detail_error, DetailErrorPolicy::Abort);
        assert_eq!(cfg.review.delete_mode, DeleteMode::Delete);
        assert!(!cfg.review.dry_run);
        assert_eq!(cfg.retry.max_attempts, 3);
    }

    #[test]
    fn test_default_query_string() {
        let cfg = Config::default();
        assert_eq!(
            cfg.query.to_query().to_string(),
            "after:2019/03/12 in:inbox -category:{social promotions forums}"
        );
    }

    #[test]
    fn test_partial_config_uses_defaults() {
        let partial = r#"
[query]
after = "2023-01-31"
exclude_categories = ["promotions"]

[fetch]
on_detail_error = "skip"

[review]
delete_mode = "trash"
"#;
        let cfg: Config = toml::from_str(partial).expect("parse partial");
        assert_eq!(
            cfg.query.to_query().to_string(),
            "after:2023/01/31 in:inbox -category:promotions"
        );
        assert_eq!(cfg.fetch.on_detail_error, DetailErrorPolicy::Skip);
        assert_eq!(cfg.review.delete_mode, DeleteMode::Trash);
        // Other fields use defaults
        assert_eq!(cfg.api.timeout_secs, 30);
        assert_eq!(cfg.retry.initial_backoff_ms, 500);
    }

    #[test]
    fn test_retry_policy_never_drops_below_one_attempt() {
        let cfg = RetryConfig {
            max_attempts: 0,
            initial_backoff_ms: 10,
            max_backoff_ms: 20,
        };
        let policy = cfg.to_policy();
        assert_eq!(policy.max_attempts, 1);
        assert_eq!(policy.initial_backoff, Duration::from_millis(10));
    }

    #[test]
    fn test_serialize_deserialize_roundtrip() {
        let cfg = Config::default();
        let toml_str = toml::to_string_pretty(&cfg).expect("serialize");
        let parsed: Config = toml::from_str(&toml_str).expect("deserialize");
        assert_eq!(parsed.query.after, cfg.query.after);
        assert_eq!(parsed.api.base_url, cfg.api.base_url);
    }

    #[test]
    fn test_read_config_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[api]\nuser_id = \"ops@example.com\"\n").unwrap();
        let cfg = read_config(&path).unwrap();
        assert_eq!(cfg.api.user_id, "ops@example.com");
        assert_eq!(cfg.query.folder, "inbox");
    }

    #[test]
    fn test_read_config_rejects_bad_toml() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[review]\ndelete_mode = \"shred\"\n").unwrap();
        let err = read_config(&path).unwrap_err();
        assert!(matches!(err, TriageError::Config { .. }));
        assert!(err.to_string().contains("config.toml"));
    }

    #[test]
    fn test_read_config_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = read_config(&dir.path().join("absent.toml")).unwrap_err();
        assert!(matches!(err, TriageError::Io { .. }));
    }
}
