//! Runtime configuration loaded from the environment (and an optional `.env` file).

use serde::{Deserialize, Serialize};
use std::env;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;
use tracing::info;
use url::Url;
use validator::Validate;

use crate::actors::session::{SessionOptions, DEFAULT_GREETING, DEFAULT_REPLY_DELAY};
use crate::brain::RuleTable;
use crate::error::AppError;

pub const ENV_REPLY_DELAY_MS: &str = "WELLNESS_REPLY_DELAY_MS";
pub const ENV_BACKEND: &str = "WELLNESS_BACKEND";
pub const ENV_REMOTE_URL: &str = "WELLNESS_REMOTE_URL";
pub const ENV_REMOTE_TOKEN: &str = "WELLNESS_REMOTE_TOKEN";
pub const ENV_REQUEST_TIMEOUT_SECS: &str = "WELLNESS_REQUEST_TIMEOUT_SECS";
pub const ENV_RULES_PATH: &str = "WELLNESS_RULES_PATH";
pub const ENV_GREETING: &str = "WELLNESS_GREETING";
pub const ENV_LOG_FORMAT: &str = "WELLNESS_LOG_FORMAT";

const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;

/// Where bot replies come from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    /// Keyword classifier, in process.
    Local,
    /// Remote conversational service over HTTP.
    Remote,
}

impl FromStr for BackendKind {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "local" => Ok(BackendKind::Local),
            "remote" => Ok(BackendKind::Remote),
            other => Err(AppError::Config(format!(
                "{} must be 'local' or 'remote', got '{}'",
                ENV_BACKEND, other
            ))),
        }
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    Pretty,
    Json,
}

impl FromStr for LogFormat {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "pretty" => Ok(LogFormat::Pretty),
            "json" => Ok(LogFormat::Json),
            other => Err(AppError::Config(format!(
                "{} must be 'pretty' or 'json', got '{}'",
                ENV_LOG_FORMAT, other
            ))),
        }
    }
}

/// Represents the configuration of the chat runtime.
#[derive(Debug, Clone, Validate)]
pub struct ChatConfig {
    /// Artificial typing delay before each reply, in milliseconds.
    #[validate(range(max = 60000))]
    pub reply_delay_ms: u64,
    /// Which backend produces replies.
    pub backend: BackendKind,
    /// Endpoint of the remote service. Required for the remote backend.
    pub remote_url: Option<Url>,
    /// Optional bearer token for the remote service.
    pub remote_token: Option<String>,
    /// Timeout for one remote request, in seconds.
    #[validate(range(min = 1, max = 300))]
    pub request_timeout_secs: u64,
    /// JSON rule table replacing the built-in one.
    pub rules_path: Option<PathBuf>,
    /// First bot message of every session.
    #[validate(length(min = 1))]
    pub greeting: String,
    pub log_format: LogFormat,
    /// The `.env` file that was applied by [`ChatConfig::load`], if any.
    pub env_file: Option<PathBuf>,
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            reply_delay_ms: DEFAULT_REPLY_DELAY.as_millis() as u64,
            backend: BackendKind::Local,
            remote_url: None,
            remote_token: None,
            request_timeout_secs: DEFAULT_REQUEST_TIMEOUT_SECS,
            rules_path: None,
            greeting: DEFAULT_GREETING.to_string(),
            log_format: LogFormat::Pretty,
            env_file: None,
        }
    }
}

/// Reads a variable, treating unset and blank the same way.
fn var(name: &str) -> Option<String> {
    env::var(name)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn parse_u64(name: &str, default: u64) -> Result<u64, AppError> {
    match var(name) {
        Some(raw) => raw
            .parse()
            .map_err(|_| AppError::Config(format!("{} must be an integer, got '{}'", name, raw))),
        None => Ok(default),
    }
}

impl ChatConfig {
    /// Loads `.env` (if present) and then reads the environment.
    ///
    /// The applied file is recorded in `env_file`; logging is usually not
    /// installed yet at this point.
    pub fn load() -> Result<Self, AppError> {
        let env_file = dotenv::dotenv().ok();
        Ok(Self {
            env_file,
            ..Self::from_env()?
        })
    }

    /// Reads the configuration from environment variables only.
    pub fn from_env() -> Result<Self, AppError> {
        let defaults = Self::default();

        let backend = match var(ENV_BACKEND) {
            Some(raw) => raw.parse()?,
            None => defaults.backend,
        };

        let remote_url = match var(ENV_REMOTE_URL) {
            Some(raw) => {
                let url = Url::parse(&raw)?;
                if !matches!(url.scheme(), "http" | "https") {
                    return Err(AppError::Config(format!(
                        "{} must be an http(s) URL, got '{}'",
                        ENV_REMOTE_URL, raw
                    )));
                }
                Some(url)
            }
            None => None,
        };

        if backend == BackendKind::Remote && remote_url.is_none() {
            return Err(AppError::Config(format!(
                "{} is required when {}=remote",
                ENV_REMOTE_URL, ENV_BACKEND
            )));
        }

        let log_format = match var(ENV_LOG_FORMAT) {
            Some(raw) => raw.parse()?,
            None => defaults.log_format,
        };

        let config = Self {
            reply_delay_ms: parse_u64(ENV_REPLY_DELAY_MS, defaults.reply_delay_ms)?,
            backend,
            remote_url,
            remote_token: var(ENV_REMOTE_TOKEN),
            request_timeout_secs: parse_u64(
                ENV_REQUEST_TIMEOUT_SECS,
                defaults.request_timeout_secs,
            )?,
            rules_path: var(ENV_RULES_PATH).map(PathBuf::from),
            greeting: var(ENV_GREETING).unwrap_or(defaults.greeting),
            log_format,
            env_file: None,
        };

        config.validate()?;
        Ok(config)
    }

    pub fn reply_delay(&self) -> Duration {
        Duration::from_millis(self.reply_delay_ms)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn session_options(&self) -> SessionOptions {
        SessionOptions {
            reply_delay: self.reply_delay(),
            greeting: self.greeting.clone(),
        }
    }

    /// The configured rule table, or the built-in one.
    pub fn rule_table(&self) -> Result<RuleTable, AppError> {
        match &self.rules_path {
            Some(path) => {
                info!("Loading rule table from {}", path.display());
                RuleTable::from_file(path)
            }
            None => Ok(RuleTable::default()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALL_VARS: [&str; 8] = [
        ENV_REPLY_DELAY_MS,
        ENV_BACKEND,
        ENV_REMOTE_URL,
        ENV_REMOTE_TOKEN,
        ENV_REQUEST_TIMEOUT_SECS,
        ENV_RULES_PATH,
        ENV_GREETING,
        ENV_LOG_FORMAT,
    ];

    /// Runs `f` with every config variable unset except `overrides`.
    fn with_env<F: FnOnce()>(overrides: &[(&str, &str)], f: F) {
        let vars: Vec<(&str, Option<&str>)> = ALL_VARS
            .iter()
            .map(|name| {
                let value = overrides
                    .iter()
                    .find(|(k, _)| k == name)
                    .map(|(_, v)| *v);
                (*name, value)
            })
            .collect();
        temp_env::with_vars(vars, f);
    }

    #[test]
    fn test_defaults() {
        with_env(&[], || {
            let config = ChatConfig::from_env().unwrap();
            assert_eq!(config.backend, BackendKind::Local);
            assert_eq!(config.reply_delay(), Duration::from_millis(1500));
            assert_eq!(config.request_timeout(), Duration::from_secs(30));
            assert_eq!(config.greeting, DEFAULT_GREETING);
            assert_eq!(config.log_format, LogFormat::Pretty);
        });
    }

    #[test]
    fn test_env_file_is_recorded_by_load_only() {
        with_env(&[], || {
            assert!(ChatConfig::from_env().unwrap().env_file.is_none());

            let config = ChatConfig::load().unwrap();
            if let Some(path) = &config.env_file {
                assert!(path.is_file());
                assert_eq!(path.file_name().unwrap(), ".env");
            }
        });
    }

    #[test]
    fn test_remote_backend() {
        with_env(
            &[
                (ENV_BACKEND, "Remote"),
                (ENV_REMOTE_URL, "https://support.example.edu/api/chat"),
                (ENV_REMOTE_TOKEN, "token"),
            ],
            || {
                let config = ChatConfig::from_env().unwrap();
                assert_eq!(config.backend, BackendKind::Remote);
                assert_eq!(config.remote_url.unwrap().path(), "/api/chat");
                assert_eq!(config.remote_token.as_deref(), Some("token"));
            },
        );
    }

    #[test]
    fn test_remote_requires_url() {
        with_env(&[(ENV_BACKEND, "remote")], || {
            assert!(matches!(ChatConfig::from_env(), Err(AppError::Config(_))));
        });
    }

    #[test]
    fn test_rejects_non_http_url() {
        with_env(&[(ENV_REMOTE_URL, "ftp://example.com/chat")], || {
            assert!(matches!(ChatConfig::from_env(), Err(AppError::Config(_))));
        });
    }

    #[test]
    fn test_rejects_malformed_numbers() {
        with_env(&[(ENV_REPLY_DELAY_MS, "soon")], || {
            assert!(matches!(ChatConfig::from_env(), Err(AppError::Config(_))));
        });
    }

    #[test]
    fn test_range_validation() {
        with_env(&[(ENV_REQUEST_TIMEOUT_SECS, "0")], || {
            assert!(matches!(ChatConfig::from_env(), Err(AppError::Config(_))));
        });
        with_env(&[(ENV_REPLY_DELAY_MS, "120000")], || {
            assert!(matches!(ChatConfig::from_env(), Err(AppError::Config(_))));
        });
    }

    #[test]
    fn test_unknown_backend_and_log_format() {
        with_env(&[(ENV_BACKEND, "cloud")], || {
            assert!(ChatConfig::from_env().is_err());
        });
        with_env(&[(ENV_LOG_FORMAT, "xml")], || {
            assert!(ChatConfig::from_env().is_err());
        });
    }

    #[test]
    fn test_session_options_follow_config() {
        with_env(&[(ENV_REPLY_DELAY_MS, "0"), (ENV_GREETING, "Hi there")], || {
            let options = ChatConfig::from_env().unwrap().session_options();
            assert!(options.reply_delay.is_zero());
            assert_eq!(options.greeting, "Hi there");
        });
    }

    #[test]
    fn test_rule_table_from_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("rules.json");
        std::fs::write(
            &path,
            r#"{"rules":[{"category":"crisis","keywords":["hopeless"],"response":"Call 988","severity":"high"}],
                "fallback":{"response":"Go on"}}"#,
        )
        .unwrap();

        let config = ChatConfig {
            rules_path: Some(path),
            ..ChatConfig::default()
        };
        let table = config.rule_table().unwrap();
        assert_eq!(table.rules()[0].keywords()[0], "hopeless");

        let missing = ChatConfig {
            rules_path: Some(dir.path().join("missing.json")),
            ..ChatConfig::default()
        };
        assert!(matches!(missing.rule_table(), Err(AppError::Io(_))));
    }
}
