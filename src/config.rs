//! Application-level configuration loading.

use std::{env, fs, io::ErrorKind, path::PathBuf, time::Duration};

use serde::Deserialize;
use serde_with::{DurationMilliSeconds, DurationSeconds, serde_as};
use tracing::{info, warn};
use uuid::Uuid;

use crate::engine::EngineOptions;

/// Default location on disk where the server looks for the JSON configuration.
const DEFAULT_CONFIG_PATH: &str = "config/app.json";
/// Environment variable that overrides [`DEFAULT_CONFIG_PATH`].
const CONFIG_PATH_ENV: &str = "QUIZ_BACK_CONFIG_PATH";
const DEFAULT_PUBLIC_BASE_URL: &str = "http://localhost:8080";
const DEFAULT_STORE_DIRECTORY: &str = "data/quizzes";

/// Which quiz store backend to install at startup.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum StoreConfig {
    /// Keep quizzes in process memory only.
    Memory,
    /// One JSON document per quiz under `path`.
    File {
        /// Directory holding the documents.
        path: PathBuf,
    },
}

impl Default for StoreConfig {
    fn default() -> Self {
        if cfg!(feature = "file-store") {
            StoreConfig::File {
                path: PathBuf::from(DEFAULT_STORE_DIRECTORY),
            }
        } else {
            StoreConfig::Memory
        }
    }
}

#[derive(Debug, Clone)]
/// Immutable runtime configuration shared across the application.
pub struct AppConfig {
    reveal_delay: Duration,
    tick_interval: Duration,
    auto_advance: bool,
    fast_forward_when_all_answered: bool,
    public_base_url: String,
    store: StoreConfig,
}

impl AppConfig {
    /// Load the application configuration from disk, falling back to built-in defaults.
    pub fn load() -> Self {
        let path = resolve_config_path();
        match fs::read_to_string(&path) {
            Ok(contents) => match Self::from_json(&contents) {
                Ok(app_config) => {
                    info!(
                        path = %path.display(),
                        store = ?app_config.store,
                        "loaded configuration"
                    );
                    app_config
                }
                Err(err) => {
                    warn!(
                        path = %path.display(),
                        error = %err,
                        "failed to parse config; falling back to defaults"
                    );
                    Self::default()
                }
            },
            Err(err) if err.kind() == ErrorKind::NotFound => {
                info!(
                    path = %path.display(),
                    "config file not found; using built-in defaults"
                );
                Self::default()
            }
            Err(err) => {
                warn!(
                    path = %path.display(),
                    error = %err,
                    "failed to read config; falling back to defaults"
                );
                Self::default()
            }
        }
    }

    /// Parse a configuration document. Missing keys take their default.
    pub fn from_json(contents: &str) -> serde_json::Result<Self> {
        serde_json::from_str::<RawConfig>(contents).map(Into::into)
    }

    /// Engine tunables derived from the configuration.
    pub fn engine_options(&self) -> EngineOptions {
        EngineOptions {
            reveal_delay: self.reveal_delay,
            auto_advance: self.auto_advance,
            fast_forward_when_all_answered: self.fast_forward_when_all_answered,
        }
    }

    /// Period of the per-session clock task.
    pub fn tick_interval(&self) -> Duration {
        self.tick_interval
    }

    /// Storage backend selection.
    pub fn store(&self) -> &StoreConfig {
        &self.store
    }

    /// Link players open to join `quiz_id`.
    pub fn join_url(&self, quiz_id: Uuid) -> String {
        format!(
            "{}/join?quiz={}",
            self.public_base_url.trim_end_matches('/'),
            quiz_id
        )
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        RawConfig::default().into()
    }
}

#[serde_as]
#[derive(Debug, Deserialize)]
#[serde(default)]
/// JSON representation of the configuration file located at [`DEFAULT_CONFIG_PATH`].
struct RawConfig {
    #[serde_as(as = "DurationSeconds<u64>")]
    #[serde(rename = "reveal_delay_secs")]
    reveal_delay: Duration,
    #[serde_as(as = "DurationMilliSeconds<u64>")]
    #[serde(rename = "tick_interval_ms")]
    tick_interval: Duration,
    auto_advance: bool,
    fast_forward_when_all_answered: bool,
    public_base_url: String,
    store: StoreConfig,
}

impl Default for RawConfig {
    fn default() -> Self {
        let engine = EngineOptions::default();
        Self {
            reveal_delay: engine.reveal_delay,
            tick_interval: Duration::from_millis(1_000),
            auto_advance: engine.auto_advance,
            fast_forward_when_all_answered: engine.fast_forward_when_all_answered,
            public_base_url: DEFAULT_PUBLIC_BASE_URL.into(),
            store: StoreConfig::default(),
        }
    }
}

impl From<RawConfig> for AppConfig {
    fn from(value: RawConfig) -> Self {
        Self {
            reveal_delay: value.reveal_delay,
            // A zero period would make the clock task spin.
            tick_interval: value.tick_interval.max(Duration::from_millis(10)),
            auto_advance: value.auto_advance,
            fast_forward_when_all_answered: value.fast_forward_when_all_answered,
            public_base_url: value.public_base_url,
            store: value.store,
        }
    }
}

/// Resolve the configuration path taking the environment override into account.
fn resolve_config_path() -> PathBuf {
    env::var_os(CONFIG_PATH_ENV)
        .map(PathBuf::from)
        .filter(|path| !path.as_os_str().is_empty())
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_document_uses_defaults() {
        let config = AppConfig::from_json("{}").unwrap();
        assert_eq!(config.engine_options(), EngineOptions::default());
        assert_eq!(config.tick_interval(), Duration::from_secs(1));
        assert_eq!(config.store(), &StoreConfig::default());
    }

    #[test]
    fn durations_and_store_are_parsed() {
        let config = AppConfig::from_json(
            r#"{
                "reveal_delay_secs": 5,
                "tick_interval_ms": 250,
                "fast_forward_when_all_answered": false,
                "public_base_url": "https://quiz.example/",
                "store": { "kind": "file", "path": "/var/lib/quiz" }
            }"#,
        )
        .unwrap();

        let options = config.engine_options();
        assert_eq!(options.reveal_delay, Duration::from_secs(5));
        assert!(!options.fast_forward_when_all_answered);
        assert_eq!(config.tick_interval(), Duration::from_millis(250));
        assert_eq!(
            config.store(),
            &StoreConfig::File {
                path: PathBuf::from("/var/lib/quiz")
            }
        );
        assert_eq!(
            config.join_url(Uuid::nil()),
            "https://quiz.example/join?quiz=00000000-0000-0000-0000-000000000000"
        );
    }

    #[test]
    fn memory_store_needs_no_path() {
        let config = AppConfig::from_json(r#"{ "store": { "kind": "memory" } }"#).unwrap();
        assert_eq!(config.store(), &StoreConfig::Memory);
    }

    #[test]
    fn malformed_document_is_an_error() {
        assert!(AppConfig::from_json(r#"{ "reveal_delay_secs": "soon" }"#).is_err());
    }
}
