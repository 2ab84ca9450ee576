use std::time::Duration;

use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};

use crate::error::AppError;

/// Runtime settings for the sync service and its HTTP surface.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    /// Base URL of the remote index API, credentials included
    /// (e.g. `http://:secret@example.api.searchify.com`).
    #[serde(default)]
    pub api_url: String,
    /// Name of the remote index pages are written to.
    #[serde(default)]
    pub index: String,
    /// Create the index on demand when it is not listed remotely.
    #[serde(default)]
    pub make_index: bool,
    /// Scan declared rich-text fields in addition to the body content.
    #[serde(default)]
    pub discover: bool,
    /// Page types taking part in the blacklist check.
    #[serde(default)]
    pub page_blacklist: Option<Vec<String>>,
    #[serde(default)]
    pub readiness: ReadinessSettings,
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
    #[serde(default = "default_bind_addr")]
    pub bind_addr: String,
    #[serde(default = "default_mongodb_uri")]
    pub mongodb_uri: String,
    #[serde(default = "default_mongodb_database")]
    pub mongodb_database: String,
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

/// Backoff used while waiting for a freshly created index to start.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReadinessSettings {
    #[serde(default = "default_initial_delay_ms")]
    pub initial_delay_ms: u64,
    #[serde(default = "default_max_delay_ms")]
    pub max_delay_ms: u64,
    #[serde(default = "default_max_attempts")]
    pub max_attempts: usize,
}

impl ReadinessSettings {
    pub fn initial_delay(&self) -> Duration {
        Duration::from_millis(self.initial_delay_ms)
    }

    pub fn max_delay(&self) -> Duration {
        Duration::from_millis(self.max_delay_ms)
    }
}

impl Default for ReadinessSettings {
    fn default() -> Self {
        Self {
            initial_delay_ms: default_initial_delay_ms(),
            max_delay_ms: default_max_delay_ms(),
            max_attempts: default_max_attempts(),
        }
    }
}

fn default_initial_delay_ms() -> u64 {
    1000
}

fn default_max_delay_ms() -> u64 {
    8000
}

fn default_max_attempts() -> usize {
    10
}

fn default_request_timeout_secs() -> u64 {
    30
}

fn default_bind_addr() -> String {
    "127.0.0.1:3000".to_string()
}

fn default_mongodb_uri() -> String {
    "mongodb://localhost:27017".to_string()
}

fn default_mongodb_database() -> String {
    "searchify".to_string()
}

fn default_log_level() -> String {
    "searchify=info,tower_http=info".to_string()
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            api_url: String::new(),
            index: String::new(),
            make_index: false,
            discover: false,
            page_blacklist: None,
            readiness: ReadinessSettings::default(),
            request_timeout_secs: default_request_timeout_secs(),
            bind_addr: default_bind_addr(),
            mongodb_uri: default_mongodb_uri(),
            mongodb_database: default_mongodb_database(),
            log_level: default_log_level(),
        }
    }
}

impl Settings {
    /// Load settings with layered precedence:
    /// 1. Built-in defaults
    /// 2. `searchify.{toml,yaml,json}` in the working directory
    /// 3. CLI-specified config file (optional)
    /// 4. Environment variables (`SEARCHIFY_API_URL`, `SEARCHIFY_READINESS__MAX_ATTEMPTS`, ...)
    ///
    /// The result is not validated; call [`Settings::validate`] before use.
    pub fn load(cli_config_path: Option<&str>) -> Result<Self, AppError> {
        let mut builder =
            Config::builder().add_source(File::with_name("searchify").required(false));

        if let Some(path) = cli_config_path {
            builder = builder.add_source(File::with_name(path).required(true));
        }

        builder = builder.add_source(
            Environment::with_prefix("SEARCHIFY")
                .prefix_separator("_")
                .separator("__")
                .list_separator(",")
                .with_list_parse_key("page_blacklist")
                .try_parsing(true),
        );

        let config = builder
            .build()
            .map_err(|e| AppError::Config(e.to_string()))?;

        config
            .try_deserialize()
            .map_err(|e| AppError::Config(e.to_string()))
    }

    /// Reject settings the service cannot start with.
    pub fn validate(&self) -> Result<(), AppError> {
        if self.api_url.trim().is_empty() {
            return Err(AppError::Config(
                "You must define SEARCHIFY_API_URL (or api_url)".into(),
            ));
        }

        url::Url::parse(&self.api_url)
            .map_err(|e| AppError::Config(format!("Invalid api_url '{}': {e}", self.api_url)))?;

        if self.index.trim().is_empty() {
            return Err(AppError::Config(
                "You must define an index for searchify to use".into(),
            ));
        }

        if self.readiness.max_attempts == 0 {
            return Err(AppError::Config(
                "readiness.max_attempts must be at least 1".into(),
            ));
        }

        Ok(())
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}
