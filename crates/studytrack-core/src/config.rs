//! Configuration module for StudyTrack.
//!
//! Provides typed configuration structs that map to the YAML configuration file,
//! with loading, validation, defaults, and a builder pattern for programmatic use.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Environment variable that overrides `api.access_token`.
pub const TOKEN_ENV_VAR: &str = "STUDYTRACK_TOKEN";

// ---------------------------------------------------------------------------
// Config struct with sub-sections
// ---------------------------------------------------------------------------

/// Top-level configuration for StudyTrack.
///
/// Missing sections fall back to their defaults, so a config file only needs
/// to list the values it changes.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub api: ApiConfig,
    pub sync: SyncConfig,
    pub storage: StorageConfig,
    pub encryption: EncryptionConfig,
    pub logging: LoggingConfig,
}

/// Backend connection settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    /// Base URL of the backend, without a trailing slash.
    pub base_url: String,
    /// Bearer token. `None` means "read it from `STUDYTRACK_TOKEN`".
    pub access_token: Option<String>,
    /// Per-request timeout in seconds.
    pub request_timeout_secs: u64,
}

/// Synchronization and locking settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SyncConfig {
    /// Seconds between periodic background syncs.
    pub interval_secs: u64,
    /// How long a higher-priority caller waits for a preempted holder to let go.
    pub lock_interrupt_wait_ms: u64,
    /// How long a caller waits for a lock holder to finish on its own.
    pub lock_natural_wait_ms: u64,
    /// Polling interval while waiting for the lock.
    pub lock_poll_ms: u64,
    /// Delay before an operation that hit lock contention is requeued.
    pub queue_retry_delay_ms: u64,
}

/// Local persistence settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Path to the SQLite database file.
    pub database: PathBuf,
    /// Key namespace inside the store (one per user profile).
    pub namespace: String,
}

/// Field encryption key location in the OS keyring.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EncryptionConfig {
    pub keyring_service: String,
    pub keyring_user: String,
}

/// Logging / tracing settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level: `trace`, `debug`, `info`, `warn`, or `error`.
    pub level: String,
    /// Emit JSON log lines instead of human-readable text.
    pub json: bool,
}

// ---------------------------------------------------------------------------
// Config::load()
// ---------------------------------------------------------------------------

impl Config {
    /// Load configuration from a YAML file at `path`.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = serde_yaml::from_str(&content)?;
        Ok(config)
    }

    /// Try to load from `path`; fall back to [`Config::default`] on any error.
    pub fn load_or_default(path: &Path) -> Self {
        Self::load(path).unwrap_or_default()
    }

    /// Platform-appropriate default path for the configuration file.
    ///
    /// Typically `$XDG_CONFIG_HOME/studytrack/config.yaml` on Linux.
    pub fn default_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("~/.config"))
            .join("studytrack")
            .join("config.yaml")
    }

    /// The access token from the config file, else from `STUDYTRACK_TOKEN`.
    pub fn resolve_access_token(&self) -> Option<String> {
        self.api
            .access_token
            .clone()
            .filter(|t| !t.is_empty())
            .or_else(|| std::env::var(TOKEN_ENV_VAR).ok().filter(|t| !t.is_empty()))
    }
}

impl SyncConfig {
    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_secs)
    }

    pub fn lock_interrupt_wait(&self) -> Duration {
        Duration::from_millis(self.lock_interrupt_wait_ms)
    }

    pub fn lock_natural_wait(&self) -> Duration {
        Duration::from_millis(self.lock_natural_wait_ms)
    }

    pub fn lock_poll(&self) -> Duration {
        Duration::from_millis(self.lock_poll_ms)
    }

    pub fn queue_retry_delay(&self) -> Duration {
        Duration::from_millis(self.queue_retry_delay_ms)
    }
}

// ---------------------------------------------------------------------------
// Defaults
// ---------------------------------------------------------------------------

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:3000".to_string(),
            access_token: None,
            request_timeout_secs: 30,
        }
    }
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            interval_secs: 300,
            lock_interrupt_wait_ms: 2_000,
            lock_natural_wait_ms: 5_000,
            lock_poll_ms: 100,
            queue_retry_delay_ms: 500,
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        let data_dir = dirs::data_local_dir()
            .unwrap_or_else(|| PathBuf::from("~/.local/share"))
            .join("studytrack");
        Self {
            database: data_dir.join("studytrack.db"),
            namespace: "default".to_string(),
        }
    }
}

impl Default for EncryptionConfig {
    fn default() -> Self {
        Self {
            keyring_service: "studytrack".to_string(),
            keyring_user: "field-encryption-key".to_string(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: false,
        }
    }
}

// ---------------------------------------------------------------------------
// Config::validate()
// ---------------------------------------------------------------------------

/// A single validation error found in the configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    /// Dotted path to the offending field, e.g. `"sync.interval_secs"`.
    pub field: String,
    /// Human-readable explanation.
    pub message: String,
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Valid values for `logging.level`.
const VALID_LOG_LEVELS: &[&str] = &["trace", "debug", "info", "warn", "error"];

impl Config {
    /// Validate the configuration and return all errors found.
    ///
    /// An empty vector means the configuration is valid.
    pub fn validate(&self) -> Vec<ValidationError> {
        let mut errors = Vec::new();

        let mut positive = |field: &str, value: u64| {
            if value == 0 {
                errors.push(ValidationError {
                    field: field.into(),
                    message: "must be greater than 0".into(),
                });
            }
        };

        // --- api ---
        positive("api.request_timeout_secs", self.api.request_timeout_secs);

        // --- sync ---
        positive("sync.interval_secs", self.sync.interval_secs);
        positive("sync.lock_interrupt_wait_ms", self.sync.lock_interrupt_wait_ms);
        positive("sync.lock_natural_wait_ms", self.sync.lock_natural_wait_ms);
        positive("sync.lock_poll_ms", self.sync.lock_poll_ms);
        positive("sync.queue_retry_delay_ms", self.sync.queue_retry_delay_ms);

        if !self.api.base_url.starts_with("http://") && !self.api.base_url.starts_with("https://")
        {
            errors.push(ValidationError {
                field: "api.base_url".into(),
                message: format!("must be an http(s) URL, got '{}'", self.api.base_url),
            });
        }

        if self.sync.lock_poll_ms > self.sync.lock_interrupt_wait_ms {
            errors.push(ValidationError {
                field: "sync.lock_poll_ms".into(),
                message: format!(
                    "lock_poll_ms ({}) must not exceed lock_interrupt_wait_ms ({})",
                    self.sync.lock_poll_ms, self.sync.lock_interrupt_wait_ms
                ),
            });
        }

        // --- storage ---
        if self.storage.namespace.trim().is_empty() {
            errors.push(ValidationError {
                field: "storage.namespace".into(),
                message: "must not be empty".into(),
            });
        }

        // --- encryption ---
        if self.encryption.keyring_service.is_empty() || self.encryption.keyring_user.is_empty() {
            errors.push(ValidationError {
                field: "encryption".into(),
                message: "keyring_service and keyring_user must not be empty".into(),
            });
        }

        // --- logging ---
        if !VALID_LOG_LEVELS.contains(&self.logging.level.as_str()) {
            errors.push(ValidationError {
                field: "logging.level".into(),
                message: format!(
                    "invalid level '{}'; valid options: {}",
                    self.logging.level,
                    VALID_LOG_LEVELS.join(", ")
                ),
            });
        }

        errors
    }
}

// ---------------------------------------------------------------------------
// ConfigBuilder
// ---------------------------------------------------------------------------

/// Builder for constructing a [`Config`] programmatically.
///
/// Starts from [`Config::default`] and allows selective overrides.
///
/// # Example
///
/// ```rust,no_run
/// use studytrack_core::config::ConfigBuilder;
///
/// let config = ConfigBuilder::new()
///     .api_base_url("https://tracker.example.com")
///     .sync_interval_secs(120)
///     .logging_level("debug")
///     .build();
/// ```
#[derive(Debug, Clone)]
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    /// Create a new builder initialised with [`Config::default`] values.
    pub fn new() -> Self {
        Self {
            config: Config::default(),
        }
    }

    // --- api ---

    pub fn api_base_url(mut self, url: impl Into<String>) -> Self {
        self.config.api.base_url = url.into();
        self
    }

    pub fn api_access_token(mut self, token: impl Into<String>) -> Self {
        self.config.api.access_token = Some(token.into());
        self
    }

    pub fn api_request_timeout_secs(mut self, seconds: u64) -> Self {
        self.config.api.request_timeout_secs = seconds;
        self
    }

    // --- sync ---

    pub fn sync_interval_secs(mut self, seconds: u64) -> Self {
        self.config.sync.interval_secs = seconds;
        self
    }

    pub fn sync_lock_waits_ms(mut self, interrupt: u64, natural: u64, poll: u64) -> Self {
        self.config.sync.lock_interrupt_wait_ms = interrupt;
        self.config.sync.lock_natural_wait_ms = natural;
        self.config.sync.lock_poll_ms = poll;
        self
    }

    pub fn sync_queue_retry_delay_ms(mut self, ms: u64) -> Self {
        self.config.sync.queue_retry_delay_ms = ms;
        self
    }

    // --- storage ---

    pub fn storage_database(mut self, path: PathBuf) -> Self {
        self.config.storage.database = path;
        self
    }

    pub fn storage_namespace(mut self, namespace: impl Into<String>) -> Self {
        self.config.storage.namespace = namespace.into();
        self
    }

    // --- logging ---

    pub fn logging_level(mut self, level: impl Into<String>) -> Self {
        self.config.logging.level = level.into();
        self
    }

    pub fn logging_json(mut self, json: bool) -> Self {
        self.config.logging.json = json;
        self
    }

    // --- build ---

    /// Consume the builder and return the finished [`Config`].
    pub fn build(self) -> Config {
        self.config
    }

    /// Build and validate in one step. Returns `Err` with the list of
    /// validation errors if the configuration is invalid.
    pub fn build_validated(self) -> Result<Config, Vec<ValidationError>> {
        let config = self.build();
        let errors = config.validate();
        if errors.is_empty() {
            Ok(config)
        } else {
            Err(errors)
        }
    }
}

impl Default for ConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------
