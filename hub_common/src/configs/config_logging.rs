use std::collections::BTreeMap;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use chrono::format::{Item, StrftimeItems};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::loggers::category::LogCategory;

/// Application name used for the system log directory and every log file name.
pub const DEFAULT_APP_NAME: &str = "DMRHub";

/// Preferred log directory on server-style operating systems.
pub const DEFAULT_SYSTEM_LOG_DIR: &str = "/var/log/DMRHub";

/// Number of pending lines a category queue holds before producers are throttled.
pub const DEFAULT_QUEUE_CAPACITY: usize = 200;

/// `log.LstdFlags`-style stamp: `2009/01/23 01:23:23`.
pub const DEFAULT_TIMESTAMP_FORMAT: &str = "%Y/%m/%d %H:%M:%S";

#[derive(Debug, Error)]
/// # Config Error
///
/// Errors raised while loading or validating a [`LoggingConfig`].
pub enum ConfigError {
    /// The configuration file could not be read.
    #[error("I/O error reading {path}: {source}")]
    Io {
        /// File that failed to load.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// The configuration text is not valid JSON for this schema.
    #[error("Failed to parse logging configuration: {0}")]
    Parse(#[from] serde_json::Error),

    /// The configuration parsed but describes something unusable.
    #[error("Invalid logging configuration: {0}")]
    Invalid(String),

    /// A category name that is not part of the closed category set.
    #[error("Unknown log category `{0}`")]
    UnknownCategory(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
/// # Placement
///
/// Where a category's log file should live.
pub enum Placement {
    /// `System` on server-style operating systems, `Local` on desktop ones.
    #[default]
    Auto,
    /// The system log directory, falling back to the local directory.
    System,
    /// Always the local directory.
    Local,
}

impl Placement {
    /// Collapses `Auto` into the concrete placement for the running OS.
    pub fn effective(self) -> Placement {
        match self {
            Placement::Auto if cfg!(any(target_os = "windows", target_os = "macos")) => Placement::Local,
            Placement::Auto => Placement::System,
            other => other,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
/// # Overflow Policy
///
/// What a producer experiences when its category queue is full.
pub enum OverflowPolicy {
    /// Suspend the producer until the relay frees a slot. Nothing is lost.
    #[default]
    Block,
    /// Discard the new line and count it. Opt-in only.
    DropNewest,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
/// # Category Policy
///
/// Routing rules registered for one log category.
pub struct CategoryPolicy {
    /// Duplicate every line onto the real-time stream (stderr by default).
    pub mirror_to_stream: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
/// # Logging Config
///
/// Everything the [`LoggerRegistry`](crate::loggers::LoggerRegistry) needs to
/// resolve sinks and size its queues. Every field has a default, so a config
/// file only has to mention what it changes.
pub struct LoggingConfig {
    /// Used as `<app_name>.<category>.log`.
    pub app_name: String,
    /// Preferred directory for `Placement::System`.
    pub system_log_dir: PathBuf,
    /// Fallback directory (the working directory by default).
    pub local_log_dir: PathBuf,
    /// Where log files should be created.
    pub placement: Placement,
    /// Pending lines per category queue. Must be greater than zero.
    pub queue_capacity: usize,
    /// Behaviour of a full queue.
    pub overflow: OverflowPolicy,
    /// `chrono` format string prefixed to every line; empty disables it.
    pub timestamp_format: String,
    /// Paint mirrored lines red on the real-time stream.
    pub color_stream: bool,
    /// Registered categories and their routing policy.
    pub categories: BTreeMap<LogCategory, CategoryPolicy>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        let mut categories = BTreeMap::new();
        categories.insert(LogCategory::Access, CategoryPolicy { mirror_to_stream: false });
        categories.insert(LogCategory::Error, CategoryPolicy { mirror_to_stream: true });

        Self {
            app_name: DEFAULT_APP_NAME.to_string(),
            system_log_dir: PathBuf::from(DEFAULT_SYSTEM_LOG_DIR),
            local_log_dir: PathBuf::from("."),
            placement: Placement::Auto,
            queue_capacity: DEFAULT_QUEUE_CAPACITY,
            overflow: OverflowPolicy::Block,
            timestamp_format: DEFAULT_TIMESTAMP_FORMAT.to_string(),
            color_stream: false,
            categories,
        }
    }
}

impl LoggingConfig {
    /// Parses a JSON document, filling unspecified fields with defaults, and validates it.
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let config: LoggingConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Reads and parses a JSON configuration file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json_str(&text)
    }

    /// Rejects configurations the registry cannot run with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.app_name.trim().is_empty() {
            return Err(ConfigError::Invalid("appName must not be empty".to_string()));
        }
        if self.app_name.contains(['/', '\\']) {
            return Err(ConfigError::Invalid(format!(
                "appName `{}` must not contain path separators",
                self.app_name
            )));
        }
        if self.queue_capacity == 0 {
            return Err(ConfigError::Invalid("queueCapacity must be greater than zero".to_string()));
        }
        if StrftimeItems::new(&self.timestamp_format).any(|item| matches!(item, Item::Error)) {
            return Err(ConfigError::Invalid(format!(
                "timestampFormat `{}` is not a valid strftime format",
                self.timestamp_format
            )));
        }
        Ok(())
    }

    /// File name for a category: `<app_name>.<category>.log`.
    pub fn file_name(&self, category: LogCategory) -> String {
        format!("{}.{}.log", self.app_name, category)
    }

    /// The registered policy for `category`, if any.
    pub fn policy(&self, category: LogCategory) -> Option<CategoryPolicy> {
        self.categories.get(&category).copied()
    }
}

impl fmt::Display for LoggingConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let categories: Vec<String> = self.categories.keys().map(|c| c.to_string()).collect();
        write!(
            f,
            "LoggingConfig
    App name: {},
    System dir: {},
    Local dir: {},
    Placement: {:?},
    Queue capacity: {},
    Overflow: {:?},
    Categories: {}
",
            self.app_name,
            self.system_log_dir.display(),
            self.local_log_dir.display(),
            self.placement,
            self.queue_capacity,
            self.overflow,
            categories.join(", ")
        )
    }
}
