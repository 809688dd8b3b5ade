use anyhow::{Context, Result};
use clap::Parser;
use hub_common::LoggingConfig;
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::IsTerminal;
use std::path::{Path, PathBuf};

const DEFAULT_CONFIG_FILE: &str = "server_hub.conf";

#[derive(Parser, Deserialize, Serialize, Debug, Clone, Default, PartialEq)]
#[clap(about = "DMRHub repeater hub", version)]
#[serde(rename_all = "camelCase")]
pub struct HubConfig {
    #[clap(long, env = "DMRHUB_CONFIG_PATH", help = "Path to the JSON configuration file.")]
    pub config_path: Option<PathBuf>,

    #[clap(long, env = "DMRHUB_LOG_DIR", help = "Preferred directory for category log files.")]
    pub log_dir: Option<PathBuf>,

    #[clap(long, env = "DMRHUB_LOCAL_LOG_DIR", help = "Fallback directory when the preferred one is unusable.")]
    pub local_log_dir: Option<PathBuf>,

    #[clap(long, env = "DMRHUB_LOG_LEVEL", help = "Diagnostics level (trace, debug, info, warn, error) when RUST_LOG is unset.")]
    pub log_level: Option<String>,

    #[clap(long, env = "DMRHUB_QUEUE_CAPACITY", help = "Pending lines per log category before producers are throttled.")]
    pub queue_capacity: Option<usize>,
}

impl HubConfig {
    // 'other' wins wherever it has a value
    fn merge(self, other: HubConfig) -> HubConfig {
        HubConfig {
            config_path: other.config_path.or(self.config_path),
            log_dir: other.log_dir.or(self.log_dir),
            local_log_dir: other.local_log_dir.or(self.local_log_dir),
            log_level: other.log_level.or(self.log_level),
            queue_capacity: other.queue_capacity.or(self.queue_capacity),
        }
    }

    fn defaults() -> HubConfig {
        let logging = LoggingConfig::default();
        HubConfig {
            config_path: None,
            log_dir: Some(logging.system_log_dir),
            local_log_dir: Some(logging.local_log_dir),
            log_level: Some("info".to_string()),
            queue_capacity: Some(logging.queue_capacity),
        }
    }

    /// Level used for the diagnostics subscriber.
    pub fn log_level(&self) -> &str {
        self.log_level.as_deref().unwrap_or("info")
    }

    /// The logging core configuration this host runs with.
    pub fn logging(&self) -> Result<LoggingConfig> {
        let mut logging = LoggingConfig::default();
        if let Some(dir) = &self.log_dir {
            logging.system_log_dir = dir.clone();
        }
        if let Some(dir) = &self.local_log_dir {
            logging.local_log_dir = dir.clone();
        }
        if let Some(capacity) = self.queue_capacity {
            logging.queue_capacity = capacity;
        }
        logging.color_stream = std::io::stderr().is_terminal();
        logging.validate()?;
        Ok(logging)
    }
}

pub fn load_config() -> Result<HubConfig> {
    load_config_from(HubConfig::parse())
}

/// Defaults, then the JSON file, then CLI/env.
pub fn load_config_from(cli: HubConfig) -> Result<HubConfig> {
    let config_file_path = cli
        .config_path
        .clone()
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_FILE));

    let mut current_config = HubConfig::defaults();
    if let Some(file_config) = read_config_file(&config_file_path)? {
        current_config = current_config.merge(file_config);
    }

    Ok(current_config.merge(cli))
}

fn read_config_file(path: &Path) -> Result<Option<HubConfig>> {
    if !path.exists() {
        return Ok(None);
    }
    let text = fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;
    let config = serde_json::from_str::<HubConfig>(&text)
        .with_context(|| format!("Failed to parse config file: {}", path.display()))?;
    Ok(Some(config))
}
