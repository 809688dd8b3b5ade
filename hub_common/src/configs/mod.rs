//! # Configuration Modules
//!
//! This module aggregates the configuration consumed by the logging core.
//! Host processes layer their own CLI/env handling on top of it.

/// Provides the logging configuration and its JSON loader.
pub mod config_logging;

pub use config_logging::{CategoryPolicy, ConfigError, LoggingConfig, OverflowPolicy, Placement};
