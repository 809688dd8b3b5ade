//! # hub_common
//!
//! Shared building blocks for the DMRHub repeater hub. The heart of the crate
//! is the categorized logging core in [`loggers`]; the remaining folders are
//! small, feature-gated helpers used by the host processes in `servers`.

#![forbid(unsafe_code)]
#![warn(missing_docs, rust_2018_idioms, unused_qualifications)]

/// Logging configuration (serde/JSON backed).
#[cfg(feature = "loggers")]
pub mod configs;

/// Per-category asynchronous file loggers, their sinks and the registry that owns them.
#[cfg(feature = "loggers")]
pub mod loggers;

/// Command tokens of the Homebrew repeater protocol.
#[cfg(feature = "protocol")]
pub mod protocol;

/// Span attribute hook for the HTTP layer.
#[cfg(feature = "telemetry")]
pub mod telemetry;

// Re-export the everyday entry points
#[cfg(feature = "loggers")]
pub use configs::config_logging::{CategoryPolicy, LoggingConfig, OverflowPolicy, Placement};
#[cfg(feature = "loggers")]
pub use loggers::{CategoryLogger, LogCategory, LoggerRegistry, RelayReport};
