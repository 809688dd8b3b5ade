//! # Categorized Asynchronous Logging
//!
//! One file-backed logger per [`LogCategory`], created on first use by a
//! [`LoggerRegistry`] and fed through a bounded queue so producers never wait
//! on disk I/O, only on queue capacity.
//!
//! ```text
//!  producers ──write()──▶ [ bounded queue (200) ] ──relay──▶ LogSink
//!                                                           ├─ <dir>/DMRHub.<category>.log
//!                                                           └─ stderr (error category)
//! ```
//!
//! ## Usage
//!
//! ```ignore
//! use hub_common::{LogCategory, LoggerRegistry, LoggingConfig};
//!
//! let registry = Arc::new(LoggerRegistry::new(LoggingConfig::default())?);
//! let access = registry.get(LogCategory::Access);
//! access.write("hub::accept", "repeater 311000 connected").await;
//! hub_common::hub_log!(registry.get(LogCategory::Error), "peer {} timed out", peer).await;
//!
//! // once, at exit, after producers have stopped
//! registry.close_all().await;
//! ```

/// In-memory real-time stream for tests and diagnostics.
pub mod capture;
/// Caller tag helpers behind the `caller!` and `hub_log!` macros.
pub mod caller_tag;
/// The closed set of log categories.
pub mod category;
/// Per-category producer handle and its relay.
pub mod category_logger;
/// Sink and registry errors.
pub mod error;
/// Category table and shutdown.
pub mod registry;
/// Log file resolution, fallback and mirroring.
pub mod sink;

pub use capture::MemoryStream;
pub use category::LogCategory;
pub use category_logger::{CategoryLogger, RelayReport};
pub use error::{LoggerError, SinkError};
pub use registry::{LoggerRegistry, LoggerRegistryBuilder};
pub use sink::{LogSink, SinkLocation, StreamMirror};
