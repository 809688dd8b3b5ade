//! # Logger Registry
//!
//! The lifecycle-scoped table of category loggers. A host process builds one
//! registry at start-up, passes it (usually as `Arc<LoggerRegistry>`) to the
//! code that logs, and calls [`LoggerRegistry::close_all`] once on the way out.
//!
//! The table is guarded by a single mutex that stays held while a missing
//! logger's sink is resolved, so concurrent first requests for a category
//! open exactly one file.

use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use tokio::runtime::Handle;
use tracing_subscriber::fmt::writer::BoxMakeWriter;
use tracing_subscriber::fmt::MakeWriter;

use super::category::LogCategory;
use super::category_logger::{CategoryLogger, RelayReport};
use super::error::{LoggerError, SinkError};
use super::sink::{LogSink, StreamMirror};
use crate::configs::LoggingConfig;

/// # Logger Registry
///
/// Maps each [`LogCategory`] to its [`CategoryLogger`] singleton.
pub struct LoggerRegistry {
    config: LoggingConfig,
    runtime: Handle,
    stream: Arc<BoxMakeWriter>,
    loggers: Mutex<HashMap<LogCategory, Arc<CategoryLogger>>>,
    opened_sinks: AtomicUsize,
    closed: AtomicBool,
}

impl LoggerRegistry {
    /// Builds a registry on the current tokio runtime, mirroring to stderr.
    pub fn new(config: LoggingConfig) -> Result<Self, LoggerError> {
        Self::builder(config).build()
    }

    /// Starts a builder for a registry with a custom runtime or stream.
    pub fn builder(config: LoggingConfig) -> LoggerRegistryBuilder {
        LoggerRegistryBuilder {
            config,
            runtime: None,
            stream: None,
        }
    }

    /// The configuration this registry was built with.
    pub fn config(&self) -> &LoggingConfig {
        &self.config
    }

    /// Returns the logger for `category`, creating it on first use.
    ///
    /// If no log destination can be opened at all, the process cannot go on:
    /// the failure is reported on stderr and the process exits with status 1.
    ///
    /// # Panics
    ///
    /// See [`try_get`](Self::try_get).
    pub fn get(&self, category: LogCategory) -> Arc<CategoryLogger> {
        match self.try_get(category) {
            Ok(logger) => logger,
            Err(err) => {
                tracing::error!(%category, error = %err, "no writable log destination");
                eprintln!("Failed to create log file for `{category}`: {err}");
                std::process::exit(1);
            }
        }
    }

    /// Like [`get`](Self::get), but hands a fatal sink failure back to the caller.
    ///
    /// # Panics
    ///
    /// - `category` has no policy in the configuration;
    /// - the registry has already been shut down.
    ///
    /// Both are defects in the calling code, not runtime conditions.
    pub fn try_get(&self, category: LogCategory) -> Result<Arc<CategoryLogger>, SinkError> {
        let mut loggers = self.loggers.lock().unwrap_or_else(PoisonError::into_inner);

        if self.closed.load(Ordering::Acquire) {
            panic!("log category `{category}` requested after shutdown");
        }
        if let Some(logger) = loggers.get(&category) {
            return Ok(Arc::clone(logger));
        }

        let Some(policy) = self.config.policy(category) else {
            panic!("log category `{category}` has no registered sink policy");
        };

        let stream = policy
            .mirror_to_stream
            .then(|| StreamMirror::new(Arc::clone(&self.stream), self.config.color_stream));
        let sink = LogSink::open(&self.config, category, stream)?;
        self.opened_sinks.fetch_add(1, Ordering::Relaxed);

        let logger = Arc::new(CategoryLogger::start(
            sink,
            self.config.queue_capacity,
            self.config.overflow,
            self.config.timestamp_format.clone(),
            &self.runtime,
        ));
        loggers.insert(category, Arc::clone(&logger));
        Ok(logger)
    }

    /// Number of sinks opened over the registry's lifetime.
    pub fn opened_sinks(&self) -> usize {
        self.opened_sinks.load(Ordering::Relaxed)
    }

    /// Categories that currently have a live logger.
    pub fn active_categories(&self) -> Vec<LogCategory> {
        let loggers = self.loggers.lock().unwrap_or_else(PoisonError::into_inner);
        let mut categories: Vec<LogCategory> = loggers.keys().copied().collect();
        categories.sort();
        categories
    }

    /// Closes every queue, waits for each relay to drain and close its file,
    /// and returns what the relays did.
    ///
    /// Call once, after producers have been told to stop. A second call finds
    /// nothing left to close and returns an empty list.
    pub async fn close_all(&self) -> Vec<RelayReport> {
        let loggers: Vec<Arc<CategoryLogger>> = {
            let mut table = self.loggers.lock().unwrap_or_else(PoisonError::into_inner);
            self.closed.store(true, Ordering::Release);
            table.drain().map(|(_, logger)| logger).collect()
        };

        let relays: Vec<_> = loggers.iter().filter_map(|logger| logger.close()).collect();

        let mut reports = Vec::with_capacity(relays.len());
        for relay in relays {
            match relay.await {
                Ok(report) => reports.push(report),
                Err(err) => eprintln!("Log relay ended abnormally: {err}"),
            }
        }
        reports.sort_by_key(|report| report.category);
        tracing::debug!(relays = reports.len(), "log registry closed");
        reports
    }
}

impl fmt::Debug for LoggerRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoggerRegistry")
            .field("app_name", &self.config.app_name)
            .field("active", &self.active_categories())
            .field("opened_sinks", &self.opened_sinks())
            .field("closed", &self.closed.load(Ordering::Relaxed))
            .finish()
    }
}

/// # Logger Registry Builder
///
/// Returned by [`LoggerRegistry::builder`].
pub struct LoggerRegistryBuilder {
    config: LoggingConfig,
    runtime: Option<Handle>,
    stream: Option<BoxMakeWriter>,
}

impl LoggerRegistryBuilder {
    /// Runs relays on `handle` instead of the current runtime.
    pub fn runtime(mut self, handle: Handle) -> Self {
        self.runtime = Some(handle);
        self
    }

    /// Replaces stderr as the real-time stream for mirrored categories.
    pub fn stream<M>(mut self, make_writer: M) -> Self
    where
        M: for<'a> MakeWriter<'a> + Send + Sync + 'static,
    {
        self.stream = Some(BoxMakeWriter::new(make_writer));
        self
    }

    /// Validates the configuration and builds the registry.
    pub fn build(self) -> Result<LoggerRegistry, LoggerError> {
        self.config.validate()?;
        let runtime = match self.runtime {
            Some(handle) => handle,
            None => Handle::try_current()?,
        };
        let stream = self
            .stream
            .unwrap_or_else(|| BoxMakeWriter::new(std::io::stderr));

        Ok(LoggerRegistry {
            config: self.config,
            runtime,
            stream: Arc::new(stream),
            loggers: Mutex::new(HashMap::new()),
            opened_sinks: AtomicUsize::new(0),
            closed: AtomicBool::new(false),
        })
    }
}
