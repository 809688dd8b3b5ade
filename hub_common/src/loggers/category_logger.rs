//! # Category Logger and Relay
//!
//! Every category gets one [`CategoryLogger`]: the sending half of a bounded
//! queue plus a relay running on the runtime's blocking pool. The relay is
//! the only owner of the category's [`LogSink`]; producers never touch I/O.
//!
//! ## Backpressure
//!
//! With [`OverflowPolicy::Block`] (the default) a producer that finds the
//! queue full is suspended until the relay dequeues a line. A slow disk
//! therefore throttles producers instead of losing lines.
//!
//! ## Shutdown
//!
//! [`CategoryLogger::close`] drops the logger's own sender. Producers that are
//! already suspended on a full queue still hold a clone, so their lines are
//! accepted too; once the last clone is gone the relay drains the queue,
//! flushes the file and exits with a [`RelayReport`].

use std::fmt::{self, Write as _};
use std::future::Future;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, PoisonError, RwLock};

use chrono::Local;
use tokio::runtime::Handle;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use super::category::LogCategory;
use super::sink::{LogSink, SinkLocation};
use crate::configs::OverflowPolicy;

/// # Relay Report
///
/// What one relay did between start-up and shutdown.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelayReport {
    /// Category the relay served.
    pub category: LogCategory,
    /// File the relay wrote to.
    pub path: PathBuf,
    /// Location the file was resolved to.
    pub location: SinkLocation,
    /// Lines written successfully.
    pub written: u64,
    /// Lines whose write failed.
    pub failed: u64,
}

/// # Category Logger
///
/// The producer-facing handle for one log category. Shared as
/// `Arc<CategoryLogger>` by the [`LoggerRegistry`](super::LoggerRegistry).
pub struct CategoryLogger {
    category: LogCategory,
    path: PathBuf,
    location: SinkLocation,
    capacity: usize,
    overflow: OverflowPolicy,
    timestamp_format: String,
    sender: RwLock<Option<mpsc::Sender<String>>>,
    relay: Mutex<Option<JoinHandle<RelayReport>>>,
    dropped: AtomicU64,
}

impl CategoryLogger {
    /// Creates the queue and hands `sink` to a new relay on `runtime`.
    pub(crate) fn start(
        sink: LogSink,
        capacity: usize,
        overflow: OverflowPolicy,
        timestamp_format: String,
        runtime: &Handle,
    ) -> Self {
        let category = sink.category();
        let path = sink.path().to_path_buf();
        let location = sink.location();

        let (tx, rx) = mpsc::channel(capacity);
        let relay = runtime.spawn_blocking(move || relay(rx, sink));
        tracing::debug!(%category, capacity, "log relay started");

        Self {
            category,
            path,
            location,
            capacity,
            overflow,
            timestamp_format,
            sender: RwLock::new(Some(tx)),
            relay: Mutex::new(Some(relay)),
            dropped: AtomicU64::new(0),
        }
    }

    /// The category this logger writes.
    pub fn category(&self) -> LogCategory {
        self.category
    }

    /// Path of the file the relay writes to.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Where the file was resolved to.
    pub fn location(&self) -> SinkLocation {
        self.location
    }

    /// Maximum number of pending lines.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Lines discarded because the queue was full (only with `DropNewest`).
    pub fn dropped(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }

    /// True once the registry has closed this logger.
    pub fn is_closed(&self) -> bool {
        self.sender
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .is_none()
    }

    /// Builds `"<timestamp> <tag>: <message>"`; the timestamp is omitted when
    /// the configured format is empty.
    pub fn format_line(&self, tag: &str, message: &str) -> String {
        let mut line = String::with_capacity(tag.len() + message.len() + 24);
        if !self.timestamp_format.is_empty() {
            let _ = write!(line, "{} ", Local::now().format(&self.timestamp_format));
        }
        line.push_str(tag);
        line.push_str(": ");
        line.push_str(message);
        line
    }

    /// Enqueues an already formatted line.
    ///
    /// # Panics
    ///
    /// When called after the registry shut this logger down, or when the relay
    /// is gone. Both mean the caller outlived the logging lifecycle.
    pub async fn enqueue(&self, line: String) {
        let sender = self.sender();
        match self.overflow {
            OverflowPolicy::Block => {
                if sender.send(line).await.is_err() {
                    self.relay_gone();
                }
            }
            OverflowPolicy::DropNewest => self.try_enqueue(&sender, line),
        }
    }

    /// Formats `message` with the caller's tag and enqueues it.
    pub async fn write(&self, tag: &str, message: &str) {
        let line = self.format_line(tag, message);
        self.enqueue(line).await;
    }

    /// `format_args!` flavour of [`write`](Self::write). The message is
    /// rendered before the returned future is polled, so the future stays `Send`.
    pub fn writef(&self, tag: &str, args: fmt::Arguments<'_>) -> impl Future<Output = ()> + Send + '_ {
        self.write_string(tag, fmt::format(args))
    }

    /// Like [`write`](Self::write) for an owned message. The returned future
    /// borrows only the logger, which is what `hub_log!` relies on.
    pub fn write_string(&self, tag: &str, message: String) -> impl Future<Output = ()> + Send + '_ {
        let line = self.format_line(tag, &message);
        self.enqueue(line)
    }

    /// Blocking variant of [`write`](Self::write) for synchronous code.
    ///
    /// # Panics
    ///
    /// Must not be called from inside an async context (tokio's `blocking_send`
    /// rule), and panics after shutdown like [`enqueue`](Self::enqueue).
    pub fn blocking_write(&self, tag: &str, message: &str) {
        let line = self.format_line(tag, message);
        let sender = self.sender();
        match self.overflow {
            OverflowPolicy::Block => {
                if sender.blocking_send(line).is_err() {
                    self.relay_gone();
                }
            }
            OverflowPolicy::DropNewest => self.try_enqueue(&sender, line),
        }
    }

    /// Stops accepting lines and returns the relay handle (first call only).
    pub(crate) fn close(&self) -> Option<JoinHandle<RelayReport>> {
        self.sender
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        self.relay.lock().unwrap_or_else(PoisonError::into_inner).take()
    }

    fn sender(&self) -> mpsc::Sender<String> {
        let guard = self.sender.read().unwrap_or_else(PoisonError::into_inner);
        match guard.as_ref() {
            Some(sender) => sender.clone(),
            None => panic!("`{}` logger used after shutdown", self.category),
        }
    }

    fn try_enqueue(&self, sender: &mpsc::Sender<String>, line: String) {
        match sender.try_send(line) {
            Ok(()) => {}
            Err(mpsc::error::TrySendError::Full(_)) => {
                self.dropped.fetch_add(1, Ordering::Relaxed);
            }
            Err(mpsc::error::TrySendError::Closed(_)) => self.relay_gone(),
        }
    }

    fn relay_gone(&self) -> ! {
        panic!("`{}` log relay is no longer running", self.category)
    }
}

impl fmt::Debug for CategoryLogger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CategoryLogger")
            .field("category", &self.category)
            .field("path", &self.path)
            .field("location", &self.location)
            .field("capacity", &self.capacity)
            .field("overflow", &self.overflow)
            .field("closed", &self.is_closed())
            .finish()
    }
}

/// Drains `rx` into `sink` until every sender is gone.
fn relay(mut rx: mpsc::Receiver<String>, mut sink: LogSink) -> RelayReport {
    let mut report = RelayReport {
        category: sink.category(),
        path: sink.path().to_path_buf(),
        location: sink.location(),
        written: 0,
        failed: 0,
    };

    while let Some(line) = rx.blocking_recv() {
        match sink.write_line(&line) {
            Ok(()) => report.written += 1,
            Err(err) => {
                if report.failed == 0 {
                    eprintln!("Failed to write log entry to {:?}: {}", report.path, err);
                }
                report.failed += 1;
            }
        }
    }

    if let Err(err) = sink.flush() {
        eprintln!("Failed to flush log file {:?}: {}", report.path, err);
    }
    if report.failed > 0 {
        tracing::warn!(category = %report.category, failed = report.failed, "log relay lost lines to write errors");
    }
    tracing::debug!(category = %report.category, written = report.written, "log relay stopped");

    report
}
