//! Fixtures shared by the integration tests in `tests/`.

use std::fs;
use std::io::{self, Write};
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Condvar, Mutex, PoisonError};
use std::time::Duration;

use hub_common::{LoggingConfig, Placement};

/// A config that writes into `dir` with no timestamp prefix.
pub fn local_config(dir: &Path) -> LoggingConfig {
    LoggingConfig {
        local_log_dir: dir.to_path_buf(),
        placement: Placement::Local,
        timestamp_format: String::new(),
        ..LoggingConfig::default()
    }
}

/// Lines of a log file, or nothing if it does not exist.
pub fn read_lines(path: &Path) -> Vec<String> {
    fs::read_to_string(path)
        .map(|text| text.lines().map(str::to_string).collect())
        .unwrap_or_default()
}

/// A real-time stream whose writes stall until [`GatedStream::open`] is called.
///
/// Stalls the relay in the middle of a line, which is how the tests emulate a
/// slow terminal.
#[derive(Clone, Default)]
pub struct GatedStream {
    gate: Arc<(Mutex<bool>, Condvar)>,
    entered: Arc<AtomicUsize>,
    lines: Arc<Mutex<Vec<u8>>>,
}

impl GatedStream {
    pub fn new() -> Self {
        Self::default()
    }

    /// Lets every pending and future write through.
    pub fn open(&self) {
        let (lock, cvar) = &*self.gate;
        *lock.lock().unwrap_or_else(PoisonError::into_inner) = true;
        cvar.notify_all();
    }

    /// Number of writes that have reached the gate.
    pub fn entered(&self) -> usize {
        self.entered.load(Ordering::SeqCst)
    }

    /// Polls until at least `count` writes reached the gate.
    pub async fn wait_entered(&self, count: usize) {
        while self.entered() < count {
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    }

    pub fn contents(&self) -> String {
        let lines = self.lines.lock().unwrap_or_else(PoisonError::into_inner);
        String::from_utf8_lossy(&lines).into_owned()
    }

    pub fn make_writer(&self) -> impl Fn() -> GatedStream + Send + Sync + 'static {
        let stream = self.clone();
        move || stream.clone()
    }
}

impl Write for GatedStream {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.entered.fetch_add(1, Ordering::SeqCst);
        let (lock, cvar) = &*self.gate;
        let mut open = lock.lock().unwrap_or_else(PoisonError::into_inner);
        while !*open {
            open = cvar.wait(open).unwrap_or_else(PoisonError::into_inner);
        }
        drop(open);
        self.lines
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}
