//! # Log Sink Resolution
//!
//! Picks and opens the file a category writes to.
//!
//! ## Placement rules
//!
//! 1. On server-style systems the file lives in the system log directory
//!    (`/var/log/DMRHub/DMRHub.<category>.log`). A missing directory is
//!    created (non-recursively, `0755`) and handed to the process uid/gid.
//! 2. If creating the directory, changing its owner or opening the file fails
//!    for any reason, the sink quietly falls back to
//!    `<local_log_dir>/DMRHub.<category>.log`.
//! 3. On desktop-style systems the local file is used directly.
//! 4. If the local file cannot be opened either, there is nowhere left to log:
//!    the error is [`SinkError::Fallback`] and the registry treats it as fatal.
//!
//! Files are always opened read-write, created if missing and appended to.

use std::fmt;
use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use colored::Colorize;
use tracing_subscriber::fmt::writer::BoxMakeWriter;
use tracing_subscriber::fmt::MakeWriter;

use super::category::LogCategory;
use super::error::SinkError;
use crate::configs::{LoggingConfig, Placement};

#[cfg(unix)]
const LOG_DIR_MODE: u32 = 0o755;
#[cfg(unix)]
const LOG_FILE_MODE: u32 = 0o664;

/// Which of the two candidate locations a sink ended up in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SinkLocation {
    /// The system log directory.
    System,
    /// The local fallback directory.
    Local,
}

/// # Stream Mirror
///
/// A real-time secondary destination (stderr unless the registry was built
/// with another writer). Lines are written to it before they hit the file.
#[derive(Clone)]
pub struct StreamMirror {
    make_writer: Arc<BoxMakeWriter>,
    colorize: bool,
}

impl StreamMirror {
    /// Wraps a shared writer factory.
    pub fn new(make_writer: Arc<BoxMakeWriter>, colorize: bool) -> Self {
        Self { make_writer, colorize }
    }

    /// Mirror onto the process's standard error.
    pub fn stderr(colorize: bool) -> Self {
        Self::new(Arc::new(BoxMakeWriter::new(io::stderr)), colorize)
    }

    fn write_line(&self, body: &str) -> io::Result<()> {
        let text = if self.colorize {
            // colored otherwise decides from stdout, not from this stream
            colored::control::set_override(true);
            format!("{}\n", body.red())
        } else {
            format!("{body}\n")
        };
        let make: &BoxMakeWriter = &self.make_writer;
        let mut writer = make.make_writer();
        writer.write_all(text.as_bytes())?;
        writer.flush()
    }
}

impl fmt::Debug for StreamMirror {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StreamMirror").field("colorize", &self.colorize).finish_non_exhaustive()
    }
}

/// # Log Sink
///
/// One open destination for a category: the appended log file plus, for
/// mirrored categories, the real-time stream. Owned by exactly one relay.
pub struct LogSink {
    category: LogCategory,
    path: PathBuf,
    location: SinkLocation,
    file: File,
    stream: Option<StreamMirror>,
}

impl LogSink {
    /// Resolves and opens the file for `category`, attaching `stream` as a mirror.
    pub fn open(
        config: &LoggingConfig,
        category: LogCategory,
        stream: Option<StreamMirror>,
    ) -> Result<Self, SinkError> {
        let (file, path, location) = resolve_file(config, category)?;
        tracing::debug!(%category, path = %path.display(), ?location, "opened log sink");

        Ok(Self {
            category,
            path,
            location,
            file,
            stream,
        })
    }

    /// The category this sink belongs to.
    pub fn category(&self) -> LogCategory {
        self.category
    }

    /// Path of the open log file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Whether the system directory or the local fallback is in use.
    pub fn location(&self) -> SinkLocation {
        self.location
    }

    /// True when lines are duplicated onto the real-time stream.
    pub fn is_mirrored(&self) -> bool {
        self.stream.is_some()
    }

    /// Writes one line to the mirror (if any) and then to the file.
    ///
    /// Each destination receives the whole line in a single `write_all`, so
    /// lines from the same relay never interleave. A mirror failure does not
    /// prevent the file write; the first error encountered is returned.
    pub fn write_line(&mut self, line: &str) -> io::Result<()> {
        let body = line.strip_suffix('\n').unwrap_or(line);

        let stream_result = match &self.stream {
            Some(stream) => stream.write_line(body),
            None => Ok(()),
        };

        let mut record = String::with_capacity(body.len() + 1);
        record.push_str(body);
        record.push('\n');
        self.file.write_all(record.as_bytes())?;

        stream_result
    }

    /// Flushes the file to the OS.
    pub fn flush(&mut self) -> io::Result<()> {
        self.file.flush()
    }
}

impl fmt::Debug for LogSink {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LogSink")
            .field("category", &self.category)
            .field("path", &self.path)
            .field("location", &self.location)
            .field("mirrored", &self.stream.is_some())
            .finish()
    }
}

/// Applies the placement rules and returns the open file, its path and location.
pub fn resolve_file(
    config: &LoggingConfig,
    category: LogCategory,
) -> Result<(File, PathBuf, SinkLocation), SinkError> {
    let file_name = config.file_name(category);

    if config.placement.effective() == Placement::System {
        match open_system(&config.system_log_dir, &file_name) {
            Ok((file, path)) => return Ok((file, path, SinkLocation::System)),
            Err(err) => {
                tracing::warn!(%category, error = %err, "system log location unavailable, using local log file");
            }
        }
    }

    let path = config.local_log_dir.join(&file_name);
    match open_append(&path) {
        Ok(file) => Ok((file, path, SinkLocation::Local)),
        Err(source) => Err(SinkError::Fallback { path, source }),
    }
}

fn open_system(dir: &Path, file_name: &str) -> Result<(File, PathBuf), SinkError> {
    if let Err(err) = fs::metadata(dir) {
        if err.kind() == io::ErrorKind::NotFound {
            create_owned_dir(dir)?;
        }
    }

    let path = dir.join(file_name);
    match open_append(&path) {
        Ok(file) => Ok((file, path)),
        Err(source) => Err(SinkError::Open { path, source }),
    }
}

fn open_append(path: &Path) -> io::Result<File> {
    let mut options = OpenOptions::new();
    options.read(true).create(true).append(true);

    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        options.mode(LOG_FILE_MODE);
    }

    options.open(path)
}

#[cfg(unix)]
fn create_owned_dir(dir: &Path) -> Result<(), SinkError> {
    use nix::unistd::{chown, getgid, getuid};
    use std::os::unix::fs::DirBuilderExt;

    fs::DirBuilder::new()
        .mode(LOG_DIR_MODE)
        .create(dir)
        .map_err(|source| SinkError::CreateDir {
            path: dir.to_path_buf(),
            source,
        })?;

    chown(dir, Some(getuid()), Some(getgid())).map_err(|errno| SinkError::Ownership {
        path: dir.to_path_buf(),
        source: io::Error::from(errno),
    })
}

#[cfg(not(unix))]
fn create_owned_dir(dir: &Path) -> Result<(), SinkError> {
    fs::create_dir(dir).map_err(|source| SinkError::CreateDir {
        path: dir.to_path_buf(),
        source,
    })
}
