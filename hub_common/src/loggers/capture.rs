use std::io::{self, Write};
use std::sync::{Arc, Mutex, PoisonError};

/// # Memory Stream
///
/// An in-memory stand-in for the real-time stream. Clones share one buffer,
/// so a clone can be handed to the registry while the original is inspected.
///
/// ```ignore
/// let stream = MemoryStream::new();
/// let registry = LoggerRegistry::builder(config).stream(stream.make_writer()).build()?;
/// ```
#[derive(Clone, Debug, Default)]
pub struct MemoryStream {
    buffer: Arc<Mutex<Vec<u8>>>,
}

impl MemoryStream {
    /// Creates an empty stream.
    pub fn new() -> Self {
        Self::default()
    }

    /// Everything written so far, decoded lossily.
    pub fn contents(&self) -> String {
        let buffer = self.buffer.lock().unwrap_or_else(PoisonError::into_inner);
        String::from_utf8_lossy(&buffer).into_owned()
    }

    /// Written lines, without their terminators.
    pub fn lines(&self) -> Vec<String> {
        self.contents().lines().map(str::to_string).collect()
    }

    /// A writer factory suitable for `LoggerRegistryBuilder::stream`.
    pub fn make_writer(&self) -> impl Fn() -> MemoryStream + Send + Sync + 'static {
        let stream = self.clone();
        move || stream.clone()
    }
}

impl Write for MemoryStream {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let mut buffer = self.buffer.lock().unwrap_or_else(PoisonError::into_inner);
        buffer.extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}
