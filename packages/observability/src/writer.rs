//! Append-only file writer for JSONL output.

use parking_lot::Mutex;
use std::fs::{File, OpenOptions};
use std::io::{self, BufWriter, Write};
use std::path::Path;
use std::sync::Arc;
use tracing_subscriber::fmt::MakeWriter;

/// Appends to a log file, flushing after every write so concurrent processes
/// interleave whole lines.
#[derive(Clone)]
pub struct AppendWriter {
    inner: Arc<Mutex<BufWriter<File>>>,
}

impl AppendWriter {
    pub fn new(path: &Path) -> io::Result<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let file = OpenOptions::new().create(true).append(true).open(path)?;
        Ok(Self {
            inner: Arc::new(Mutex::new(BufWriter::with_capacity(8192, file))),
        })
    }
}

impl Write for AppendWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let mut guard = self.inner.lock();
        let written = guard.write(buf)?;
        guard.flush()?;
        Ok(written)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.inner.lock().flush()
    }
}

/// MakeWriter implementation for tracing-subscriber.
#[derive(Clone)]
pub struct WriterFactory<W = AppendWriter> {
    writer: W,
}

impl<W> WriterFactory<W> {
    pub fn new(writer: W) -> Self {
        Self { writer }
    }
}

impl<'a, W> MakeWriter<'a> for WriterFactory<W>
where
    W: Write + Clone + 'a,
{
    type Writer = W;

    fn make_writer(&'a self) -> Self::Writer {
        self.writer.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_append_writer_creates_parent_dirs() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("deeply").join("nested").join("test.jsonl");

        let mut writer = AppendWriter::new(&path).unwrap();
        writer.write_all(b"first\n").unwrap();

        let mut again = AppendWriter::new(&path).unwrap();
        again.write_all(b"second\n").unwrap();

        assert_eq!(std::fs::read_to_string(&path).unwrap(), "first\nsecond\n");
    }
}
