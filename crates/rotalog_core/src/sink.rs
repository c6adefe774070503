//! `tracing-subscriber` integration.
//!
//! Lets a `fmt` subscriber write its output through a [`LogWriter`].
//!
//! Events emitted by this crate itself are discarded by the sink: they can
//! fire while the write lock is held (during a rotation) or from the
//! compression worker while a writer waits on it, and routing them back into
//! the same writer would deadlock.
//!
//! ```rust,no_run
//! use rotalog_core::{LogWriter, TracingSink, WriterConfig};
//! use std::sync::Arc;
//!
//! let writer = Arc::new(LogWriter::open(WriterConfig::new("app.log")).unwrap());
//! tracing_subscriber::fmt()
//!     .with_writer(TracingSink::new(Arc::clone(&writer)))
//!     .with_ansi(false)
//!     .init();
//! ```

use crate::error::CoreError;
use crate::writer::LogWriter;
use std::io;
use std::sync::Arc;
use tracing::Metadata;
use tracing_subscriber::fmt::MakeWriter;

/// Target prefix of this crate's own events.
const SELF_TARGET: &str = "rotalog_core";

/// Per-event writer handed out by [`TracingSink`] and [`LogWriter`].
#[derive(Debug)]
pub enum SinkWriter<'a> {
    /// Forwards bytes to the log writer.
    Log(&'a LogWriter),
    /// Drops bytes; used for the writer's own events.
    Discard,
}

impl io::Write for SinkWriter<'_> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        match self {
            Self::Log(writer) => LogWriter::write(writer, buf).map_err(CoreError::into_io),
            Self::Discard => Ok(buf.len()),
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        match self {
            Self::Log(writer) => LogWriter::flush(writer).map_err(CoreError::into_io),
            Self::Discard => Ok(()),
        }
    }
}

fn writer_for<'a>(writer: &'a LogWriter, meta: &Metadata<'_>) -> SinkWriter<'a> {
    if meta.target().starts_with(SELF_TARGET) {
        SinkWriter::Discard
    } else {
        SinkWriter::Log(writer)
    }
}

/// A shareable [`MakeWriter`] over a [`LogWriter`].
#[derive(Debug, Clone)]
pub struct TracingSink {
    writer: Arc<LogWriter>,
}

impl TracingSink {
    /// Wraps a shared writer.
    #[must_use]
    pub fn new(writer: Arc<LogWriter>) -> Self {
        Self { writer }
    }

    /// Returns the wrapped writer.
    #[must_use]
    pub fn writer(&self) -> &Arc<LogWriter> {
        &self.writer
    }
}

impl<'a> MakeWriter<'a> for TracingSink {
    type Writer = SinkWriter<'a>;

    fn make_writer(&'a self) -> Self::Writer {
        SinkWriter::Log(&self.writer)
    }

    fn make_writer_for(&'a self, meta: &Metadata<'_>) -> Self::Writer {
        writer_for(&self.writer, meta)
    }
}

impl<'a> MakeWriter<'a> for LogWriter {
    type Writer = SinkWriter<'a>;

    fn make_writer(&'a self) -> Self::Writer {
        SinkWriter::Log(self)
    }

    fn make_writer_for(&'a self, meta: &Metadata<'_>) -> Self::Writer {
        writer_for(self, meta)
    }
}
