//! The rotating log writer.
//!
//! [`LogWriter`] is a byte sink shared between threads. Every write runs
//! under a single lock that also covers any rotation the write triggers, so
//! a write is never split between the old and the new file and no caller
//! ever sees a half-rotated writer.
//!
//! ## States
//!
//! ```text
//! Open ──overflow──▶ Rotating ──ok──▶ Open
//!                       │
//!                       └──error──▶ Failed ──next write──▶ Rotating
//! Open | Failed ──close()──▶ Closed
//! ```

use crate::compress::{Compressor, GzipCompressor};
use crate::config::WriterConfig;
use crate::error::{CoreError, CoreResult};
use crate::rotator::Rotator;
use crate::segment::{list_segments, BackupSegment};
use crate::size::SizeTracker;
use crate::stats::{StatsSnapshot, WriterStats};
use parking_lot::Mutex;
use rotalog_storage::ActiveFile;
use std::io;
use std::path::Path;
use std::sync::Arc;
use tracing::{info, warn};

/// Lifecycle state of a [`LogWriter`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriterState {
    /// An active file is open and accepting writes.
    Open,
    /// A rotation failed after closing the active file. The next write
    /// retries the rotation.
    Failed,
    /// The writer was closed. Terminal.
    Closed,
}

/// State guarded by the write lock.
struct Inner {
    file: Option<ActiveFile>,
    size: SizeTracker,
    state: WriterState,
    rotator: Rotator,
}

impl Inner {
    fn rotate(&mut self, stats: &WriterStats) -> CoreResult<()> {
        match self.rotator.rotate(&mut self.file) {
            Ok(file) => {
                self.file = Some(file);
                self.size.reset();
                self.state = WriterState::Open;
                Ok(())
            }
            Err(err) => {
                if self.file.is_none() {
                    self.state = WriterState::Failed;
                }
                stats.record_rotation_failure();
                warn!(error = %err, state = ?self.state, "log rotation failed");
                Err(err)
            }
        }
    }

    fn ensure_usable(&self) -> CoreResult<()> {
        match self.state {
            WriterState::Closed => Err(CoreError::WriterClosed),
            WriterState::Open | WriterState::Failed => Ok(()),
        }
    }
}

/// A concurrent, size-bounded rotating log writer.
///
/// # Example
///
/// ```no_run
/// use rotalog_core::{LogWriter, WriterConfig};
///
/// let config = WriterConfig::new("logs/app.log")
///     .max_size(10 * 1024 * 1024)
///     .max_backups(5)
///     .compress(true);
///
/// let writer = LogWriter::open(config).unwrap();
/// writer.write(b"service started\n").unwrap();
/// writer.close().unwrap();
/// ```
pub struct LogWriter {
    config: WriterConfig,
    inner: Mutex<Inner>,
    stats: Arc<WriterStats>,
}

impl LogWriter {
    /// Opens a writer, resuming an existing active file if there is one.
    ///
    /// The active file's current size is read from disk, so the first
    /// overflow check after a restart accounts for what is already there.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid or the active file
    /// cannot be opened.
    pub fn open(config: WriterConfig) -> CoreResult<Self> {
        let compressor = Arc::new(GzipCompressor::new(config.compression_level));
        Self::open_with_compressor(config, compressor)
    }

    /// Opens a writer that compresses backups with a custom strategy.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid or the active file
    /// cannot be opened.
    pub fn open_with_compressor(
        config: WriterConfig,
        compressor: Arc<dyn Compressor>,
    ) -> CoreResult<Self> {
        config.validate()?;

        let file = ActiveFile::open_with_create_dirs(&config.path)?;
        let size = SizeTracker::new(file.size(), config.max_size);
        let stats = Arc::new(WriterStats::new());
        let rotator = Rotator::new(&config, compressor, Arc::clone(&stats))?;

        info!(
            path = %config.path.display(),
            size = file.size(),
            max_size = config.max_size,
            "opened log writer"
        );

        Ok(Self {
            config,
            inner: Mutex::new(Inner {
                file: Some(file),
                size,
                state: WriterState::Open,
                rotator,
            }),
            stats,
        })
    }

    /// Writes `data` to the active file, rotating first if it would not fit.
    ///
    /// Returns the number of bytes written, which is always `data.len()`.
    ///
    /// # Errors
    ///
    /// - [`CoreError::WriterClosed`] after [`close`](Self::close)
    /// - any error from a required rotation; nothing is written in that case
    /// - the I/O error from the write itself, unchanged
    pub fn write(&self, data: &[u8]) -> CoreResult<usize> {
        let mut guard = self.inner.lock();
        let inner = &mut *guard;
        inner.ensure_usable()?;

        let len = data.len() as u64;
        if inner.state == WriterState::Failed || inner.size.needs_rotation(len) {
            inner.rotate(&self.stats)?;
        }
        if data.is_empty() {
            return Ok(0);
        }

        let Some(file) = inner.file.as_mut() else {
            return Err(CoreError::WriterClosed);
        };
        match file.append(data) {
            Ok(_) => {
                inner.size.record(len);
                self.stats.record_write(len);
                Ok(data.len())
            }
            Err(err) => {
                inner.size.seed(file.size());
                Err(err.into())
            }
        }
    }

    /// Forces a rotation now, even if the active file is not full.
    ///
    /// # Errors
    ///
    /// Returns an error if the writer is closed or the rotation fails.
    pub fn rotate(&self) -> CoreResult<()> {
        let mut inner = self.inner.lock();
        inner.ensure_usable()?;
        inner.rotate(&self.stats)
    }

    /// Flushes the active file to the OS.
    ///
    /// # Errors
    ///
    /// Returns an error if the flush fails.
    pub fn flush(&self) -> CoreResult<()> {
        if let Some(file) = self.inner.lock().file.as_mut() {
            file.flush()?;
        }
        Ok(())
    }

    /// Syncs the active file to durable storage.
    ///
    /// # Errors
    ///
    /// Returns an error if the sync fails.
    pub fn sync(&self) -> CoreResult<()> {
        if let Some(file) = self.inner.lock().file.as_mut() {
            file.sync()?;
        }
        Ok(())
    }

    /// Closes the writer.
    ///
    /// Flushes and syncs the active file, releases it, and waits for queued
    /// compressions to finish. Calling `close` again is a no-op.
    ///
    /// # Errors
    ///
    /// Returns an error if the final flush or sync fails. The writer is
    /// closed regardless.
    pub fn close(&self) -> CoreResult<()> {
        let mut inner = self.inner.lock();
        if inner.state == WriterState::Closed {
            return Ok(());
        }
        inner.state = WriterState::Closed;

        let result = match inner.file.take() {
            Some(file) => file.close().map_err(CoreError::from),
            None => Ok(()),
        };
        inner.rotator.shutdown();

        info!(path = %self.config.path.display(), "closed log writer");
        result
    }

    /// Returns the lifecycle state.
    pub fn state(&self) -> WriterState {
        self.inner.lock().state
    }

    /// Returns the size of the active file in bytes.
    pub fn current_size(&self) -> u64 {
        self.inner.lock().size.current()
    }

    /// Returns the active file path.
    pub fn path(&self) -> &Path {
        &self.config.path
    }

    /// Returns the configuration the writer was opened with.
    pub fn config(&self) -> &WriterConfig {
        &self.config
    }

    /// Lists the backup segments on disk, oldest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory cannot be read.
    pub fn backups(&self) -> CoreResult<Vec<BackupSegment>> {
        list_segments(&self.config.path)
    }

    /// Returns a snapshot of the writer statistics.
    pub fn stats(&self) -> StatsSnapshot {
        self.stats.snapshot()
    }
}

impl Drop for LogWriter {
    fn drop(&mut self) {
        if let Err(err) = self.close() {
            warn!(error = %err, "failed to close log writer");
        }
    }
}

impl std::fmt::Debug for LogWriter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LogWriter")
            .field("path", &self.config.path)
            .field("max_size", &self.config.max_size)
            .field("state", &self.state())
            .finish_non_exhaustive()
    }
}

impl io::Write for LogWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        LogWriter::write(self, buf).map_err(CoreError::into_io)
    }

    fn flush(&mut self) -> io::Result<()> {
        LogWriter::flush(self).map_err(CoreError::into_io)
    }
}

impl io::Write for &LogWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        LogWriter::write(self, buf).map_err(CoreError::into_io)
    }

    fn flush(&mut self) -> io::Result<()> {
        LogWriter::flush(self).map_err(CoreError::into_io)
    }
}
