//! Writer statistics.
//!
//! Counters for monitoring a [`LogWriter`](crate::LogWriter): write volume,
//! rotations and the outcome of the auxiliary compression and retention
//! steps, whose failures are otherwise only visible in the log.
//!
//! # Usage
//!
//! ```rust,ignore
//! let writer = LogWriter::open(WriterConfig::new("app.log"))?;
//! writer.write(b"line\n")?;
//!
//! let stats = writer.stats();
//! println!("Rotations: {}", stats.rotations);
//! ```

use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};

/// Writer statistics.
///
/// All counters are atomic and can be read while writes are in progress.
/// They are shared with the compression worker.
#[derive(Debug, Default)]
pub struct WriterStats {
    writes: AtomicU64,
    bytes_written: AtomicU64,
    rotations: AtomicU64,
    rotation_failures: AtomicU64,
    compressions: AtomicU64,
    compression_failures: AtomicU64,
    segments_removed: AtomicU64,
    retention_failures: AtomicU64,
}

impl WriterStats {
    /// Creates a new stats instance.
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn record_write(&self, bytes: u64) {
        self.writes.fetch_add(1, Ordering::Relaxed);
        self.bytes_written.fetch_add(bytes, Ordering::Relaxed);
    }

    pub(crate) fn record_rotation(&self) {
        self.rotations.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_rotation_failure(&self) {
        self.rotation_failures.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_compression(&self) {
        self.compressions.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_compression_failure(&self) {
        self.compression_failures.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_retention(&self, removed: u64, failed: u64) {
        self.segments_removed.fetch_add(removed, Ordering::Relaxed);
        self.retention_failures.fetch_add(failed, Ordering::Relaxed);
    }

    /// Returns the number of successful write calls.
    pub fn writes(&self) -> u64 {
        self.writes.load(Ordering::Relaxed)
    }

    /// Returns the total bytes written.
    pub fn bytes_written(&self) -> u64 {
        self.bytes_written.load(Ordering::Relaxed)
    }

    /// Returns the number of completed rotations.
    pub fn rotations(&self) -> u64 {
        self.rotations.load(Ordering::Relaxed)
    }

    /// Returns the number of failed rotations.
    pub fn rotation_failures(&self) -> u64 {
        self.rotation_failures.load(Ordering::Relaxed)
    }

    /// Returns the number of segments compressed.
    pub fn compressions(&self) -> u64 {
        self.compressions.load(Ordering::Relaxed)
    }

    /// Returns the number of failed compressions.
    pub fn compression_failures(&self) -> u64 {
        self.compression_failures.load(Ordering::Relaxed)
    }

    /// Returns the number of backup segments deleted by retention.
    pub fn segments_removed(&self) -> u64 {
        self.segments_removed.load(Ordering::Relaxed)
    }

    /// Returns the number of backup deletions that failed.
    pub fn retention_failures(&self) -> u64 {
        self.retention_failures.load(Ordering::Relaxed)
    }

    /// Returns a snapshot of all stats.
    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            writes: self.writes(),
            bytes_written: self.bytes_written(),
            rotations: self.rotations(),
            rotation_failures: self.rotation_failures(),
            compressions: self.compressions(),
            compression_failures: self.compression_failures(),
            segments_removed: self.segments_removed(),
            retention_failures: self.retention_failures(),
        }
    }
}

/// A point-in-time snapshot of writer statistics.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct StatsSnapshot {
    /// Successful write calls.
    pub writes: u64,
    /// Total bytes written.
    pub bytes_written: u64,
    /// Completed rotations.
    pub rotations: u64,
    /// Failed rotations.
    pub rotation_failures: u64,
    /// Segments compressed.
    pub compressions: u64,
    /// Failed compressions.
    pub compression_failures: u64,
    /// Segments deleted by retention.
    pub segments_removed: u64,
    /// Failed segment deletions.
    pub retention_failures: u64,
}
