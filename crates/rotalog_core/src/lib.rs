//! # Rotalog Core
//!
//! A concurrent, size-bounded rotating log writer.
//!
//! This crate provides:
//! - [`LogWriter`], a thread-safe byte sink that rotates its active file
//!   before a write would push it past `max_size`
//! - gzip compression of rotated backups, inline or on a background worker
//! - retention of backups by count and age
//! - a `tracing-subscriber` sink (feature `subscriber`, on by default)
//!
//! ## On-disk layout
//!
//! ```text
//! app.log                             # active file
//! app.log.20240517_093012_000000.gz   # compressed backup
//! app.log.20240517_101500_000000      # backup (compression pending or disabled)
//! ```
//!
//! ## Example
//!
//! ```rust
//! use rotalog_core::{LogWriter, WriterConfig};
//!
//! let dir = tempfile::tempdir().unwrap();
//! let config = WriterConfig::new(dir.path().join("app.log"))
//!     .max_size(100)
//!     .max_backups(3);
//! let writer = LogWriter::open(config).unwrap();
//!
//! writer.write(&[b'a'; 60]).unwrap();
//! writer.write(&[b'b'; 60]).unwrap(); // rotates first
//!
//! assert_eq!(writer.current_size(), 60);
//! assert_eq!(writer.backups().unwrap().len(), 1);
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod compress;
mod config;
mod error;
pub mod retention;
mod rotator;
pub mod segment;
mod size;
#[cfg(feature = "subscriber")]
mod sink;
mod stats;
mod writer;

pub use compress::{CompressionWorker, Compressor, GzipCompressor, InFlight};
pub use config::{WriterConfig, DEFAULT_COMPRESSION_LEVEL, DEFAULT_COMPRESSION_QUEUE, DEFAULT_MAX_SIZE};
pub use error::{CoreError, CoreResult};
pub use retention::{RetentionManager, RetentionPolicy, RetentionReport};
pub use segment::{list_segments, BackupSegment};
#[cfg(feature = "subscriber")]
pub use sink::{SinkWriter, TracingSink};
pub use size::SizeTracker;
pub use stats::{StatsSnapshot, WriterStats};
pub use writer::{LogWriter, WriterState};

/// Crate version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
