//! Backup segment compression.
//!
//! Compression is an auxiliary step of rotation: a failure is logged and
//! counted but never stops the writer from opening a fresh active file.
//!
//! ## Invariants
//!
//! - The output is written to `<segment>.gz.tmp` and renamed to
//!   `<segment>.gz` only once it is complete and synced
//! - The original segment is deleted only after that rename
//! - A failed compression leaves the original untouched and removes the
//!   temporary output
//!
//! Segments can be compressed inline during rotation or handed to a
//! [`CompressionWorker`] running on its own thread.

mod worker;

pub use worker::{CompressionWorker, InFlight, InFlightGuard};

use crate::error::{CoreError, CoreResult};
use crate::segment::with_suffix;
use crate::stats::WriterStats;
use flate2::write::GzEncoder;
use flate2::Compression;
use std::fmt;
use std::fs::{self, File};
use std::io::{self, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Suffix appended to compressed segments.
pub const COMPRESSED_SUFFIX: &str = ".gz";

/// Suffix of a compression output that is still being written.
pub const TEMP_SUFFIX: &str = ".gz.tmp";

/// Strategy for compressing a closed backup segment.
///
/// Implementations must produce `<path>.gz` and remove `path` only once the
/// compressed file is complete.
pub trait Compressor: Send + Sync + fmt::Debug {
    /// Compresses the segment at `path`, returning the compressed file's path.
    ///
    /// # Errors
    ///
    /// Returns an error if the segment cannot be read or the output cannot
    /// be written. The original segment must still exist in that case.
    fn compress_segment(&self, path: &Path) -> CoreResult<PathBuf>;
}

/// Gzip compressor built on `flate2`.
#[derive(Debug, Clone, Copy)]
pub struct GzipCompressor {
    level: u32,
}

impl GzipCompressor {
    /// Creates a compressor with the given level (0-9, clamped).
    #[must_use]
    pub fn new(level: u32) -> Self {
        Self {
            level: level.min(9),
        }
    }

    /// Returns the compression level.
    #[must_use]
    pub fn level(&self) -> u32 {
        self.level
    }

    fn write_compressed(&self, source: &Path, target: &Path) -> io::Result<()> {
        let mut reader = BufReader::new(File::open(source)?);
        let output = BufWriter::new(File::create(target)?);

        let mut encoder = GzEncoder::new(output, Compression::new(self.level));
        io::copy(&mut reader, &mut encoder)?;
        let mut output = encoder.finish()?;
        output.flush()?;

        let file = output.into_inner().map_err(|e| e.into_error())?;
        file.sync_all()
    }
}

impl Default for GzipCompressor {
    fn default() -> Self {
        Self::new(crate::config::DEFAULT_COMPRESSION_LEVEL)
    }
}

impl Compressor for GzipCompressor {
    fn compress_segment(&self, path: &Path) -> CoreResult<PathBuf> {
        let target = with_suffix(path, COMPRESSED_SUFFIX);
        let temp = with_suffix(path, TEMP_SUFFIX);

        if let Err(err) = self.write_compressed(path, &temp) {
            if let Err(cleanup) = fs::remove_file(&temp) {
                if cleanup.kind() != io::ErrorKind::NotFound {
                    warn!(path = %temp.display(), error = %cleanup, "failed to remove partial compression output");
                }
            }
            return Err(CoreError::compression(path, err.to_string()));
        }

        fs::rename(&temp, &target)
            .map_err(|err| CoreError::compression(path, format!("rename output: {err}")))?;
        fs::remove_file(path)
            .map_err(|err| CoreError::compression(path, format!("remove original: {err}")))?;

        Ok(target)
    }
}

/// Compresses `path`, logging and counting the outcome.
///
/// Returns true on success.
pub(crate) fn compress_logged(compressor: &dyn Compressor, path: &Path, stats: &WriterStats) -> bool {
    match compressor.compress_segment(path) {
        Ok(target) => {
            debug!(segment = %target.display(), "compressed backup segment");
            stats.record_compression();
            true
        }
        Err(err) => {
            warn!(segment = %path.display(), error = %err, "backup compression failed");
            stats.record_compression_failure();
            false
        }
    }
}
