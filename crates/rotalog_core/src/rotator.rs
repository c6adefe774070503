//! Rotation of the active file.
//!
//! A rotation runs with the writer lock held and performs, in order:
//!
//! 1. flush, sync and close the active handle
//! 2. pick an archive name `<active>.<YYYYMMDD_HHMMSS>_<seq>`
//! 3. rename the active file to it
//! 4. compress the archive (inline or via the worker)
//! 5. enforce retention, counting segments still queued for compression
//! 6. create a fresh, empty active file
//!
//! Steps 1, 2, 3 and 6 can fail a rotation. If naming or the rename fails the old
//! handle is already closed and the writer is left without an active file;
//! the next rotation attempt starts again from step 2.

use crate::compress::{
    compress_logged, CompressionWorker, Compressor, InFlight, COMPRESSED_SUFFIX,
};
use crate::config::WriterConfig;
use crate::error::{CoreError, CoreResult};
use crate::retention::{enforce_logged, RetentionManager, RetentionPolicy};
use crate::segment::{archive_path, current_token, with_suffix, MAX_SEQUENCE};
use crate::stats::WriterStats;
use rotalog_storage::ActiveFile;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::thread;
use std::time::Duration;
use tracing::{debug, info, warn};

/// First delay between rename attempts; doubled after each retry.
const RENAME_BACKOFF: Duration = Duration::from_millis(10);

/// Performs rotations for one active file.
pub(crate) struct Rotator {
    active_path: PathBuf,
    local_time: bool,
    rename_retries: u32,
    compressor: Option<Arc<dyn Compressor>>,
    worker: Option<CompressionWorker>,
    retention: RetentionManager,
    stats: Arc<WriterStats>,
    /// Token and sequence of the last archive name handed out.
    last_name: Option<(String, u32)>,
}

impl Rotator {
    /// Creates a rotator, starting the compression worker if configured.
    pub(crate) fn new(
        config: &WriterConfig,
        compressor: Arc<dyn Compressor>,
        stats: Arc<WriterStats>,
    ) -> CoreResult<Self> {
        let mut retention = RetentionManager::new(
            &config.path,
            RetentionPolicy::from_config(config),
            config.local_time,
        );

        let worker = if config.uses_worker() {
            let in_flight = Arc::new(InFlight::new());
            retention = retention.with_in_flight(Arc::clone(&in_flight));
            Some(CompressionWorker::spawn(
                Arc::clone(&compressor),
                in_flight,
                Arc::clone(&stats),
                config.compression_queue,
            )?)
        } else {
            None
        };

        Ok(Self {
            active_path: config.path.clone(),
            local_time: config.local_time,
            rename_retries: config.rename_retries,
            compressor: config.compress.then_some(compressor),
            worker,
            retention,
            stats,
            last_name: None,
        })
    }

    /// Rotates the active file and returns the fresh handle.
    ///
    /// `current` is emptied once the old handle has been closed, so on error
    /// the caller can tell whether it still has an active file.
    pub(crate) fn rotate(&mut self, current: &mut Option<ActiveFile>) -> CoreResult<ActiveFile> {
        if let Some(file) = current.as_mut() {
            file.flush()?;
            file.sync()?;
        }
        drop(current.take());

        let archived = self.archive()?;

        if let Some(segment) = &archived {
            info!(segment = %segment.display(), "rotated log file");
            self.dispatch_compression(segment);
            enforce_logged(&self.retention, &self.stats);
        }

        let file = ActiveFile::create(&self.active_path)?;
        self.stats.record_rotation();
        Ok(file)
    }

    /// Stops the compression worker after it drains its queue.
    pub(crate) fn shutdown(&mut self) {
        if let Some(mut worker) = self.worker.take() {
            worker.shutdown();
        }
    }

    /// Renames the active file to a fresh archive name.
    ///
    /// Returns `None` if there was no active file on disk to archive.
    fn archive(&mut self) -> CoreResult<Option<PathBuf>> {
        if !self.active_path.exists() {
            warn!(path = %self.active_path.display(), "active file missing, nothing to archive");
            return Ok(None);
        }

        let target = self.next_archive_path()?;
        self.rename_with_retry(&target)
            .map_err(|err| CoreError::rotation_failed(&self.active_path, err))?;
        Ok(Some(target))
    }

    /// Hands `segment` to the worker, or compresses it inline.
    fn dispatch_compression(&self, segment: &Path) {
        let Some(compressor) = &self.compressor else {
            return;
        };

        if let Some(worker) = &self.worker {
            match worker.submit(segment.to_path_buf()) {
                Ok(()) => return,
                Err(_) => warn!("compression worker unavailable, compressing inline"),
            }
        }

        compress_logged(compressor.as_ref(), segment, &self.stats);
    }

    fn next_archive_path(&mut self) -> CoreResult<PathBuf> {
        let token = current_token(self.local_time);
        self.next_archive_path_for(token)
    }

    /// Picks the first free archive name for `token`.
    ///
    /// The sequence restarts at 0 for a new token and skips names already
    /// taken on disk, plain or compressed.
    fn next_archive_path_for(&mut self, token: String) -> CoreResult<PathBuf> {
        let mut sequence = match &self.last_name {
            Some((last, sequence)) if *last == token => sequence + 1,
            _ => 0,
        };

        while sequence <= MAX_SEQUENCE {
            let candidate = archive_path(&self.active_path, &token, sequence);
            if !candidate.exists() && !with_suffix(&candidate, COMPRESSED_SUFFIX).exists() {
                self.last_name = Some((token, sequence));
                return Ok(candidate);
            }
            sequence += 1;
        }

        Err(CoreError::rotation_failed(
            &self.active_path,
            io::Error::new(
                io::ErrorKind::AlreadyExists,
                format!("no free archive sequence left for {token}"),
            ),
        ))
    }

    fn rename_with_retry(&self, target: &Path) -> io::Result<()> {
        let mut delay = RENAME_BACKOFF;
        let mut attempt = 0;
        loop {
            match fs::rename(&self.active_path, target) {
                Ok(()) => return Ok(()),
                Err(err) if attempt < self.rename_retries => {
                    attempt += 1;
                    debug!(attempt, error = %err, "archive rename failed, retrying");
                    thread::sleep(delay);
                    delay *= 2;
                }
                Err(err) => return Err(err),
            }
        }
    }
}

impl std::fmt::Debug for Rotator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Rotator")
            .field("active_path", &self.active_path)
            .field("compress", &self.compressor.is_some())
            .field("worker", &self.worker)
            .finish_non_exhaustive()
    }
}
