//! Background compression worker.
//!
//! A single thread fed by a bounded queue. The segment it is working on is
//! published through [`InFlight`] so that a retention pass can wait for it
//! instead of deleting a file out from under the encoder. Queued segments
//! that were evicted before their turn are skipped.

use crate::compress::{compress_logged, Compressor};
use crate::error::CoreResult;
use crate::stats::WriterStats;
use parking_lot::{Condvar, Mutex, MutexGuard};
use std::path::{Path, PathBuf};
use std::sync::mpsc::{self, Receiver, SyncSender};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use tracing::{debug, warn};

/// The segment the worker is compressing right now, if any.
#[derive(Debug, Default)]
pub struct InFlight {
    current: Mutex<Option<PathBuf>>,
    finished: Condvar,
}

impl InFlight {
    /// Creates an idle tracker.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Locks the tracker. The worker cannot pick up a new segment while
    /// the guard is held.
    pub fn lock(&self) -> InFlightGuard<'_> {
        InFlightGuard {
            in_flight: self,
            current: self.current.lock(),
        }
    }

    /// Returns true if `segment` is being compressed right now.
    #[must_use]
    pub fn is_busy_with(&self, segment: &Path) -> bool {
        same_segment(self.current.lock().as_deref(), segment)
    }

    /// Marks `segment` as in progress. Returns false if it no longer exists.
    fn begin(&self, segment: &Path) -> bool {
        let mut current = self.current.lock();
        if !segment.exists() {
            return false;
        }
        *current = Some(segment.to_path_buf());
        true
    }

    fn finish(&self) {
        *self.current.lock() = None;
        self.finished.notify_all();
    }
}

/// Exclusive access to an [`InFlight`] tracker.
pub struct InFlightGuard<'a> {
    in_flight: &'a InFlight,
    current: MutexGuard<'a, Option<PathBuf>>,
}

impl InFlightGuard<'_> {
    /// Blocks until the worker is no longer compressing `segment`.
    pub fn wait_for(&mut self, segment: &Path) {
        while same_segment(self.current.as_deref(), segment) {
            self.in_flight.finished.wait(&mut self.current);
        }
    }
}

/// Segments always live next to the active file, so the name identifies them.
fn same_segment(current: Option<&Path>, segment: &Path) -> bool {
    current.is_some_and(|current| current.file_name() == segment.file_name())
}

/// Handle on the compression worker thread.
///
/// Dropping the handle drains the queue and joins the thread.
pub struct CompressionWorker {
    sender: Option<SyncSender<PathBuf>>,
    handle: Option<JoinHandle<()>>,
}

impl CompressionWorker {
    /// Starts the worker with a queue of `capacity` pending segments.
    ///
    /// # Errors
    ///
    /// Returns an error if the thread cannot be spawned.
    pub fn spawn(
        compressor: Arc<dyn Compressor>,
        in_flight: Arc<InFlight>,
        stats: Arc<WriterStats>,
        capacity: usize,
    ) -> CoreResult<Self> {
        let (sender, receiver) = mpsc::sync_channel(capacity);
        let handle = thread::Builder::new()
            .name("rotalog-compress".to_string())
            .spawn(move || run(&receiver, compressor.as_ref(), &in_flight, &stats))?;

        Ok(Self {
            sender: Some(sender),
            handle: Some(handle),
        })
    }

    /// Queues a segment for compression.
    ///
    /// Blocks while the queue is full. Returns the path back if the worker
    /// is no longer running, so the caller can compress it inline.
    pub fn submit(&self, segment: PathBuf) -> Result<(), PathBuf> {
        match &self.sender {
            Some(sender) => sender.send(segment).map_err(|err| err.0),
            None => Err(segment),
        }
    }

    /// Returns true until [`shutdown`](Self::shutdown) has run.
    #[must_use]
    pub fn is_running(&self) -> bool {
        self.sender.is_some()
    }

    /// Finishes every queued segment and stops the thread.
    pub fn shutdown(&mut self) {
        drop(self.sender.take());
        if let Some(handle) = self.handle.take() {
            if handle.join().is_err() {
                warn!("compression worker panicked");
            }
        }
    }
}

impl Drop for CompressionWorker {
    fn drop(&mut self) {
        self.shutdown();
    }
}

impl std::fmt::Debug for CompressionWorker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CompressionWorker")
            .field("running", &self.is_running())
            .finish_non_exhaustive()
    }
}

fn run(
    receiver: &Receiver<PathBuf>,
    compressor: &dyn Compressor,
    in_flight: &InFlight,
    stats: &WriterStats,
) {
    debug!("compression worker started");
    for segment in receiver {
        if !in_flight.begin(&segment) {
            debug!(segment = %segment.display(), "segment evicted before compression");
            continue;
        }
        compress_logged(compressor, &segment, stats);
        in_flight.finish();
    }
    debug!("compression worker stopped");
}
