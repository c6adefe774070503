//! Backup retention.
//!
//! Evicts backup segments by count and, optionally, by age.
//!
//! ## Invariants
//!
//! - Eviction order is chronological: the oldest segments go first
//! - With `max_backups > 0` at most `max_backups` segments remain after a pass
//! - A failed deletion is reported and skipped; the pass continues
//! - The active file is never a candidate
//! - A segment the compression worker is busy with is deleted only after
//!   the worker finishes it

use crate::compress::InFlight;
use crate::config::WriterConfig;
use crate::error::CoreResult;
use crate::segment::{list_segments, BackupSegment};
use crate::stats::WriterStats;
use chrono::{Local, NaiveDateTime, TimeDelta, Utc};
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Limits on retained backups.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RetentionPolicy {
    /// Maximum number of backups (0 = unlimited).
    pub max_backups: usize,
    /// Maximum backup age (None = unlimited).
    pub max_age: Option<Duration>,
}

impl RetentionPolicy {
    /// Builds the policy described by a writer configuration.
    #[must_use]
    pub fn from_config(config: &WriterConfig) -> Self {
        Self {
            max_backups: config.max_backups,
            max_age: config.max_age,
        }
    }

    /// Returns true if the policy never evicts anything.
    #[must_use]
    pub fn is_unbounded(&self) -> bool {
        self.max_backups == 0 && self.max_age.is_none()
    }
}

/// Outcome of a retention pass.
#[derive(Debug, Default)]
pub struct RetentionReport {
    /// Segments left in place.
    pub retained: usize,
    /// Segments deleted.
    pub removed: Vec<PathBuf>,
    /// Segments whose deletion failed.
    pub failed: Vec<(PathBuf, io::Error)>,
}

/// Enforces a [`RetentionPolicy`] on the backups of one active file.
#[derive(Debug, Clone)]
pub struct RetentionManager {
    active_path: PathBuf,
    policy: RetentionPolicy,
    local_time: bool,
    in_flight: Option<Arc<InFlight>>,
}

impl RetentionManager {
    /// Creates a manager for the backups of `active_path`.
    ///
    /// `local_time` must match the clock used to name segments so that age
    /// comparisons line up.
    #[must_use]
    pub fn new(active_path: &Path, policy: RetentionPolicy, local_time: bool) -> Self {
        Self {
            active_path: active_path.to_path_buf(),
            policy,
            local_time,
            in_flight: None,
        }
    }

    /// Coordinates deletions with a compression worker sharing `in_flight`.
    #[must_use]
    pub fn with_in_flight(mut self, in_flight: Arc<InFlight>) -> Self {
        self.in_flight = Some(in_flight);
        self
    }

    /// Returns the policy being enforced.
    #[must_use]
    pub fn policy(&self) -> &RetentionPolicy {
        &self.policy
    }

    /// Lists current backups, oldest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory cannot be read.
    pub fn segments(&self) -> CoreResult<Vec<BackupSegment>> {
        list_segments(&self.active_path)
    }

    /// Returns the segments a pass would delete right now, without deleting.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory cannot be read.
    pub fn plan(&self) -> CoreResult<Vec<BackupSegment>> {
        let segments = self.segments()?;
        Ok(self.select_evictions(segments, self.now()).1)
    }

    /// Deletes segments beyond the policy.
    ///
    /// # Errors
    ///
    /// Returns an error only if the backups cannot be listed. Deletion
    /// failures are collected in the report.
    pub fn enforce(&self) -> CoreResult<RetentionReport> {
        self.enforce_at(self.now())
    }

    /// Like [`enforce`](Self::enforce) with an explicit current time.
    ///
    /// # Errors
    ///
    /// Returns an error only if the backups cannot be listed.
    pub fn enforce_at(&self, now: NaiveDateTime) -> CoreResult<RetentionReport> {
        if self.policy.is_unbounded() {
            return Ok(RetentionReport {
                retained: self.segments()?.len(),
                ..RetentionReport::default()
            });
        }

        // Held for the whole pass so the worker cannot start on a segment
        // that is about to be deleted.
        let mut in_flight = self.in_flight.as_deref().map(InFlight::lock);

        let (keep, evict) = self.select_evictions(self.segments()?, now);
        let mut report = RetentionReport {
            retained: keep.len(),
            ..RetentionReport::default()
        };

        for segment in evict {
            if let Some(guard) = in_flight.as_mut() {
                guard.wait_for(segment.path());
            }
            match segment.remove() {
                Ok(()) => {
                    debug!(segment = %segment.path().display(), "removed backup segment");
                    report.removed.push(segment.path().to_path_buf());
                }
                Err(err) if err.kind() == io::ErrorKind::NotFound => {}
                Err(err) => {
                    warn!(segment = %segment.path().display(), error = %err, "failed to remove backup segment");
                    report.failed.push((segment.path().to_path_buf(), err));
                }
            }
        }

        Ok(report)
    }

    /// Splits oldest-first `segments` into (kept, evicted).
    fn select_evictions(
        &self,
        mut segments: Vec<BackupSegment>,
        now: NaiveDateTime,
    ) -> (Vec<BackupSegment>, Vec<BackupSegment>) {
        segments.sort_by_key(BackupSegment::key);

        let cutoff = self
            .policy
            .max_age
            .and_then(|age| TimeDelta::from_std(age).ok())
            .and_then(|age| now.checked_sub_signed(age));

        let (mut keep, mut evict): (Vec<_>, Vec<_>) = segments
            .into_iter()
            .partition(|segment| cutoff.map_or(true, |cutoff| segment.created_at() >= cutoff));

        if self.policy.max_backups > 0 && keep.len() > self.policy.max_backups {
            let excess = keep.len() - self.policy.max_backups;
            evict.extend(keep.drain(..excess));
        }

        (keep, evict)
    }

    fn now(&self) -> NaiveDateTime {
        if self.local_time {
            Local::now().naive_local()
        } else {
            Utc::now().naive_utc()
        }
    }
}

/// Runs a retention pass, logging and counting the outcome.
pub(crate) fn enforce_logged(retention: &RetentionManager, stats: &WriterStats) {
    match retention.enforce() {
        Ok(report) => {
            stats.record_retention(report.removed.len() as u64, report.failed.len() as u64);
            if !report.removed.is_empty() {
                info!(
                    removed = report.removed.len(),
                    retained = report.retained,
                    "retention evicted backup segments"
                );
            }
        }
        Err(err) => {
            warn!(error = %err, "retention pass failed");
            stats.record_retention(0, 1);
        }
    }
}
