//! Test fixtures and log helpers.
//!
//! Provides a temporary log location with helpers for reading back what a
//! writer produced and for seeding backups with chosen timestamps.

use chrono::{NaiveDate, NaiveDateTime};
use rotalog_core::segment::{archive_path, format_token};
use rotalog_core::{
    list_segments, BackupSegment, Compressor, GzipCompressor, LogWriter, WriterConfig,
};
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// A log path inside a temporary directory that is removed on drop.
pub struct TestLog {
    path: PathBuf,
    /// The temporary directory (kept alive to prevent cleanup).
    _temp_dir: TempDir,
}

impl TestLog {
    /// Creates a fresh directory with an `app.log` path in it.
    pub fn new() -> Self {
        Self::named("app.log")
    }

    /// Creates a fresh directory with a log path of the given file name.
    pub fn named(file_name: &str) -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        Self {
            path: temp_dir.path().join(file_name),
            _temp_dir: temp_dir,
        }
    }

    /// Returns the active log path.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Returns the directory holding the log and its backups.
    pub fn dir(&self) -> &Path {
        self._temp_dir.path()
    }

    /// Returns a default configuration for this log.
    pub fn config(&self) -> WriterConfig {
        WriterConfig::new(&self.path)
    }

    /// Opens a writer with the given configuration.
    pub fn open(&self, config: WriterConfig) -> LogWriter {
        LogWriter::open(config).expect("Failed to open log writer")
    }

    /// Reads the active file, or returns nothing if it does not exist.
    pub fn read_active(&self) -> Vec<u8> {
        fs::read(&self.path).unwrap_or_default()
    }

    /// Lists backups, oldest first.
    pub fn backups(&self) -> Vec<BackupSegment> {
        list_segments(&self.path).expect("Failed to list backups")
    }

    /// Returns the decompressed content of each backup, oldest first.
    pub fn backup_contents(&self) -> Vec<Vec<u8>> {
        self.backups()
            .iter()
            .map(|segment| segment.read_all().expect("Failed to read backup"))
            .collect()
    }

    /// Concatenates all backups and the active file in write order.
    pub fn reassemble(&self) -> Vec<u8> {
        let mut data: Vec<u8> = self.backup_contents().concat();
        data.extend(self.read_active());
        data
    }

    /// Writes a backup named for `created_at`, optionally gzipped.
    pub fn seed_backup(
        &self,
        created_at: NaiveDateTime,
        sequence: u32,
        data: &[u8],
        compressed: bool,
    ) -> PathBuf {
        let path = archive_path(&self.path, &format_token(created_at), sequence);
        fs::write(&path, data).expect("Failed to seed backup");
        if compressed {
            GzipCompressor::default()
                .compress_segment(&path)
                .expect("Failed to compress backup")
        } else {
            path
        }
    }

    /// Names of every file in the log directory, sorted.
    pub fn file_names(&self) -> Vec<String> {
        let mut names: Vec<String> = fs::read_dir(self.dir())
            .expect("Failed to read log directory")
            .filter_map(Result::ok)
            .map(|entry| entry.file_name().to_string_lossy().into_owned())
            .collect();
        names.sort();
        names
    }
}

impl Default for TestLog {
    fn default() -> Self {
        Self::new()
    }
}

/// Midday UTC on the given date; handy for seeding backups.
pub fn at(year: i32, month: u32, day: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(year, month, day)
        .and_then(|date| date.and_hms_opt(12, 0, 0))
        .expect("Invalid date")
}

/// Runs a test with a temporary log location.
///
/// # Example
///
/// ```rust
/// use rotalog_testkit::with_temp_log;
///
/// with_temp_log(|log| {
///     let writer = log.open(log.config().max_size(16));
///     writer.write(b"hello").unwrap();
///     writer.close().unwrap();
///     assert_eq!(log.read_active(), b"hello");
/// });
/// ```
pub fn with_temp_log<F, R>(f: F) -> R
where
    F: FnOnce(&TestLog) -> R,
{
    let log = TestLog::new();
    f(&log)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reassemble_follows_write_order() {
        let log = TestLog::new();
        let writer = log.open(log.config().max_size(4));
        for chunk in [b"aaaa", b"bbbb", b"cccc"] {
            writer.write(chunk).unwrap();
        }
        writer.close().unwrap();

        assert_eq!(log.backups().len(), 2);
        assert_eq!(log.reassemble(), b"aaaabbbbcccc");
    }

    #[test]
    fn seeded_backups_are_listed() {
        let log = TestLog::new();
        log.seed_backup(at(2024, 1, 2), 0, b"two", true);
        log.seed_backup(at(2024, 1, 1), 0, b"one", false);

        let backups = log.backups();
        assert_eq!(backups.len(), 2);
        assert!(!backups[0].is_compressed());
        assert!(backups[1].is_compressed());
        assert_eq!(log.backup_contents(), vec![b"one".to_vec(), b"two".to_vec()]);
    }

    #[test]
    fn missing_active_reads_empty() {
        with_temp_log(|log| assert!(log.read_active().is_empty()));
    }
}
