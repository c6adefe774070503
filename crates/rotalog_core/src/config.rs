//! Log writer configuration.

use crate::error::{CoreError, CoreResult};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Default size of the active file before rotation.
pub const DEFAULT_MAX_SIZE: u64 = 100 * 1024 * 1024; // 100 MiB

/// Default gzip level.
pub const DEFAULT_COMPRESSION_LEVEL: u32 = 6;

/// Default capacity of the background compression queue.
pub const DEFAULT_COMPRESSION_QUEUE: usize = 16;

/// Configuration for opening a [`LogWriter`](crate::LogWriter).
#[derive(Debug, Clone)]
pub struct WriterConfig {
    /// Path of the active log file.
    pub path: PathBuf,

    /// Maximum size of the active file in bytes before it is rotated.
    pub max_size: u64,

    /// Number of backup segments to keep (0 = keep all).
    pub max_backups: usize,

    /// Whether rotated segments are gzip-compressed.
    pub compress: bool,

    /// Backups older than this are removed (None = no age limit).
    pub max_age: Option<Duration>,

    /// Whether timestamp tokens use local time instead of UTC.
    pub local_time: bool,

    /// Gzip compression level, 0 through 9.
    pub compression_level: u32,

    /// Whether compression runs on a background worker thread.
    pub background_compression: bool,

    /// Capacity of the bounded queue feeding the compression worker.
    pub compression_queue: usize,

    /// Extra attempts for the archive rename, with exponential backoff.
    pub rename_retries: u32,
}

impl Default for WriterConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::new(),
            max_size: DEFAULT_MAX_SIZE,
            max_backups: 0,
            compress: false,
            max_age: None,
            local_time: false,
            compression_level: DEFAULT_COMPRESSION_LEVEL,
            background_compression: true,
            compression_queue: DEFAULT_COMPRESSION_QUEUE,
            rename_retries: 0,
        }
    }
}

impl WriterConfig {
    /// Creates a configuration for the given active file with default values.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            ..Self::default()
        }
    }

    /// Sets the maximum active file size in bytes.
    #[must_use]
    pub fn max_size(mut self, bytes: u64) -> Self {
        self.max_size = bytes;
        self
    }

    /// Sets how many backups are retained.
    #[must_use]
    pub fn max_backups(mut self, count: usize) -> Self {
        self.max_backups = count;
        self
    }

    /// Sets whether backups are compressed.
    #[must_use]
    pub fn compress(mut self, value: bool) -> Self {
        self.compress = value;
        self
    }

    /// Sets the maximum backup age.
    #[must_use]
    pub fn max_age(mut self, age: Duration) -> Self {
        self.max_age = Some(age);
        self
    }

    /// Sets whether timestamp tokens use local time.
    #[must_use]
    pub fn local_time(mut self, value: bool) -> Self {
        self.local_time = value;
        self
    }

    /// Sets the gzip compression level.
    #[must_use]
    pub fn compression_level(mut self, level: u32) -> Self {
        self.compression_level = level;
        self
    }

    /// Sets whether compression runs on a background worker.
    #[must_use]
    pub fn background_compression(mut self, value: bool) -> Self {
        self.background_compression = value;
        self
    }

    /// Sets the compression queue capacity.
    #[must_use]
    pub fn compression_queue(mut self, capacity: usize) -> Self {
        self.compression_queue = capacity;
        self
    }

    /// Sets the number of extra rename attempts during rotation.
    #[must_use]
    pub fn rename_retries(mut self, retries: u32) -> Self {
        self.rename_retries = retries;
        self
    }

    /// Returns the active file path.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Returns whether a background worker will be started.
    #[must_use]
    pub const fn uses_worker(&self) -> bool {
        self.compress && self.background_compression
    }

    /// Checks that the configuration can be used to open a writer.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::InvalidConfig`] describing the first problem found.
    pub fn validate(&self) -> CoreResult<()> {
        if self.path.as_os_str().is_empty() {
            return Err(CoreError::invalid_config("path must not be empty"));
        }
        if self.path.file_name().is_none() {
            return Err(CoreError::invalid_config(format!(
                "path has no file name: {}",
                self.path.display()
            )));
        }
        if self.max_size == 0 {
            return Err(CoreError::invalid_config("max_size must be greater than 0"));
        }
        if self.compression_level > 9 {
            return Err(CoreError::invalid_config(format!(
                "compression_level must be 0..=9, got {}",
                self.compression_level
            )));
        }
        if self.uses_worker() && self.compression_queue == 0 {
            return Err(CoreError::invalid_config(
                "compression_queue must be greater than 0 with background compression",
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config() {
        let config = WriterConfig::new("app.log");
        assert_eq!(config.max_size, DEFAULT_MAX_SIZE);
        assert_eq!(config.max_backups, 0);
        assert!(!config.compress);
        assert!(config.background_compression);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn builder_pattern() {
        let config = WriterConfig::new("logs/app.log")
            .max_size(1024)
            .max_backups(3)
            .compress(true)
            .compression_level(9)
            .rename_retries(2);

        assert_eq!(config.max_size, 1024);
        assert_eq!(config.max_backups, 3);
        assert!(config.compress);
        assert!(config.uses_worker());
        assert_eq!(config.compression_level, 9);
        assert_eq!(config.rename_retries, 2);
    }

    #[test]
    fn zero_max_size_rejected() {
        let result = WriterConfig::new("app.log").max_size(0).validate();
        assert!(matches!(result, Err(CoreError::InvalidConfig { .. })));
    }

    #[test]
    fn empty_path_rejected() {
        let result = WriterConfig::default().validate();
        assert!(matches!(result, Err(CoreError::InvalidConfig { .. })));
    }

    #[test]
    fn bad_level_rejected() {
        let result = WriterConfig::new("app.log").compression_level(10).validate();
        assert!(matches!(result, Err(CoreError::InvalidConfig { .. })));
    }

    #[test]
    fn zero_queue_only_matters_with_worker() {
        let config = WriterConfig::new("app.log").compression_queue(0);
        assert!(config.validate().is_ok());

        let config = config.compress(true);
        assert!(config.validate().is_err());

        let config = config.background_compression(false);
        assert!(config.validate().is_ok());
    }
}
