//! Active log file handle.

use crate::error::{StorageError, StorageResult};
use std::fs::{self, File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

/// An append-only handle on the active log file.
///
/// The handle remembers how many bytes the file holds. When an existing
/// file is opened the size is taken from its metadata, so a restarted
/// process resumes where the previous one stopped.
///
/// # Durability
///
/// - Writes are unbuffered: every successful `append` is visible to readers
/// - `flush()` calls `File::flush()` to push data to the OS
/// - `sync()` calls `File::sync_all()` to ensure data is on disk
///
/// # Example
///
/// ```no_run
/// use rotalog_storage::ActiveFile;
/// use std::path::Path;
///
/// let mut file = ActiveFile::open(Path::new("app.log")).unwrap();
/// file.append(b"persistent line\n").unwrap();
/// file.sync().unwrap();
/// ```
#[derive(Debug)]
pub struct ActiveFile {
    path: PathBuf,
    file: File,
    size: u64,
}

impl ActiveFile {
    /// Opens or creates the file at `path` in append mode.
    ///
    /// Existing content is kept and the size is seeded from disk.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be opened, created or stat'ed.
    pub fn open(path: &Path) -> StorageResult<Self> {
        let file = OpenOptions::new().append(true).create(true).open(path)?;
        let size = file.metadata()?.len();

        Ok(Self {
            path: path.to_path_buf(),
            file,
            size,
        })
    }

    /// Opens or creates the file, creating parent directories if needed.
    ///
    /// # Errors
    ///
    /// Returns an error if the path names a directory, if directories cannot
    /// be created or if the file cannot be opened.
    pub fn open_with_create_dirs(path: &Path) -> StorageResult<Self> {
        ensure_parent(path)?;
        Self::open(path)
    }

    /// Creates a fresh, empty file at `path`, truncating anything there.
    ///
    /// Used after rotation: the previous content has just been archived.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be created.
    pub fn create(path: &Path) -> StorageResult<Self> {
        ensure_parent(path)?;
        let file = OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(true)
            .open(path)?;

        Ok(Self {
            path: path.to_path_buf(),
            file,
            size: 0,
        })
    }

    /// Returns the path to the underlying file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Returns the number of bytes in the file.
    #[must_use]
    pub fn size(&self) -> u64 {
        self.size
    }

    /// Appends `data` to the end of the file.
    ///
    /// Returns the offset where the data starts.
    ///
    /// # Errors
    ///
    /// Returns the I/O error unchanged. If the write failed part way, the
    /// tracked size is re-read from disk so it still matches the file.
    pub fn append(&mut self, data: &[u8]) -> StorageResult<u64> {
        let offset = self.size;
        if data.is_empty() {
            return Ok(offset);
        }

        if let Err(err) = self.file.write_all(data) {
            if let Ok(meta) = self.file.metadata() {
                self.size = meta.len();
            }
            return Err(StorageError::Io(err));
        }

        self.size += data.len() as u64;
        Ok(offset)
    }

    /// Flushes pending writes to the OS.
    ///
    /// # Errors
    ///
    /// Returns an error if the flush operation fails.
    pub fn flush(&mut self) -> StorageResult<()> {
        self.file.flush()?;
        Ok(())
    }

    /// Syncs data and metadata to durable storage.
    ///
    /// # Errors
    ///
    /// Returns an error if the sync operation fails.
    pub fn sync(&mut self) -> StorageResult<()> {
        self.file.sync_all()?;
        Ok(())
    }

    /// Flushes, syncs and releases the handle.
    ///
    /// # Errors
    ///
    /// Returns an error if flushing or syncing fails. The handle is
    /// released either way.
    pub fn close(mut self) -> StorageResult<()> {
        self.flush()?;
        self.sync()
    }
}

fn ensure_parent(path: &Path) -> StorageResult<()> {
    if path.file_name().is_none() {
        return Err(StorageError::InvalidPath {
            path: path.to_path_buf(),
            reason: "path has no file name",
        });
    }
    if path.is_dir() {
        return Err(StorageError::InvalidPath {
            path: path.to_path_buf(),
            reason: "path is a directory",
        });
    }
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use tempfile::tempdir;

    #[test]
    fn file_create_new() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("app.log");

        let file = ActiveFile::open(&path).unwrap();
        assert_eq!(file.size(), 0);
        assert!(path.exists());
    }

    #[test]
    fn file_append_offsets() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("app.log");

        let mut file = ActiveFile::open(&path).unwrap();

        let offset1 = file.append(b"hello").unwrap();
        assert_eq!(offset1, 0);

        let offset2 = file.append(b" world").unwrap();
        assert_eq!(offset2, 5);

        assert_eq!(file.size(), 11);
        assert_eq!(fs::read(&path).unwrap(), b"hello world");
    }

    #[test]
    fn file_resume_seeds_size() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("app.log");

        {
            let mut file = ActiveFile::open(&path).unwrap();
            file.append(b"persistent data").unwrap();
            file.close().unwrap();
        }

        {
            let mut file = ActiveFile::open(&path).unwrap();
            assert_eq!(file.size(), 15);

            let offset = file.append(b"!").unwrap();
            assert_eq!(offset, 15);
        }

        assert_eq!(fs::read(&path).unwrap(), b"persistent data!");
    }

    #[test]
    fn file_create_truncates() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("app.log");
        fs::write(&path, b"old content").unwrap();

        let file = ActiveFile::create(&path).unwrap();
        assert_eq!(file.size(), 0);
        assert_eq!(fs::metadata(&path).unwrap().len(), 0);
    }

    #[test]
    fn file_empty_append() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("app.log");

        let mut file = ActiveFile::open(&path).unwrap();
        file.append(b"x").unwrap();

        let offset = file.append(b"").unwrap();
        assert_eq!(offset, 1);
        assert_eq!(file.size(), 1);
    }

    #[test]
    fn file_create_with_dirs() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join("logs").join("app.log");

        let file = ActiveFile::open_with_create_dirs(&path).unwrap();
        assert_eq!(file.size(), 0);
        assert!(path.exists());
    }

    #[test]
    fn file_directory_path_rejected() {
        let dir = tempdir().unwrap();

        let result = ActiveFile::open_with_create_dirs(dir.path());
        assert!(matches!(result, Err(StorageError::InvalidPath { .. })));
    }

    #[test]
    fn file_flush_and_sync() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("app.log");

        let mut file = ActiveFile::open(&path).unwrap();
        file.append(b"data").unwrap();

        assert!(file.flush().is_ok());
        assert!(file.sync().is_ok());
        assert_eq!(file.path(), path);
    }

    proptest! {
        #[test]
        fn size_matches_disk(chunks in prop::collection::vec(prop::collection::vec(any::<u8>(), 0..64), 0..32)) {
            let dir = tempdir().unwrap();
            let path = dir.path().join("app.log");
            let mut file = ActiveFile::open(&path).unwrap();

            let mut expected = Vec::new();
            for chunk in &chunks {
                let offset = file.append(chunk).unwrap();
                prop_assert_eq!(offset, expected.len() as u64);
                expected.extend_from_slice(chunk);
            }

            prop_assert_eq!(file.size(), expected.len() as u64);
            prop_assert_eq!(fs::read(&path).unwrap(), expected);
        }
    }
}
