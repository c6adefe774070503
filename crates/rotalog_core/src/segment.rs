//! Backup segment naming and discovery.
//!
//! A rotated file is archived next to the active file with a timestamp
//! token and a sequence number appended to its name:
//!
//! ```text
//! app.log                          # active file
//! app.log.20240517_093012_000000     # backup
//! app.log.20240517_093012_000001     # second rotation in the same second
//! app.log.20240517_101500_000000.gz  # compressed backup
//! ```
//!
//! Token and sequence are both fixed width, so sorting names as text is
//! chronological order. Names without a sequence (`app.log.20240517_093012`)
//! are accepted with sequence 0.

use crate::compress::{COMPRESSED_SUFFIX, TEMP_SUFFIX};
use crate::error::CoreResult;
use chrono::{Local, NaiveDateTime, Utc};
use flate2::read::GzDecoder;
use std::collections::BTreeMap;
use std::ffi::OsString;
use std::fs::{self, File};
use std::io::{self, BufReader, Read};
use std::path::{Path, PathBuf};

/// `strftime` format of the timestamp token.
pub const TIMESTAMP_FORMAT: &str = "%Y%m%d_%H%M%S";

/// Length of a formatted timestamp token.
const TOKEN_LEN: usize = 15;

/// Largest sequence number that still fits the fixed-width name.
pub const MAX_SEQUENCE: u32 = 999_999;

/// A closed, archived former active file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackupSegment {
    path: PathBuf,
    created_at: NaiveDateTime,
    sequence: u32,
    compressed: bool,
}

impl BackupSegment {
    /// Returns the path of the segment file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Returns the rotation time parsed from the name.
    #[must_use]
    pub fn created_at(&self) -> NaiveDateTime {
        self.created_at
    }

    /// Returns the disambiguating sequence number.
    #[must_use]
    pub fn sequence(&self) -> u32 {
        self.sequence
    }

    /// Returns true if the segment is gzip-compressed.
    #[must_use]
    pub fn is_compressed(&self) -> bool {
        self.compressed
    }

    /// Chronological sort key.
    #[must_use]
    pub fn key(&self) -> (NaiveDateTime, u32) {
        (self.created_at, self.sequence)
    }

    /// Returns the size of the segment file on disk.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be stat'ed.
    pub fn size_on_disk(&self) -> CoreResult<u64> {
        Ok(fs::metadata(&self.path)?.len())
    }

    /// Opens a reader over the segment's original bytes, decompressing
    /// `.gz` segments on the fly.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be opened.
    pub fn open_reader(&self) -> CoreResult<Box<dyn Read + Send>> {
        let file = BufReader::new(File::open(&self.path)?);
        if self.compressed {
            Ok(Box::new(GzDecoder::new(file)))
        } else {
            Ok(Box::new(file))
        }
    }

    /// Reads the segment's original bytes into memory.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or decompressed.
    pub fn read_all(&self) -> CoreResult<Vec<u8>> {
        let mut data = Vec::new();
        self.open_reader()?.read_to_end(&mut data)?;
        Ok(data)
    }

    /// Deletes the segment.
    ///
    /// An uncompressed segment may have a `.gz` sibling or a temporary file
    /// left by an interrupted compression; those are removed as well.
    ///
    /// # Errors
    ///
    /// Returns the error from deleting the segment file itself.
    pub fn remove(&self) -> io::Result<()> {
        if !self.compressed {
            for suffix in [COMPRESSED_SUFFIX, TEMP_SUFFIX] {
                remove_if_exists(&with_suffix(&self.path, suffix))?;
            }
        }
        fs::remove_file(&self.path)
    }
}

/// Formats a timestamp token for `at`.
#[must_use]
pub fn format_token(at: NaiveDateTime) -> String {
    at.format(TIMESTAMP_FORMAT).to_string()
}

/// Returns the current time as a timestamp token.
#[must_use]
pub fn current_token(local_time: bool) -> String {
    let now = if local_time {
        Local::now().naive_local()
    } else {
        Utc::now().naive_utc()
    };
    format_token(now)
}

/// Builds the archive path for a rotation of `active`.
///
/// `sequence` is zero-padded to six digits; callers keep it at or below
/// [`MAX_SEQUENCE`].
#[must_use]
pub fn archive_path(active: &Path, token: &str, sequence: u32) -> PathBuf {
    with_suffix(active, &format!(".{token}_{sequence:06}"))
}

/// Appends `suffix` to the final component of `path`.
#[must_use]
pub fn with_suffix(path: &Path, suffix: &str) -> PathBuf {
    let mut name = OsString::from(path.as_os_str());
    name.push(suffix);
    PathBuf::from(name)
}

/// Parses a backup file name belonging to the active file named `base`.
///
/// Returns `(created_at, sequence, compressed)` or `None` if the name is
/// not a backup of `base`.
#[must_use]
pub fn parse_backup_name(base: &str, file_name: &str) -> Option<(NaiveDateTime, u32, bool)> {
    let rest = file_name.strip_prefix(base)?.strip_prefix('.')?;
    let (rest, compressed) = match rest.strip_suffix(COMPRESSED_SUFFIX) {
        Some(stripped) => (stripped, true),
        None => (rest, false),
    };

    if rest.len() < TOKEN_LEN || !rest.is_char_boundary(TOKEN_LEN) {
        return None;
    }
    let (token, tail) = rest.split_at(TOKEN_LEN);
    if !is_token_shape(token) {
        return None;
    }
    let created_at = NaiveDateTime::parse_from_str(token, TIMESTAMP_FORMAT).ok()?;

    let sequence = if tail.is_empty() {
        0
    } else {
        let digits = tail.strip_prefix('_')?;
        if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
        digits.parse().ok()?
    };

    Some((created_at, sequence, compressed))
}

fn is_token_shape(token: &str) -> bool {
    token.bytes().enumerate().all(|(i, b)| {
        if i == 8 {
            b == b'_'
        } else {
            b.is_ascii_digit()
        }
    })
}

/// Lists the backup segments of `active`, oldest first.
///
/// A plain file and its `.gz` sibling carrying the same token are one
/// segment whose compression has not finished; it is reported once, as
/// uncompressed.
///
/// # Errors
///
/// Returns an error if the directory cannot be read.
pub fn list_segments(active: &Path) -> CoreResult<Vec<BackupSegment>> {
    let Some(base) = active.file_name().and_then(|n| n.to_str()) else {
        return Ok(Vec::new());
    };
    let dir = match active.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };

    let entries = match fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(err) => return Err(err.into()),
    };

    let mut segments: BTreeMap<(NaiveDateTime, u32), BackupSegment> = BTreeMap::new();
    for entry in entries {
        let entry = entry?;
        if !entry.file_type()?.is_file() {
            continue;
        }
        let file_name = entry.file_name();
        let Some(name) = file_name.to_str() else {
            continue;
        };
        let Some((created_at, sequence, compressed)) = parse_backup_name(base, name) else {
            continue;
        };

        let segment = BackupSegment {
            path: dir.join(name),
            created_at,
            sequence,
            compressed,
        };
        segments
            .entry(segment.key())
            .and_modify(|existing| {
                if !segment.compressed {
                    *existing = segment.clone();
                }
            })
            .or_insert(segment);
    }

    Ok(segments.into_values().collect())
}

fn remove_if_exists(path: &Path) -> io::Result<()> {
    match fs::remove_file(path) {
        Err(err) if err.kind() != io::ErrorKind::NotFound => Err(err),
        _ => Ok(()),
    }
}
