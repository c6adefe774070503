//! # Rotalog Storage
//!
//! The lowest layer of rotalog: a handle on the **active file**, the file
//! that currently receives appended log bytes.
//!
//! ## Design Principles
//!
//! - The handle is a plain byte sink (append, flush, sync)
//! - Its size is seeded from disk and tracked on every append
//! - No knowledge of rotation, naming, compression or retention
//! - Callers own synchronization; the handle itself takes `&mut self`
//!
//! ## Example
//!
//! ```rust
//! use rotalog_storage::ActiveFile;
//!
//! let dir = tempfile::tempdir().unwrap();
//! let mut file = ActiveFile::open(&dir.path().join("app.log")).unwrap();
//! let offset = file.append(b"hello world\n").unwrap();
//! assert_eq!(offset, 0);
//! assert_eq!(file.size(), 12);
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod error;
mod file;

pub use error::{StorageError, StorageResult};
pub use file::ActiveFile;
