//! # Rotalog Testkit
//!
//! Test utilities for Rotalog.
//!
//! This crate provides:
//! - Temporary log fixtures with read-back helpers
//! - Property-based test generators using proptest
//! - Concurrent stress harnesses with record verification
//!
//! ## Usage
//!
//! ```rust
//! use rotalog_testkit::prelude::*;
//!
//! with_temp_log(|log| {
//!     let writer = log.open(log.config().max_size(64));
//!     writer.write(b"hello\n").unwrap();
//!     writer.close().unwrap();
//!     assert_eq!(log.reassemble(), b"hello\n");
//! });
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod fixtures;
pub mod generators;
pub mod stress;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::fixtures::*;
    pub use crate::generators::*;
    pub use crate::stress::*;
}

pub use fixtures::*;
pub use generators::*;
pub use stress::*;
