//! Property-based test generators using proptest.
//!
//! Provides strategies for write sequences and writer limits.

use proptest::prelude::*;

/// Strategy for a single write payload of up to `max_len` bytes.
pub fn payload_strategy(max_len: usize) -> impl Strategy<Value = Vec<u8>> {
    prop::collection::vec(any::<u8>(), 1..=max_len.max(1))
}

/// Strategy for a sequence of writes.
pub fn write_sequence_strategy(
    max_len: usize,
    max_writes: usize,
) -> impl Strategy<Value = Vec<Vec<u8>>> {
    prop::collection::vec(payload_strategy(max_len), 1..=max_writes.max(1))
}

/// Strategy for newline-terminated text records.
pub fn line_strategy() -> impl Strategy<Value = String> {
    prop::string::string_regex("[a-zA-Z0-9 ]{0,40}")
        .expect("Invalid regex")
        .prop_map(|line| format!("{line}\n"))
}

/// Strategy for a rotation threshold small enough to rotate often.
pub fn max_size_strategy() -> impl Strategy<Value = u64> {
    8u64..512
}

/// Strategy for a backup count limit (0 = unlimited).
pub fn max_backups_strategy() -> impl Strategy<Value = usize> {
    prop_oneof![Just(0usize), 1usize..6]
}
