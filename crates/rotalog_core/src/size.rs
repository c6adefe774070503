//! Byte accounting for the active file.

/// Tracks the size of the active file against its rotation threshold.
///
/// The tracker is owned by the writer's locked state and is only mutated
/// while the write lock is held.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SizeTracker {
    current: u64,
    max: u64,
}

impl SizeTracker {
    /// Creates a tracker for an active file already holding `current` bytes.
    #[must_use]
    pub const fn new(current: u64, max: u64) -> Self {
        Self { current, max }
    }

    /// Returns the current size in bytes.
    #[must_use]
    pub const fn current(&self) -> u64 {
        self.current
    }

    /// Returns the rotation threshold in bytes.
    #[must_use]
    pub const fn max(&self) -> u64 {
        self.max
    }

    /// Returns true if writing `len` more bytes must first rotate the file,
    /// i.e. `current + len > max`.
    #[must_use]
    pub const fn needs_rotation(&self, len: u64) -> bool {
        self.current.saturating_add(len) > self.max
    }

    /// Records `len` bytes written to the active file.
    pub fn record(&mut self, len: u64) {
        self.current = self.current.saturating_add(len);
    }

    /// Replaces the tracked size, e.g. after a failed partial write.
    pub fn seed(&mut self, current: u64) {
        self.current = current;
    }

    /// Resets the size after a rotation opened a fresh file.
    pub fn reset(&mut self) {
        self.current = 0;
    }
}
