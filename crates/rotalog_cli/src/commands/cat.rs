//! Cat command implementation.

use rotalog_core::list_segments;
use std::fs::File;
use std::io::{self, Write};
use std::path::Path;

/// Runs the cat command.
pub fn run(path: &Path, segment: Option<&str>, all: bool) -> Result<(), Box<dyn std::error::Error>> {
    let stdout = io::stdout();
    let mut out = stdout.lock();
    copy_to(path, segment, all, &mut out)?;
    out.flush()?;
    Ok(())
}

/// Writes the selected backups (and optionally the active file) to `out`.
///
/// Backups are emitted oldest first, so with `all` the output is the full
/// log in write order.
pub fn copy_to<W: Write>(
    path: &Path,
    segment: Option<&str>,
    all: bool,
    out: &mut W,
) -> Result<u64, Box<dyn std::error::Error>> {
    let segments = list_segments(path)?;
    let mut copied = 0;

    if let Some(name) = segment {
        let found = segments
            .iter()
            .find(|s| s.path().file_name().is_some_and(|n| n.to_string_lossy() == name))
            .ok_or_else(|| format!("No backup named '{name}'"))?;
        return Ok(io::copy(&mut found.open_reader()?, out)?);
    }

    for segment in &segments {
        copied += io::copy(&mut segment.open_reader()?, out)?;
    }

    if all && path.exists() {
        copied += io::copy(&mut File::open(path)?, out)?;
    }

    Ok(copied)
}
