//! CLI command implementations.

pub mod cat;
pub mod list;
pub mod prune;
pub mod write;

use std::time::Duration;

const SECONDS_PER_DAY: u64 = 24 * 60 * 60;

/// Parses a byte count with an optional `K`, `M` or `G` suffix (powers of 1024).
pub fn parse_size(input: &str) -> Result<u64, String> {
    let input = input.trim();
    let (digits, multiplier) = match input.char_indices().last() {
        Some((idx, c)) if c.is_ascii_alphabetic() => {
            let multiplier: u64 = match c.to_ascii_uppercase() {
                'K' => 1024,
                'M' => 1024 * 1024,
                'G' => 1024 * 1024 * 1024,
                'B' => 1,
                _ => return Err(format!("unknown size suffix '{c}'")),
            };
            (&input[..idx], multiplier)
        }
        _ => (input, 1),
    };

    let value: u64 = digits
        .trim()
        .parse()
        .map_err(|_| format!("invalid size '{input}'"))?;
    let bytes = value
        .checked_mul(multiplier)
        .ok_or_else(|| format!("size '{input}' is too large"))?;
    if bytes == 0 {
        return Err("size must be greater than zero".to_string());
    }
    Ok(bytes)
}

/// Formats a byte count for display.
pub fn format_size(bytes: u64) -> String {
    if bytes < 1024 {
        format!("{} B", bytes)
    } else if bytes < 1024 * 1024 {
        format!("{:.1} KB", bytes as f64 / 1024.0)
    } else if bytes < 1024 * 1024 * 1024 {
        format!("{:.1} MB", bytes as f64 / (1024.0 * 1024.0))
    } else {
        format!("{:.1} GB", bytes as f64 / (1024.0 * 1024.0 * 1024.0))
    }
}

/// Converts a day count into a duration.
pub fn days(count: u64) -> Duration {
    Duration::from_secs(count.saturating_mul(SECONDS_PER_DAY))
}
