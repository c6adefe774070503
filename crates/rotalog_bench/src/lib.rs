//! Benchmark utilities.

use rand::Rng;
use rotalog_core::{LogWriter, WriterConfig};
use std::path::Path;

/// Generate random data of the specified size.
pub fn random_data(size: usize) -> Vec<u8> {
    let mut rng = rand::thread_rng();
    (0..size).map(|_| rng.gen()).collect()
}

/// Generate a printable, newline-terminated log line of the specified size.
///
/// Text compresses the way real logs do, unlike random bytes.
pub fn log_line(size: usize) -> Vec<u8> {
    const WORDS: [&str; 8] = ["request", "served", "in", "ms", "user", "GET", "/api/v1", "200"];
    let mut rng = rand::thread_rng();
    let mut line = Vec::with_capacity(size);
    while line.len() + 1 < size {
        line.extend_from_slice(WORDS[rng.gen_range(0..WORDS.len())].as_bytes());
        line.push(b' ');
    }
    line.truncate(size.saturating_sub(1));
    line.push(b'\n');
    line
}

/// Open a writer for `path` with the given rotation threshold.
pub fn open_writer(path: &Path, max_size: u64, compress: bool, background: bool) -> LogWriter {
    let config = WriterConfig::new(path)
        .max_size(max_size)
        .max_backups(4)
        .compress(compress)
        .background_compression(background);
    LogWriter::open(config).unwrap()
}
