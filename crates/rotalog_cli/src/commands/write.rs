//! Write command implementation.

use rotalog_core::{LogWriter, StatsSnapshot, WriterConfig};
use std::io::{self, BufRead, Write};
use std::path::Path;
use std::time::Duration;
use tracing::info;

/// Options for the write command.
#[derive(Debug, Clone)]
pub struct WriteOptions {
    /// Rotation threshold in bytes.
    pub max_size: u64,
    /// Backups to keep (0 = unlimited).
    pub max_backups: usize,
    /// Maximum backup age.
    pub max_age: Option<Duration>,
    /// Gzip rotated backups.
    pub compress: bool,
    /// Name backups with local time.
    pub local_time: bool,
    /// Echo input to stdout.
    pub tee: bool,
    /// Print statistics as JSON to stderr when done.
    pub print_stats: bool,
}

impl WriteOptions {
    fn config(&self, path: &Path) -> WriterConfig {
        let mut config = WriterConfig::new(path)
            .max_size(self.max_size)
            .max_backups(self.max_backups)
            .compress(self.compress)
            .local_time(self.local_time);
        if let Some(age) = self.max_age {
            config = config.max_age(age);
        }
        config
    }
}

/// Runs the write command.
pub fn run(path: &Path, options: &WriteOptions) -> Result<(), Box<dyn std::error::Error>> {
    let stdin = io::stdin();
    let stdout = io::stdout();
    let stats = pipe(path, options, stdin.lock(), stdout.lock())?;

    info!(
        writes = stats.writes,
        bytes = stats.bytes_written,
        rotations = stats.rotations,
        compressions = stats.compressions,
        removed = stats.segments_removed,
        "input drained"
    );

    if options.print_stats {
        eprintln!("{}", serde_json::to_string_pretty(&stats)?);
    }
    Ok(())
}

/// Copies `input` into the log one line at a time.
///
/// Each line is a single write, so a line never straddles two files.
pub fn pipe<R: BufRead, W: Write>(
    path: &Path,
    options: &WriteOptions,
    mut input: R,
    mut echo: W,
) -> Result<StatsSnapshot, Box<dyn std::error::Error>> {
    let writer = LogWriter::open(options.config(path))?;
    let mut line = Vec::new();

    loop {
        line.clear();
        if input.read_until(b'\n', &mut line)? == 0 {
            break;
        }
        writer.write(&line)?;
        if options.tee {
            echo.write_all(&line)?;
        }
    }

    echo.flush()?;
    writer.close()?;
    Ok(writer.stats())
}
