//! Stress tests for the rotating writer.
//!
//! These helpers drive a shared [`LogWriter`] from many threads and check
//! that every record landed whole and in per-thread order.

use rotalog_core::LogWriter;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

/// Smallest record that still fits its header and newline.
pub const MIN_RECORD_SIZE: usize = 16;

/// Result of a stress test run.
#[derive(Debug, Clone)]
pub struct StressTestResult {
    /// Total operations performed.
    pub total_ops: usize,
    /// Successful operations.
    pub successful_ops: usize,
    /// Failed operations.
    pub failed_ops: usize,
    /// Total duration.
    pub duration: Duration,
    /// Operations per second.
    pub ops_per_second: f64,
}

impl StressTestResult {
    /// Creates a new result.
    pub fn new(successful: usize, failed: usize, duration: Duration) -> Self {
        let total = successful + failed;
        let ops_per_second = if duration.as_secs_f64() > 0.0 {
            total as f64 / duration.as_secs_f64()
        } else {
            0.0
        };

        Self {
            total_ops: total,
            successful_ops: successful,
            failed_ops: failed,
            duration,
            ops_per_second,
        }
    }

    /// Prints a summary of the test.
    pub fn print_summary(&self, name: &str) {
        println!("\n=== {} ===", name);
        println!("Total operations: {}", self.total_ops);
        println!("Successful: {}", self.successful_ops);
        println!("Failed: {}", self.failed_ops);
        println!("Duration: {:?}", self.duration);
        println!("Throughput: {:.2} ops/sec", self.ops_per_second);
    }
}

/// Configuration for stress tests.
#[derive(Debug, Clone)]
pub struct StressConfig {
    /// Writes per thread.
    pub writes_per_thread: usize,
    /// Number of concurrent threads.
    pub threads: usize,
    /// Size of each record in bytes, newline included.
    pub record_size: usize,
}

impl Default for StressConfig {
    fn default() -> Self {
        Self {
            writes_per_thread: 1_000,
            threads: 4,
            record_size: 64,
        }
    }
}

impl StressConfig {
    /// Total number of records the run writes.
    pub fn total_records(&self) -> usize {
        self.threads * self.writes_per_thread
    }
}

/// Builds the record `thread` writes as its `seq`-th write.
///
/// Layout: `t<thread:03> <seq:08> xxxx...\n`, padded to `size` bytes.
pub fn record(thread: usize, seq: usize, size: usize) -> Vec<u8> {
    let size = size.max(MIN_RECORD_SIZE);
    let mut data = format!("t{thread:03} {seq:08} ").into_bytes();
    data.resize(size - 1, b'x');
    data.push(b'\n');
    data
}

/// Run a sequential write stress test.
pub fn stress_sequential_writes(writer: &LogWriter, config: &StressConfig) -> StressTestResult {
    let start = Instant::now();
    let mut successful = 0usize;
    let mut failed = 0usize;

    for i in 0..config.total_records() {
        match writer.write(&record(0, i, config.record_size)) {
            Ok(_) => successful += 1,
            Err(_) => failed += 1,
        }
    }

    StressTestResult::new(successful, failed, start.elapsed())
}

/// Run a concurrent write stress test.
pub fn stress_concurrent_writes(writer: Arc<LogWriter>, config: &StressConfig) -> StressTestResult {
    let successful = Arc::new(AtomicUsize::new(0));
    let failed = Arc::new(AtomicUsize::new(0));

    let start = Instant::now();

    let handles: Vec<_> = (0..config.threads)
        .map(|t| {
            let writer = Arc::clone(&writer);
            let successful = Arc::clone(&successful);
            let failed = Arc::clone(&failed);
            let writes = config.writes_per_thread;
            let size = config.record_size;

            thread::spawn(move || {
                for i in 0..writes {
                    match writer.write(&record(t, i, size)) {
                        Ok(_) => {
                            successful.fetch_add(1, Ordering::Relaxed);
                        }
                        Err(_) => {
                            failed.fetch_add(1, Ordering::Relaxed);
                        }
                    }
                }
            })
        })
        .collect();

    for handle in handles {
        handle.join().expect("Thread panicked");
    }

    StressTestResult::new(
        successful.load(Ordering::Relaxed),
        failed.load(Ordering::Relaxed),
        start.elapsed(),
    )
}

/// Checks reassembled log output produced by the stress helpers.
///
/// Every record must be whole, and each thread's records must appear in the
/// order it wrote them. Returns the number of records found.
pub fn verify_records(data: &[u8], record_size: usize) -> Result<usize, String> {
    let record_size = record_size.max(MIN_RECORD_SIZE);
    if data.len() % record_size != 0 {
        return Err(format!(
            "{} bytes is not a whole number of {}-byte records",
            data.len(),
            record_size
        ));
    }

    let mut next_seq: HashMap<usize, usize> = HashMap::new();
    for (index, chunk) in data.chunks(record_size).enumerate() {
        let (thread, seq) = parse_header(chunk).ok_or_else(|| format!("record {index} is torn"))?;
        if chunk != record(thread, seq, record_size).as_slice() {
            return Err(format!("record {index} is corrupted"));
        }

        let expected = next_seq.entry(thread).or_insert(0);
        if seq != *expected {
            return Err(format!(
                "thread {thread} wrote {seq} where {expected} was expected"
            ));
        }
        *expected += 1;
    }

    Ok(data.len() / record_size)
}

fn parse_header(chunk: &[u8]) -> Option<(usize, usize)> {
    let text = std::str::from_utf8(chunk.get(..13)?).ok()?;
    let thread = text.strip_prefix('t')?.get(..3)?.parse().ok()?;
    let seq = text.get(5..13)?.parse().ok()?;
    Some((thread, seq))
}
