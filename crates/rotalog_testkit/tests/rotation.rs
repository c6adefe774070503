//! Cross-crate tests of rotation, retention and compression behavior.

use proptest::prelude::*;
use rotalog_core::{LogWriter, RetentionManager, RetentionPolicy, WriterState};
use rotalog_testkit::prelude::*;
use std::sync::Arc;
use std::time::Duration;

#[test]
fn overflowing_write_rotates_first() {
    let log = TestLog::new();
    let writer = log.open(log.config().max_size(100));

    writer.write(&[b'a'; 60]).unwrap();
    assert_eq!(writer.current_size(), 60);

    writer.write(&[b'b'; 60]).unwrap();
    assert_eq!(writer.current_size(), 60);
    writer.close().unwrap();

    assert_eq!(log.backup_contents(), vec![vec![b'a'; 60]]);
    assert_eq!(log.read_active(), vec![b'b'; 60]);
}

#[test]
fn retention_keeps_the_newest() {
    let log = TestLog::new();
    let writer = log.open(log.config().max_size(8).max_backups(3));
    for i in 0..10u8 {
        writer.write(&[b'0' + i; 8]).unwrap();
    }
    writer.close().unwrap();

    let contents = log.backup_contents();
    assert_eq!(contents.len(), 3);
    assert_eq!(contents, vec![vec![b'6'; 8], vec![b'7'; 8], vec![b'8'; 8]]);
    assert_eq!(log.read_active(), vec![b'9'; 8]);
}

#[test]
fn background_compression_round_trip() {
    let log = TestLog::new();
    let writer = log.open(log.config().max_size(32).compress(true).max_backups(4));

    let lines: Vec<String> = (0..40).map(|i| format!("message number {i:05}\n")).collect();
    for line in &lines {
        writer.write(line.as_bytes()).unwrap();
    }
    // Closing drains the worker.
    writer.close().unwrap();

    let backups = log.backups();
    assert_eq!(backups.len(), 4);
    assert!(backups.iter().all(|s| s.is_compressed()));
    assert!(!log.file_names().iter().any(|n| n.ends_with(".gz.tmp")));

    let expected: String = lines[lines.len() - 5..].concat();
    assert_eq!(log.reassemble(), expected.as_bytes());
}

#[test]
fn backup_count_stays_bounded_while_open() {
    let log = TestLog::new();
    let writer = log.open(log.config().max_size(16).compress(true).max_backups(2));

    for i in 0..60 {
        writer.write(format!("record {i:08}\n").as_bytes()).unwrap();
        assert!(writer.backups().unwrap().len() <= 2);
    }
    writer.close().unwrap();

    assert_eq!(log.backups().len(), 2);
    assert!(!log.file_names().iter().any(|n| n.ends_with(".gz.tmp")));
}

#[test]
fn oversized_first_write_still_rotates() {
    let log = TestLog::new();
    let writer = log.open(log.config().max_size(10));

    writer.write(&[b'z'; 25]).unwrap();
    assert_eq!(writer.stats().rotations, 1);
    writer.close().unwrap();

    assert_eq!(log.backup_contents(), vec![Vec::new()]);
    assert_eq!(log.read_active(), vec![b'z'; 25]);
}

#[test]
fn restart_resumes_size_from_disk() {
    let log = TestLog::new();
    {
        let writer = log.open(log.config().max_size(100));
        writer.write(&[b'a'; 70]).unwrap();
    }

    let writer = log.open(log.config().max_size(100));
    assert_eq!(writer.current_size(), 70);

    writer.write(&[b'b'; 40]).unwrap();
    assert_eq!(writer.current_size(), 40);
    assert_eq!(log.backup_contents(), vec![vec![b'a'; 70]]);
}

#[test]
fn restart_does_not_reuse_backup_names() {
    let log = TestLog::new();
    for round in 0..3u8 {
        let writer = log.open(log.config().max_size(4));
        writer.write(&[round; 4]).unwrap();
        writer.write(&[round; 4]).unwrap();
        writer.close().unwrap();
    }

    // Each round rotates once, and a restart in the same second must not
    // overwrite the previous round's backup.
    assert_eq!(log.backups().len(), 5);
}

#[test]
fn writes_after_close_fail() {
    let log = TestLog::new();
    let writer = log.open(log.config());
    writer.close().unwrap();

    assert_eq!(writer.state(), WriterState::Closed);
    assert!(writer.write(b"late").is_err());
    assert!(writer.rotate().is_err());
}

#[test]
fn concurrent_writers_never_split_records() {
    let log = TestLog::new();
    let writer = Arc::new(log.open(log.config().max_size(1000).compress(true)));
    let config = StressConfig {
        writes_per_thread: 300,
        threads: 8,
        record_size: 50,
    };

    let result = stress_concurrent_writes(Arc::clone(&writer), &config);
    writer.close().unwrap();

    assert_eq!(result.failed_ops, 0);
    assert_eq!(verify_records(&log.reassemble(), 50), Ok(config.total_records()));
    for segment in log.backups() {
        assert_eq!(segment.read_all().unwrap().len(), 1000);
    }
}

#[test]
fn pruning_by_age_spares_recent_backups() {
    let log = TestLog::new();
    log.seed_backup(at(2024, 3, 1), 0, b"march", true);
    log.seed_backup(at(2024, 3, 20), 0, b"late march", false);
    log.seed_backup(at(2024, 3, 28), 0, b"end of march", false);

    let policy = RetentionPolicy {
        max_backups: 0,
        max_age: Some(Duration::from_secs(10 * 24 * 3600)),
    };
    let report = RetentionManager::new(log.path(), policy, false)
        .enforce_at(at(2024, 3, 29))
        .unwrap();

    assert_eq!(report.removed.len(), 1);
    assert_eq!(
        log.backup_contents(),
        vec![b"late march".to_vec(), b"end of march".to_vec()]
    );
}

#[test]
fn writer_picks_up_existing_backups() {
    let log = TestLog::new();
    log.seed_backup(at(2020, 1, 1), 0, b"ancient", false);
    log.seed_backup(at(2020, 1, 2), 0, b"old", true);

    let writer = log.open(log.config().max_size(4).max_backups(2));
    writer.write(b"abcd").unwrap();
    writer.write(b"efgh").unwrap();
    writer.close().unwrap();

    assert_eq!(
        log.backup_contents(),
        vec![b"old".to_vec(), b"abcd".to_vec()]
    );
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    #[test]
    fn active_file_stays_within_limit(
        max_size in max_size_strategy(),
        writes in write_sequence_strategy(64, 40),
    ) {
        let log = TestLog::new();
        let writer = LogWriter::open(log.config().max_size(max_size)).unwrap();

        for payload in &writes {
            let before = writer.current_size();
            let rotations = writer.stats().rotations;
            writer.write(payload).unwrap();

            let len = payload.len() as u64;
            if before + len > max_size {
                prop_assert_eq!(writer.stats().rotations, rotations + 1);
                prop_assert_eq!(writer.current_size(), len);
            } else {
                prop_assert_eq!(writer.stats().rotations, rotations);
                prop_assert_eq!(writer.current_size(), before + len);
            }
        }
        writer.close().unwrap();

        for segment in log.backups() {
            let size = segment.read_all().unwrap().len() as u64;
            // Only a single oversized write may exceed the limit.
            prop_assert!(size <= max_size || writes.iter().any(|w| w.len() as u64 == size));
        }
        prop_assert_eq!(log.reassemble(), writes.concat());
    }

    #[test]
    fn backup_count_is_bounded(
        max_backups in max_backups_strategy(),
        lines in prop::collection::vec(line_strategy(), 1..60),
    ) {
        let log = TestLog::new();
        let writer = LogWriter::open(log.config().max_size(32).max_backups(max_backups)).unwrap();
        for line in &lines {
            writer.write(line.as_bytes()).unwrap();
        }
        let rotations = writer.stats().rotations as usize;
        writer.close().unwrap();

        let backups = log.backups().len();
        if max_backups == 0 {
            prop_assert_eq!(backups, rotations);
        } else {
            prop_assert_eq!(backups, rotations.min(max_backups));
        }

        let all: String = lines.concat();
        prop_assert!(all.as_bytes().ends_with(&log.reassemble()));
    }
}
