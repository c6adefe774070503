//! Prune command implementation.

use rotalog_core::{RetentionManager, RetentionPolicy};
use std::path::Path;
use std::time::Duration;

/// Runs the prune command.
pub fn run(
    path: &Path,
    max_backups: usize,
    max_age: Option<Duration>,
    local_time: bool,
    dry_run: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let policy = RetentionPolicy {
        max_backups,
        max_age,
    };
    if policy.is_unbounded() {
        return Err("Nothing to prune: set --max-backups or --max-age-days".into());
    }

    let manager = RetentionManager::new(path, policy, local_time);

    println!("Pruning backups of {:?}", path);
    if dry_run {
        println!("(dry run - no changes will be made)");
        println!();
        let doomed = manager.plan()?;
        for segment in &doomed {
            println!("  would remove {}", segment.path().display());
        }
        println!();
        println!("{} backup(s) would be removed", doomed.len());
        return Ok(());
    }
    println!();

    let report = manager.enforce()?;
    for removed in &report.removed {
        println!("  removed {}", removed.display());
    }
    for (failed, err) in &report.failed {
        println!("  FAILED {}: {}", failed.display(), err);
    }
    println!();
    println!(
        "Removed {}, kept {}, failed {}",
        report.removed.len(),
        report.retained,
        report.failed.len()
    );

    if report.failed.is_empty() {
        Ok(())
    } else {
        Err(format!("{} backup(s) could not be removed", report.failed.len()).into())
    }
}
