//! List command implementation.

use super::format_size;
use rotalog_core::{list_segments, BackupSegment};
use serde::Serialize;
use std::fs;
use std::path::Path;

/// Listing of a log and its backups.
#[derive(Debug, Serialize)]
pub struct ListResult {
    /// Active file path.
    pub path: String,
    /// Active file size in bytes (0 if absent).
    pub active_size: u64,
    /// Backups, oldest first.
    pub backups: Vec<BackupInfo>,
    /// Total size of all backups on disk.
    pub total_backup_size: u64,
}

/// One backup segment.
#[derive(Debug, Serialize)]
pub struct BackupInfo {
    /// File name.
    pub name: String,
    /// Rotation timestamp (`YYYY-MM-DD HH:MM:SS`).
    pub created_at: String,
    /// Sequence within the timestamp's second.
    pub sequence: u32,
    /// Whether the file is gzipped.
    pub compressed: bool,
    /// Size on disk in bytes.
    pub size: u64,
}

/// Runs the list command.
pub fn run(path: &Path, format: &str) -> Result<(), Box<dyn std::error::Error>> {
    let result = collect(path)?;

    match format {
        "json" => println!("{}", serde_json::to_string_pretty(&result)?),
        _ => print_text_output(&result),
    }

    Ok(())
}

/// Gathers the listing without printing it.
pub fn collect(path: &Path) -> Result<ListResult, Box<dyn std::error::Error>> {
    let active_size = fs::metadata(path).map(|m| m.len()).unwrap_or(0);

    let mut backups = Vec::new();
    for segment in list_segments(path)? {
        backups.push(backup_info(&segment)?);
    }
    let total_backup_size = backups.iter().map(|b| b.size).sum();

    Ok(ListResult {
        path: path.display().to_string(),
        active_size,
        backups,
        total_backup_size,
    })
}

fn backup_info(segment: &BackupSegment) -> Result<BackupInfo, Box<dyn std::error::Error>> {
    let name = segment
        .path()
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();

    Ok(BackupInfo {
        name,
        created_at: segment.created_at().to_string(),
        sequence: segment.sequence(),
        compressed: segment.is_compressed(),
        size: segment.size_on_disk()?,
    })
}

fn print_text_output(result: &ListResult) {
    println!("Log: {}", result.path);
    println!("  Active size: {}", format_size(result.active_size));
    println!();

    if result.backups.is_empty() {
        println!("No backups");
        return;
    }

    println!("Backups ({}):", result.backups.len());
    for backup in &result.backups {
        println!(
            "  {:<40} {:>10}  {}{}",
            backup.name,
            format_size(backup.size),
            backup.created_at,
            if backup.compressed { "  [gz]" } else { "" }
        );
    }
    println!();
    println!("  Total: {}", format_size(result.total_backup_size));
}

#[cfg(test)]
mod tests {
    use super::*;
    use rotalog_core::{LogWriter, WriterConfig};
    use tempfile::tempdir;

    #[test]
    fn lists_backups_in_order() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("app.log");
        let writer = LogWriter::open(WriterConfig::new(&path).max_size(10)).unwrap();
        for _ in 0..3 {
            writer.write(b"0123456789").unwrap();
        }
        writer.close().unwrap();

        let result = collect(&path).unwrap();
        assert_eq!(result.active_size, 10);
        assert_eq!(result.backups.len(), 2);
        assert_eq!(result.total_backup_size, 20);
        assert!(result.backups.iter().all(|b| !b.compressed));
        assert!(result.backups[0].name.starts_with("app.log."));

        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json["backups"].as_array().unwrap().len(), 2);
    }

    #[test]
    fn missing_log_is_empty() {
        let dir = tempdir().unwrap();
        let result = collect(&dir.path().join("absent.log")).unwrap();
        assert_eq!(result.active_size, 0);
        assert!(result.backups.is_empty());
    }
}
