//! Rotalog CLI
//!
//! Command-line tools for size-rotated log files.
//!
//! # Commands
//!
//! - `write` - Pipe stdin into a rotating log
//! - `list` - List the backups of a log
//! - `prune` - Apply a retention policy to existing backups
//! - `cat` - Print backups, decompressing as needed

mod commands;

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// Rotating log file tools.
#[derive(Parser)]
#[command(name = "rotalog")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Path to the active log file
    #[arg(global = true, short, long)]
    path: Option<PathBuf>,

    /// Enable verbose output
    #[arg(global = true, short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Append stdin to the log, rotating by size
    Write {
        /// Rotation threshold (accepts K, M and G suffixes)
        #[arg(short = 's', long, default_value = "100M", value_parser = commands::parse_size)]
        max_size: u64,

        /// Backups to keep (0 = unlimited)
        #[arg(short = 'n', long, default_value = "0")]
        max_backups: usize,

        /// Delete backups older than this many days
        #[arg(long)]
        max_age_days: Option<u64>,

        /// Gzip rotated backups
        #[arg(short, long)]
        compress: bool,

        /// Name backups with local time instead of UTC
        #[arg(long)]
        local_time: bool,

        /// Also echo input to stdout
        #[arg(long)]
        tee: bool,

        /// Print writer statistics as JSON to stderr when done
        #[arg(long)]
        stats: bool,
    },

    /// List backups, oldest first
    List {
        /// Output format (text, json)
        #[arg(short, long, default_value = "text")]
        format: String,
    },

    /// Delete backups beyond a retention policy
    Prune {
        /// Backups to keep (0 = unlimited)
        #[arg(short = 'n', long, default_value = "0")]
        max_backups: usize,

        /// Delete backups older than this many days
        #[arg(long)]
        max_age_days: Option<u64>,

        /// Backups are named with local time
        #[arg(long)]
        local_time: bool,

        /// Dry run - show what would be deleted
        #[arg(short, long)]
        dry_run: bool,
    },

    /// Print backups to stdout, oldest first
    Cat {
        /// Print only the backup with this file name
        #[arg(short, long)]
        segment: Option<String>,

        /// Append the active file after the backups
        #[arg(short, long)]
        all: bool,
    },

    /// Show version information
    Version,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Logs go to stderr so `cat` and `write --tee` keep stdout clean.
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Write {
            max_size,
            max_backups,
            max_age_days,
            compress,
            local_time,
            tee,
            stats,
        } => {
            let path = cli.path.ok_or("Log path required for write")?;
            let options = commands::write::WriteOptions {
                max_size,
                max_backups,
                max_age: max_age_days.map(commands::days),
                compress,
                local_time,
                tee,
                print_stats: stats,
            };
            commands::write::run(&path, &options)?;
        }
        Commands::List { format } => {
            let path = cli.path.ok_or("Log path required for list")?;
            commands::list::run(&path, &format)?;
        }
        Commands::Prune {
            max_backups,
            max_age_days,
            local_time,
            dry_run,
        } => {
            let path = cli.path.ok_or("Log path required for prune")?;
            let max_age = max_age_days.map(commands::days);
            commands::prune::run(&path, max_backups, max_age, local_time, dry_run)?;
        }
        Commands::Cat { segment, all } => {
            let path = cli.path.ok_or("Log path required for cat")?;
            commands::cat::run(&path, segment.as_deref(), all)?;
        }
        Commands::Version => {
            println!("Rotalog CLI v{}", env!("CARGO_PKG_VERSION"));
            println!("Rotalog Core v{}", rotalog_core::VERSION);
        }
    }

    Ok(())
}
