//! Command-line interface definitions for iddedup.
//!
//! Global options (verbosity, config file, error format) plus two
//! subcommands: `scan` walks a tree and resolves what it finds, `resolve`
//! replays a saved snapshot through the resolution engine.
//!
//! # Example
//!
//! ```bash
//! # Dry run over a share (nothing is deleted)
//! iddedup scan /mnt/share
//!
//! # Save a snapshot without resolving
//! iddedup scan /mnt/share --snapshot scan_snapshot.json --no-resolve
//!
//! # Replay the snapshot and actually delete
//! iddedup resolve scan_snapshot.json --commit
//! ```

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

use crate::output::json::DEFAULT_SNAPSHOT_NAME;
use crate::scanner::PolicyKind;

/// Identifier-keyed duplicate resolver.
///
/// Groups files under a directory tree by an identifier embedded in their
/// names, then keeps the newest copy of each identifier: by date-named
/// parent directory first, then by file size.
#[derive(Debug, Parser)]
#[command(name = "iddedup")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Increase verbosity level (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Configuration file (defaults to the platform config directory)
    #[arg(long, value_name = "PATH", global = true)]
    pub config: Option<PathBuf>,

    /// Print fatal errors as JSON on stderr
    #[arg(long, global = true)]
    pub json_errors: bool,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Available subcommands.
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Scan a directory tree and resolve duplicated identifiers
    Scan(ScanArgs),
    /// Resolve duplicated identifiers from a saved snapshot
    Resolve(ResolveArgs),
}

/// Arguments for the scan subcommand.
#[derive(Debug, Args)]
pub struct ScanArgs {
    /// Root directory to scan
    #[arg(value_name = "ROOT")]
    pub root: PathBuf,

    /// How files are grouped
    #[arg(long, value_enum)]
    pub policy: Option<PolicyKind>,

    /// Write the identifier -> paths mapping to this JSON file
    ///
    /// Without a value, writes `scan_snapshot.json` in the working directory.
    #[arg(
        long,
        value_name = "PATH",
        num_args = 0..=1,
        default_missing_value = DEFAULT_SNAPSHOT_NAME
    )]
    pub snapshot: Option<PathBuf>,

    /// Stop after scanning (and saving the snapshot)
    #[arg(long)]
    pub no_resolve: bool,

    #[command(flatten)]
    pub delete: DeleteArgs,
}

/// Arguments for the resolve subcommand.
#[derive(Debug, Args)]
pub struct ResolveArgs {
    /// Snapshot written by a previous scan
    #[arg(value_name = "SNAPSHOT")]
    pub snapshot: PathBuf,

    #[command(flatten)]
    pub delete: DeleteArgs,
}

/// Options shared by every command that resolves.
#[derive(Debug, Args)]
pub struct DeleteArgs {
    /// Actually delete files (the default is a dry run)
    #[arg(long)]
    pub commit: bool,

    /// Worker threads for scanning and size probing
    #[arg(short, long, value_name = "N")]
    pub workers: Option<usize>,

    /// Deletion attempts per path on permission faults
    #[arg(long, value_name = "N")]
    pub max_attempts: Option<u32>,

    /// Pause between deletion attempts, in milliseconds
    #[arg(long, value_name = "MS")]
    pub retry_backoff_ms: Option<u64>,
}
