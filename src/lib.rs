//! iddedup - Identifier-keyed duplicate resolver
//!
//! Walks a directory tree in parallel, groups every regular file under an
//! identifier extracted from its path, and resolves identifiers seen more
//! than once: the copy in the newest date-named directory wins, and ties
//! are broken by file size. Deletion is a dry run unless explicitly armed.

pub mod actions;
pub mod cli;
pub mod config;
pub mod duplicates;
pub mod error;
pub mod logging;
pub mod output;
pub mod pool;
pub mod scanner;

use anyhow::{Context, Result};

use crate::actions::{Deleter, ResolutionReport};
use crate::cli::{Cli, Commands, DeleteArgs, ResolveArgs, ScanArgs};
use crate::config::Config;
use crate::duplicates::{PathGroups, SizeComparator};
use crate::error::ExitCode;
use crate::output::{load_snapshot, save_snapshot};
use crate::pool::WorkerPool;
use crate::scanner::Scanner;

/// Run the application with parsed arguments.
///
/// # Errors
///
/// Returns an error for fatal faults: invalid configuration, an unusable
/// scan root, or an unreadable snapshot. Per-path and per-group faults are
/// contained and reported through [`ExitCode::PartialSuccess`].
pub fn run_app(cli: Cli) -> Result<ExitCode> {
    let config = Config::load(cli.config.as_deref());

    match cli.command {
        Commands::Scan(args) => handle_scan(config, args),
        Commands::Resolve(args) => handle_resolve(config, args),
    }
}

fn handle_scan(mut config: Config, args: ScanArgs) -> Result<ExitCode> {
    if let Some(policy) = args.policy {
        config.policy = policy;
    }
    if args.snapshot.is_some() {
        config.snapshot = args.snapshot.clone();
    }
    apply_delete_overrides(&mut config, &args.delete);
    config.validate().context("Invalid configuration")?;

    let pool = WorkerPool::new(config.workers).context("Failed to start worker pool")?;
    let policy = config
        .policy
        .build(&config.delimiter, config.min_token_len);
    let scanner = Scanner::new(pool.clone(), policy);

    let (groups, stats) = scanner
        .scan(&args.root)
        .with_context(|| format!("Failed to scan {}", args.root.display()))?;

    if let Some(path) = &config.snapshot {
        save_snapshot(&groups, path).context("Failed to save snapshot")?;
    }

    if args.no_resolve {
        log::info!("Skipping resolution");
        return Ok(if stats.has_errors() {
            ExitCode::PartialSuccess
        } else {
            ExitCode::Success
        });
    }

    let report = resolve(&config, pool, &groups, args.delete.commit);
    Ok(exit_code_for(&report, stats.has_errors()))
}

fn handle_resolve(mut config: Config, args: ResolveArgs) -> Result<ExitCode> {
    apply_delete_overrides(&mut config, &args.delete);
    config.validate().context("Invalid configuration")?;

    let groups = load_snapshot(&args.snapshot).context("Failed to load snapshot")?;
    let pool = WorkerPool::new(config.workers).context("Failed to start worker pool")?;

    let report = resolve(&config, pool, &groups, args.delete.commit);
    Ok(exit_code_for(&report, false))
}

fn apply_delete_overrides(config: &mut Config, args: &DeleteArgs) {
    if let Some(workers) = args.workers {
        config.workers = workers;
    }
    if let Some(attempts) = args.max_attempts {
        config.max_attempts = attempts;
    }
    if let Some(backoff) = args.retry_backoff_ms {
        config.retry_backoff_ms = backoff;
    }
}

fn resolve(
    config: &Config,
    pool: WorkerPool,
    groups: &PathGroups,
    commit: bool,
) -> ResolutionReport {
    let mut deleter = Deleter::new(SizeComparator::new(pool))
        .with_retry_policy(config.retry_policy())
        .with_discard_extensions(config.discard_extensions.clone());
    if commit {
        deleter.commit();
    } else {
        log::info!("Dry run: pass --commit to delete files");
    }

    let report = deleter.delete_by_identifier(groups);
    for (path, reason) in &report.failures {
        log::error!("Could not delete {}: {}", path.display(), reason);
    }
    report
}

/// Map a finished pass to the process exit code.
#[must_use]
pub fn exit_code_for(report: &ResolutionReport, scan_errors: bool) -> ExitCode {
    if scan_errors || !report.is_clean() {
        ExitCode::PartialSuccess
    } else if report.groups_examined == 0 {
        ExitCode::NothingToResolve
    } else {
        ExitCode::Success
    }
}
