//! Resolution engine: choose one survivor per identifier and delete the rest.
//!
//! # Overview
//!
//! [`Deleter::delete_by_identifier`] runs a cascade of tie-break passes over
//! every identifier shared by more than one path:
//!
//! 1. **Resolve by date**: each path's parent directory name is its date
//!    bucket (`YYYY-MM-DD`). Paths outside the latest bucket are deleted.
//!    Incomplete-download sidecars (e.g. `.aria2`) are deleted outright and
//!    never bucketed.
//! 2. **Resolve by size**: if the latest bucket still holds several paths,
//!    the [`SizeComparator`] buckets them by size; in each size bucket the most
//!    recently modified path is kept and the rest are deleted.
//!
//! # Safety
//!
//! The engine starts in dry-run mode. [`Deleter::commit`] arms commit mode
//! for exactly one pass; the mode is reset to dry-run as soon as that pass
//! starts, so a second pass never deletes unless armed again.
//!
//! Faults are contained per path (see [`crate::actions::delete`]) and per
//! group: an unparseable date bucket aborts that group before anything in it
//! is deleted, and the pass moves on to the next identifier.
//!
//! # Example
//!
//! ```no_run
//! use iddedup::actions::Deleter;
//! use iddedup::duplicates::{PathGroups, SizeComparator};
//! use iddedup::pool::WorkerPool;
//!
//! let groups: PathGroups = serde_json::from_str("{}").unwrap();
//! let mut deleter = Deleter::new(SizeComparator::new(WorkerPool::new(4).unwrap()));
//!
//! // Dry run first, then for real
//! let preview = deleter.delete_by_identifier(&groups);
//! println!("{}", preview.summary());
//! let report = deleter.commit().delete_by_identifier(&groups);
//! println!("{}", report.summary());
//! ```

use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use thiserror::Error;

use super::delete::{try_delete, DeleteMode, DeleteOutcome, FsRemover, Remover, RetryPolicy};
use crate::duplicates::{CompareError, PathGroups, SizeComparator};

/// Format of a date bucket directory name.
pub const DATE_BUCKET_FORMAT: &str = "%Y-%m-%d";

/// Extensions deleted outright during date resolution by default.
pub const DEFAULT_DISCARD_EXTENSIONS: &[&str] = &["aria2"];

/// Input-integrity faults that abort the resolution of one identifier.
#[derive(Debug, Error)]
pub enum ResolveError {
    /// A parent directory name is not a `YYYY-MM-DD` date.
    #[error("invalid date bucket '{bucket}' for {path}: {source}")]
    InvalidDateBucket {
        /// Offending directory name
        bucket: String,
        /// Path whose parent it is
        path: PathBuf,
        /// Parse failure
        #[source]
        source: chrono::ParseError,
    },

    /// A path has no parent directory to derive a bucket from.
    #[error("no date bucket for {0}")]
    MissingDateBucket(PathBuf),

    /// The size comparator rejected its input.
    #[error(transparent)]
    Compare(#[from] CompareError),
}

/// Date bucket of a path: its parent directory name parsed as a date.
///
/// # Errors
///
/// Returns an error if the path has no parent or the name is not a date.
pub fn date_bucket(path: &Path) -> Result<NaiveDate, ResolveError> {
    let bucket = path
        .parent()
        .and_then(Path::file_name)
        .ok_or_else(|| ResolveError::MissingDateBucket(path.to_path_buf()))?
        .to_string_lossy();

    NaiveDate::parse_from_str(&bucket, DATE_BUCKET_FORMAT).map_err(|source| {
        ResolveError::InvalidDateBucket {
            bucket: bucket.to_string(),
            path: path.to_path_buf(),
            source,
        }
    })
}

/// Split of one group's dated paths around the latest date bucket.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DatePartition {
    /// The newest bucket
    pub latest: NaiveDate,
    /// Paths in the newest bucket, in input order
    pub survivors: Vec<PathBuf>,
    /// Paths in older buckets, in input order
    pub stale: Vec<PathBuf>,
}

/// Partition `paths` by date bucket, newest bucket first.
///
/// Every bucket is validated before anything is returned. `None` means there
/// was nothing to partition.
///
/// # Errors
///
/// Returns the first invalid or missing date bucket.
pub fn partition_by_date(paths: &[PathBuf]) -> Result<Option<DatePartition>, ResolveError> {
    let mut buckets: BTreeMap<NaiveDate, Vec<PathBuf>> = BTreeMap::new();
    for path in paths {
        buckets
            .entry(date_bucket(path)?)
            .or_default()
            .push(path.clone());
    }

    let Some((latest, survivors)) = buckets.pop_last() else {
        return Ok(None);
    };
    Ok(Some(DatePartition {
        latest,
        survivors,
        stale: buckets.into_values().flatten().collect(),
    }))
}

/// `paths` with repeats removed, first occurrence kept.
fn distinct_paths(paths: &[PathBuf]) -> Vec<PathBuf> {
    let mut seen = BTreeSet::new();
    paths
        .iter()
        .filter(|p| seen.insert(p.as_path()))
        .cloned()
        .collect()
}

/// Counters and details of one resolution pass.
#[derive(Debug, Clone, Default)]
pub struct ResolutionReport {
    /// Whether the pass ran in dry-run mode
    pub dry_run: bool,
    /// Identifiers with more than one path
    pub groups_examined: usize,
    /// Identifiers whose resolution was aborted by an integrity fault
    pub integrity_errors: usize,
    /// Paths left in place
    pub kept: usize,
    /// Paths deleted (or that would be, in a dry run)
    pub deleted: usize,
    /// Paths that were already gone when deletion was attempted
    pub already_missing: usize,
    /// Paths scheduled for deletion, in order
    pub scheduled: Vec<PathBuf>,
    /// Paths that could not be deleted, with the reason
    pub failures: Vec<(PathBuf, String)>,
}

impl ResolutionReport {
    /// Number of failed deletions.
    #[must_use]
    pub fn failed(&self) -> usize {
        self.failures.len()
    }

    /// Whether every group resolved and every deletion succeeded.
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty() && self.integrity_errors == 0
    }

    /// Human-readable summary of the pass.
    #[must_use]
    pub fn summary(&self) -> String {
        let verb = if self.dry_run { "would delete" } else { "deleted" };
        format!(
            "{} group(s): kept {}, {} {}, {} already missing, {} failed, {} integrity error(s)",
            self.groups_examined,
            self.kept,
            verb,
            self.deleted,
            self.already_missing,
            self.failed(),
            self.integrity_errors
        )
    }
}

/// The resolution engine.
#[derive(Debug)]
pub struct Deleter<R: Remover = FsRemover> {
    comparator: SizeComparator,
    remover: R,
    retry: RetryPolicy,
    discard_extensions: Vec<String>,
    mode: DeleteMode,
}

impl Deleter<FsRemover> {
    /// Create a dry-run engine that deletes through the real filesystem.
    #[must_use]
    pub fn new(comparator: SizeComparator) -> Self {
        Self {
            comparator,
            remover: FsRemover,
            retry: RetryPolicy::default(),
            discard_extensions: DEFAULT_DISCARD_EXTENSIONS
                .iter()
                .map(|e| (*e).to_string())
                .collect(),
            mode: DeleteMode::DryRun,
        }
    }
}

impl<R: Remover> Deleter<R> {
    /// Swap the unlink primitive.
    #[must_use]
    pub fn with_remover<R2: Remover>(self, remover: R2) -> Deleter<R2> {
        Deleter {
            comparator: self.comparator,
            remover,
            retry: self.retry,
            discard_extensions: self.discard_extensions,
            mode: self.mode,
        }
    }

    /// Set the retry policy for permission faults.
    #[must_use]
    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Set the extensions deleted outright during date resolution.
    #[must_use]
    pub fn with_discard_extensions(mut self, extensions: Vec<String>) -> Self {
        self.discard_extensions = extensions
            .into_iter()
            .map(|e| e.trim_start_matches('.').to_lowercase())
            .collect();
        self
    }

    /// The mode the next pass will run in.
    #[must_use]
    pub fn mode(&self) -> DeleteMode {
        self.mode
    }

    /// Arm commit mode for the next [`delete_by_identifier`](Self::delete_by_identifier) pass only.
    pub fn commit(&mut self) -> &mut Self {
        self.mode = DeleteMode::Commit;
        self
    }

    /// Resolve every identifier shared by more than one path.
    ///
    /// Always returns to dry-run mode afterwards.
    pub fn delete_by_identifier(&mut self, groups: &PathGroups) -> ResolutionReport {
        let mode = std::mem::take(&mut self.mode);
        let mut report = ResolutionReport {
            dry_run: mode.is_dry_run(),
            ..Default::default()
        };

        if mode.is_dry_run() {
            log::info!("Resolving duplicates (dry run, nothing will be deleted)");
        } else {
            log::warn!("Resolving duplicates (commit mode, files will be deleted)");
        }

        for (identifier, listed) in groups.duplicated() {
            report.groups_examined += 1;
            let paths = distinct_paths(listed);
            if paths.len() < listed.len() {
                log::warn!(
                    "Identifier {} lists {} repeated path(s), ignoring the repeats",
                    identifier,
                    listed.len() - paths.len()
                );
            }
            log::info!(
                "Identifier {} has {} paths, resolving by date",
                identifier,
                paths.len()
            );

            let scheduled_before = report.scheduled.len();
            if let Err(e) = self.resolve_by_date(&paths, mode, &mut report) {
                log::error!("Aborted resolution of identifier {}: {}", identifier, e);
                report.integrity_errors += 1;
            }
            report.kept += paths.len() - (report.scheduled.len() - scheduled_before);
            log::info!("Identifier {} done", identifier);
        }

        log::info!("Resolution complete: {}", report.summary());
        report
    }

    fn is_discarded(&self, path: &Path) -> bool {
        path.extension()
            .map(|e| e.to_string_lossy().to_lowercase())
            .is_some_and(|e| self.discard_extensions.contains(&e))
    }

    fn resolve_by_date(
        &self,
        paths: &[PathBuf],
        mode: DeleteMode,
        report: &mut ResolutionReport,
    ) -> Result<(), ResolveError> {
        let (sidecars, dated): (Vec<PathBuf>, Vec<PathBuf>) =
            paths.iter().cloned().partition(|p| self.is_discarded(p));

        // Validate every bucket before the group's first deletion.
        let partition = partition_by_date(&dated)?;

        for path in &sidecars {
            log::info!("Deleting incomplete download sidecar: {}", path.display());
            self.schedule(path, mode, report);
        }

        let Some(partition) = partition else {
            return Ok(());
        };
        log::debug!(
            "Latest date is {}, containing {:?}",
            partition.latest,
            partition.survivors
        );

        for path in &partition.stale {
            log::info!("Deleting file from an older date: {}", path.display());
            self.schedule(path, mode, report);
        }

        if partition.survivors.len() > 1 {
            log::info!(
                "Latest date {} holds {} files, comparing sizes",
                partition.latest,
                partition.survivors.len()
            );
            self.resolve_by_size(&partition.survivors, mode, report)?;
        }
        Ok(())
    }

    fn resolve_by_size(
        &self,
        paths: &[PathBuf],
        mode: DeleteMode,
        report: &mut ResolutionReport,
    ) -> Result<(), ResolveError> {
        let size_groups = self.comparator.compare(paths)?;
        for (size, files) in &size_groups {
            let Some((newest, older)) = files.split_first() else {
                continue;
            };
            log::debug!("Keeping newest file of size {}: {}", size, newest.display());
            log::info!("Deleting same-size files: {:?}", older);
            for path in older {
                self.schedule(path, mode, report);
            }
        }
        Ok(())
    }

    fn schedule(&self, path: &Path, mode: DeleteMode, report: &mut ResolutionReport) {
        report.scheduled.push(path.to_path_buf());
        match try_delete(&self.remover, path, mode, &self.retry) {
            Ok(DeleteOutcome::Simulated | DeleteOutcome::Deleted) => report.deleted += 1,
            Ok(DeleteOutcome::AlreadyMissing) => report.already_missing += 1,
            Err(e) => report.failures.push((path.to_path_buf(), e.to_string())),
        }
    }
}
