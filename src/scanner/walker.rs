//! Concurrent, self-expanding directory scanner.
//!
//! # Overview
//!
//! [`Scanner::scan`] opens a [`rayon::Scope`] on the worker pool and lists the
//! root inside it. Every subdirectory found is spawned into the same scope as
//! a new unit of work instead of being walked recursively, so neither depth
//! nor breadth serializes on one worker. Regular files are run through the
//! [`ExtractionPolicy`] inside the unit that found them and merged into one
//! shared [`PathGroups`].
//!
//! The scope returns only once the transitive closure of spawned units has
//! finished; a panicking unit is re-raised to the caller after the rest drain.
//!
//! # Failure policy
//!
//! Only a bad root fails the scan. An unreadable subdirectory, entry or file
//! is logged, counted in [`ScanStats::errors`] and abandoned on its own.
//! Symlinks, sockets and devices are skipped without being followed.
//!
//! # Example
//!
//! ```no_run
//! use iddedup::pool::WorkerPool;
//! use iddedup::scanner::{PolicyKind, Scanner};
//! use std::path::Path;
//!
//! let pool = WorkerPool::new(4).unwrap();
//! let scanner = Scanner::new(pool, PolicyKind::Identifier.build("_", 14));
//! let (groups, stats) = scanner.scan(Path::new(".")).unwrap();
//! println!("{} files in {} directories", stats.files, stats.directories);
//! ```

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::{Duration, Instant};

use rayon::Scope;

use super::{ExtractionPolicy, ScanError, ScanStats};
use crate::duplicates::PathGroups;
use crate::pool::WorkerPool;

/// Directory scanner producing an identifier -> paths mapping.
#[derive(Debug, Clone)]
pub struct Scanner {
    pool: WorkerPool,
    policy: Arc<dyn ExtractionPolicy>,
}

/// State shared by every unit of work of one scan.
#[derive(Debug)]
struct ScanContext<'a> {
    policy: &'a dyn ExtractionPolicy,
    results: Mutex<PathGroups>,
    directories: AtomicUsize,
    files: AtomicUsize,
    skipped: AtomicUsize,
    errors: AtomicUsize,
}

impl Scanner {
    /// Create a scanner running on `pool` and grouping with `policy`.
    #[must_use]
    pub fn new(pool: WorkerPool, policy: Arc<dyn ExtractionPolicy>) -> Self {
        Self { pool, policy }
    }

    /// Walk `root` and return the merged result with scan counters.
    ///
    /// Blocks until every directory reachable from `root` has been visited.
    ///
    /// # Errors
    ///
    /// Returns an error only if `root` is missing, is not a directory, or
    /// cannot be listed. Failures below the root are logged and counted.
    pub fn scan(&self, root: &Path) -> Result<(PathGroups, ScanStats), ScanError> {
        let start = Instant::now();

        let metadata =
            fs::metadata(root).map_err(|e| ScanError::from_io(root.to_path_buf(), e))?;
        if !metadata.is_dir() {
            return Err(ScanError::NotADirectory(root.to_path_buf()));
        }
        // an unlistable root fails the scan; faults below it are counted
        let root_entries =
            fs::read_dir(root).map_err(|e| ScanError::from_io(root.to_path_buf(), e))?;

        log::info!(
            "Scanning {} with {} policy on {} workers",
            root.display(),
            self.policy.name(),
            self.pool.workers()
        );

        let ctx = ScanContext::new(self.policy.as_ref());
        self.pool.scope(|s| ctx.visit_entries(s, root, root_entries));

        let (groups, stats) = ctx.finish(start.elapsed());
        log::info!(
            "Scan complete: {} files under {} identifiers in {} directories ({} skipped, {} errors) in {:.2?}",
            stats.files,
            groups.len(),
            stats.directories,
            stats.skipped,
            stats.errors,
            stats.duration
        );

        Ok((groups, stats))
    }
}

impl<'a> ScanContext<'a> {
    fn new(policy: &'a dyn ExtractionPolicy) -> Self {
        Self {
            policy,
            results: Mutex::new(policy.empty()),
            directories: AtomicUsize::new(0),
            files: AtomicUsize::new(0),
            skipped: AtomicUsize::new(0),
            errors: AtomicUsize::new(0),
        }
    }

    /// Visit one directory as a unit of work.
    fn visit<'s>(&'s self, s: &Scope<'s>, dir: &Path) {
        match fs::read_dir(dir) {
            Ok(entries) => self.visit_entries(s, dir, entries),
            Err(e) => self.record_error(&ScanError::from_io(dir.to_path_buf(), e)),
        }
    }

    fn visit_entries<'s>(&'s self, s: &Scope<'s>, dir: &Path, entries: fs::ReadDir) {
        self.directories.fetch_add(1, Ordering::Relaxed);
        log::debug!("Scanning: {}", dir.display());

        for entry in entries {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    self.record_error(&ScanError::from_io(dir.to_path_buf(), e));
                    continue;
                }
            };
            let path = entry.path();

            // DirEntry::file_type does not follow symlinks
            let file_type = match entry.file_type() {
                Ok(file_type) => file_type,
                Err(e) => {
                    self.record_error(&ScanError::from_io(path, e));
                    continue;
                }
            };

            if file_type.is_dir() {
                log::trace!("Submitting directory {}", path.display());
                s.spawn(move |s| self.visit(s, &path));
            } else if file_type.is_file() {
                self.deposit(&path);
            } else {
                log::trace!("Skipping non-regular entry: {}", path.display());
                self.skipped.fetch_add(1, Ordering::Relaxed);
            }
        }
    }

    fn deposit(&self, path: &Path) {
        match self.policy.extract(path) {
            Ok(partial) => {
                self.files.fetch_add(1, Ordering::Relaxed);
                log::trace!("Merging {}", path.display());
                self.results
                    .lock()
                    .unwrap_or_else(PoisonError::into_inner)
                    .merge_from(partial);
            }
            Err(e) => self.record_error(&e),
        }
    }

    fn record_error(&self, err: &ScanError) {
        log::warn!("Skipping after scan error: {}", err);
        self.errors.fetch_add(1, Ordering::Relaxed);
    }

    fn finish(self, duration: Duration) -> (PathGroups, ScanStats) {
        let stats = ScanStats {
            directories: self.directories.into_inner(),
            files: self.files.into_inner(),
            skipped: self.skipped.into_inner(),
            errors: self.errors.into_inner(),
            duration,
        };
        let groups = self
            .results
            .into_inner()
            .unwrap_or_else(PoisonError::into_inner);
        (groups, stats)
    }
}
