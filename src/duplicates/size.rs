//! Size-based tie breaking among candidates that share an identifier.
//!
//! # Overview
//!
//! [`SizeComparator::compare`] reads every candidate's size and modification
//! time on the worker pool, buckets the survivors by exact byte size, and
//! orders each bucket newest first. Only buckets with two or more members are
//! returned since a singleton is never a deletion candidate.
//!
//! Metadata is always read fresh: files may have changed or vanished since
//! the scan. Vanished files are dropped silently.
//!
//! # Example
//!
//! ```no_run
//! use iddedup::duplicates::SizeComparator;
//! use iddedup::pool::WorkerPool;
//! use std::path::PathBuf;
//!
//! let comparator = SizeComparator::new(WorkerPool::new(4).unwrap());
//! let groups = comparator
//!     .compare(&[PathBuf::from("/a/x.mp4"), PathBuf::from("/b/x.mp4")])
//!     .unwrap();
//! for (size, paths) in &groups {
//!     println!("{size} bytes: keeping {}", paths[0].display());
//! }
//! ```

use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use rayon::prelude::*;
use thiserror::Error;

use crate::pool::WorkerPool;

/// Size -> paths ordered by modification time, newest first.
pub type SizeGroups = BTreeMap<u64, Vec<PathBuf>>;

/// Errors raised by the size comparator.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CompareError {
    /// No candidates were supplied; upstream grouping produced nothing to compare.
    #[error("no candidate paths to compare by size")]
    EmptyCandidates,
}

/// Fresh size/mtime reading for one candidate.
#[derive(Debug, Clone)]
struct Reading {
    path: PathBuf,
    size: u64,
    modified: SystemTime,
}

/// Buckets candidate paths by exact size using the shared worker pool.
#[derive(Debug, Clone)]
pub struct SizeComparator {
    pool: WorkerPool,
}

impl SizeComparator {
    /// Create a comparator that reads metadata on `pool`.
    #[must_use]
    pub fn new(pool: WorkerPool) -> Self {
        Self { pool }
    }

    /// Group `paths` by size, newest first, keeping only groups of two or more.
    ///
    /// Ties in modification time keep the order of `paths`.
    ///
    /// # Errors
    ///
    /// Returns [`CompareError::EmptyCandidates`] if `paths` is empty.
    pub fn compare(&self, paths: &[PathBuf]) -> Result<SizeGroups, CompareError> {
        if paths.is_empty() {
            return Err(CompareError::EmptyCandidates);
        }

        log::info!("Comparing sizes of {} files", paths.len());

        let readings: Vec<Option<Reading>> =
            self.pool.install(|| paths.par_iter().map(|p| read_size(p)).collect());

        let mut buckets: BTreeMap<u64, Vec<Reading>> = BTreeMap::new();
        for reading in readings.into_iter().flatten() {
            buckets.entry(reading.size).or_default().push(reading);
        }

        Ok(buckets
            .into_iter()
            .filter(|(_, readings)| readings.len() > 1)
            .map(|(size, mut readings)| {
                // stable sort: equal mtimes keep input order
                readings.sort_by(|a, b| b.modified.cmp(&a.modified));
                (size, readings.into_iter().map(|r| r.path).collect())
            })
            .collect())
    }
}

fn read_size(path: &Path) -> Option<Reading> {
    log::debug!("Reading file size: {}", path.display());
    let metadata = match fs::metadata(path) {
        Ok(m) => m,
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            log::debug!("File vanished before size comparison: {}", path.display());
            return None;
        }
        Err(e) => {
            log::warn!("Failed to stat {}: {}", path.display(), e);
            return None;
        }
    };

    if !metadata.is_file() {
        log::debug!("No longer a regular file: {}", path.display());
        return None;
    }

    let modified = match metadata.modified() {
        Ok(t) => t,
        Err(e) => {
            log::warn!("No modification time for {}: {}", path.display(), e);
            return None;
        }
    };

    Some(Reading {
        path: path.to_path_buf(),
        size: metadata.len(),
        modified,
    })
}
