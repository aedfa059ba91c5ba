//! Scanner module for concurrent directory traversal and grouping.
//!
//! This module provides functionality for:
//! - Walking a tree with one scoped pool task per directory
//! - Grouping discovered files through a pluggable [`ExtractionPolicy`]
//!
//! # Architecture
//!
//! The scanner is divided into submodules:
//! - [`walker`]: the [`Scanner`] and its per-directory units of work
//! - [`policy`]: extraction policies (identifier, extension, path)
//!
//! # Example
//!
//! ```no_run
//! use iddedup::pool::WorkerPool;
//! use iddedup::scanner::{IdentifierPolicy, Scanner};
//! use std::path::Path;
//! use std::sync::Arc;
//!
//! let pool = WorkerPool::new(10).unwrap();
//! let scanner = Scanner::new(pool, Arc::new(IdentifierPolicy::default()));
//! let (groups, stats) = scanner.scan(Path::new("/mnt/downloads")).unwrap();
//! println!("{} identifiers from {} files", groups.len(), stats.files);
//! ```

pub mod policy;
pub mod walker;

use std::path::PathBuf;
use std::time::Duration;

// Re-export main types
pub use policy::{ExtensionPolicy, ExtractionPolicy, IdentifierPolicy, PathPolicy, PolicyKind};
pub use walker::Scanner;

/// Counters collected during one scan.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScanStats {
    /// Directories whose entries were listed
    pub directories: usize,
    /// Regular files deposited into the result
    pub files: usize,
    /// Entries that were neither directories nor regular files
    pub skipped: usize,
    /// Directories or entries abandoned after an error
    pub errors: usize,
    /// Wall-clock duration of the scan
    pub duration: Duration,
}

impl ScanStats {
    /// Whether any work item was abandoned.
    #[must_use]
    pub fn has_errors(&self) -> bool {
        self.errors > 0
    }
}

/// Errors that can occur during directory scanning.
#[derive(thiserror::Error, Debug)]
pub enum ScanError {
    /// Permission was denied when accessing a file or directory.
    #[error("Permission denied: {0}")]
    PermissionDenied(PathBuf),

    /// The specified path was not found.
    #[error("Path not found: {0}")]
    NotFound(PathBuf),

    /// The specified path is not a directory.
    #[error("Not a directory: {0}")]
    NotADirectory(PathBuf),

    /// An I/O error occurred while accessing a file.
    #[error("I/O error for {path}: {source}")]
    Io {
        /// Path where the error occurred
        path: PathBuf,
        /// The underlying I/O error
        #[source]
        source: std::io::Error,
    },
}

impl ScanError {
    /// Classify an I/O error for `path`.
    #[must_use]
    pub fn from_io(path: PathBuf, source: std::io::Error) -> Self {
        match source.kind() {
            std::io::ErrorKind::NotFound => Self::NotFound(path),
            std::io::ErrorKind::PermissionDenied => Self::PermissionDenied(path),
            _ => Self::Io { path, source },
        }
    }
}
