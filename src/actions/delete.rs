//! Retrying, failure-tolerant file deletion.
//!
//! # Overview
//!
//! [`try_delete`] removes one path according to a [`DeleteMode`]:
//! - **Dry run**: the intended deletion is logged and nothing is touched.
//! - **Commit**: the path is unlinked through a [`Remover`].
//!
//! Faults are classified rather than propagated blindly:
//! - A missing file means there is nothing left to delete and counts as success.
//! - Permission denied is treated as transient (network shares hold locks
//!   briefly): sleep for the backoff and try again, up to
//!   [`RetryPolicy::max_attempts`] attempts in total.
//! - Anything else fails that one path.
//!
//! # Example
//!
//! ```no_run
//! use iddedup::actions::delete::{try_delete, DeleteMode, FsRemover, RetryPolicy};
//! use std::path::Path;
//!
//! let outcome = try_delete(
//!     &FsRemover,
//!     Path::new("/mnt/share/2024-01-01/show_20240101000000.mp4"),
//!     DeleteMode::Commit,
//!     &RetryPolicy::default(),
//! );
//! println!("{:?}", outcome);
//! ```

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::thread;
use std::time::Duration;

use thiserror::Error;

/// Default number of deletion attempts per path.
pub const DEFAULT_MAX_ATTEMPTS: u32 = 5;

/// Default pause between attempts after a permission fault.
pub const DEFAULT_RETRY_BACKOFF: Duration = Duration::from_secs(3);

/// Error type for deletion operations.
#[derive(Debug, Error)]
pub enum DeleteError {
    /// Permission was still denied after the last allowed attempt.
    #[error("permission denied: {path} (gave up after {attempts} attempts)")]
    PermissionDenied {
        /// Path that could not be removed
        path: PathBuf,
        /// Attempts made, including the first
        attempts: u32,
    },

    /// Any fault other than absence or permission.
    #[error("I/O error for {path}: {source}")]
    Io {
        /// Path that could not be removed
        path: PathBuf,
        /// The underlying I/O error
        #[source]
        source: io::Error,
    },
}

impl DeleteError {
    /// Get the path associated with this error.
    #[must_use]
    pub fn path(&self) -> &Path {
        match self {
            Self::PermissionDenied { path, .. } | Self::Io { path, .. } => path,
        }
    }
}

/// What a successful [`try_delete`] call did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeleteOutcome {
    /// Dry run: the deletion was only logged.
    Simulated,
    /// The file was removed.
    Deleted,
    /// The file was already gone.
    AlreadyMissing,
}

/// Whether deletions are simulated or performed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum DeleteMode {
    /// Log intended deletions only.
    #[default]
    DryRun,
    /// Unlink files.
    Commit,
}

impl DeleteMode {
    /// Whether this mode leaves the filesystem untouched.
    #[must_use]
    pub fn is_dry_run(self) -> bool {
        self == Self::DryRun
    }
}

/// Bounded retry settings for permission faults.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts per path, including the first (at least 1).
    pub max_attempts: u32,
    /// Pause before each retry.
    pub backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            backoff: DEFAULT_RETRY_BACKOFF,
        }
    }
}

impl RetryPolicy {
    /// Create a retry policy; `max_attempts` is raised to at least 1.
    #[must_use]
    pub fn new(max_attempts: u32, backoff: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            backoff,
        }
    }
}

/// Filesystem unlink primitive.
///
/// Production code uses [`FsRemover`]; tests inject faults.
pub trait Remover: Send + Sync {
    /// Remove the file at `path`.
    ///
    /// # Errors
    ///
    /// Returns the raw I/O error; classification happens in [`try_delete`].
    fn remove(&self, path: &Path) -> io::Result<()>;
}

/// Removes files with [`std::fs::remove_file`].
#[derive(Debug, Clone, Copy, Default)]
pub struct FsRemover;

impl Remover for FsRemover {
    fn remove(&self, path: &Path) -> io::Result<()> {
        fs::remove_file(path)
    }
}

/// Delete one path, retrying permission faults per `retry`.
///
/// # Errors
///
/// - `PermissionDenied` once every attempt was refused
/// - `Io` for any other fault (not retried)
pub fn try_delete<R: Remover + ?Sized>(
    remover: &R,
    path: &Path,
    mode: DeleteMode,
    retry: &RetryPolicy,
) -> Result<DeleteOutcome, DeleteError> {
    if mode.is_dry_run() {
        log::info!("Dry run, would delete: {}", path.display());
        return Ok(DeleteOutcome::Simulated);
    }

    let max_attempts = retry.max_attempts.max(1);
    let mut attempt = 1;
    loop {
        log::info!("Deleting file: {}", path.display());
        match remover.remove(path) {
            Ok(()) => return Ok(DeleteOutcome::Deleted),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                log::error!("File {} not found, skipping deletion", path.display());
                return Ok(DeleteOutcome::AlreadyMissing);
            }
            Err(e) if e.kind() == io::ErrorKind::PermissionDenied => {
                if attempt >= max_attempts {
                    log::error!(
                        "Failed to delete {} after {} attempts",
                        path.display(),
                        max_attempts
                    );
                    return Err(DeleteError::PermissionDenied {
                        path: path.to_path_buf(),
                        attempts: attempt,
                    });
                }
                log::warn!(
                    "Permission denied for {}, retrying ({}/{})",
                    path.display(),
                    attempt,
                    max_attempts
                );
                thread::sleep(retry.backoff);
                attempt += 1;
            }
            Err(e) => {
                log::error!("Failed to delete {}: {}", path.display(), e);
                return Err(DeleteError::Io {
                    path: path.to_path_buf(),
                    source: e,
                });
            }
        }
    }
}
