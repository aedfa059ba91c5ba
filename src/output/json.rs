//! JSON snapshot of scan results.
//!
//! Provides a machine-readable dump of the identifier -> paths mapping so a
//! completed scan can be inspected offline or replayed into the resolution
//! engine without walking the tree again.
//!
//! # Output Schema
//!
//! ```json
//! {
//!   "20240101000000": [
//!     "/mnt/share/2024-01-01/show_20240101000000_ep01.mp4",
//!     "/mnt/share/2024-01-02/show_20240101000000_ep01.mp4"
//!   ],
//!   "20240202000000": ["/mnt/share/2024-02-02/show_20240202000000_ep02.mp4"]
//! }
//! ```
//!
//! # Example
//!
//! ```no_run
//! use iddedup::duplicates::PathGroups;
//! use iddedup::output::json::{load_snapshot, save_snapshot};
//! use std::path::Path;
//!
//! let groups = PathGroups::new();
//! save_snapshot(&groups, Path::new("scan_snapshot.json")).unwrap();
//! let replay = load_snapshot(Path::new("scan_snapshot.json")).unwrap();
//! assert_eq!(groups, replay);
//! ```

use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::duplicates::PathGroups;

/// Default snapshot file name.
pub const DEFAULT_SNAPSHOT_NAME: &str = "scan_snapshot.json";

/// Errors reading or writing a snapshot.
#[derive(Debug, Error)]
pub enum SnapshotError {
    /// The snapshot file could not be opened, created or written.
    #[error("I/O error for snapshot {path}: {source}")]
    Io {
        /// Snapshot path
        path: PathBuf,
        /// The underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// The snapshot is not an object of string keys to arrays of strings.
    #[error("malformed snapshot {path}: {source}")]
    Malformed {
        /// Snapshot path
        path: PathBuf,
        /// The underlying JSON error
        #[source]
        source: serde_json::Error,
    },
}

/// Write groups as pretty-printed JSON to a writer.
///
/// # Errors
///
/// Returns an error if serialization or the write fails.
pub fn write_snapshot<W: Write>(groups: &PathGroups, writer: W) -> Result<(), serde_json::Error> {
    let mut writer = BufWriter::new(writer);
    serde_json::to_writer_pretty(&mut writer, groups)?;
    writer.flush().map_err(serde_json::Error::io)
}

/// Read groups from a JSON reader.
///
/// # Errors
///
/// Returns an error if the input is not a valid snapshot.
pub fn read_snapshot<R: Read>(reader: R) -> Result<PathGroups, serde_json::Error> {
    serde_json::from_reader(BufReader::new(reader))
}

/// Save groups to a snapshot file, replacing any existing one.
///
/// # Errors
///
/// Returns an error if the file cannot be written or a path is not UTF-8.
pub fn save_snapshot(groups: &PathGroups, path: &Path) -> Result<(), SnapshotError> {
    let file = File::create(path).map_err(|source| SnapshotError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    write_snapshot(groups, file).map_err(|source| {
        if source.is_io() {
            SnapshotError::Io {
                path: path.to_path_buf(),
                source: source.into(),
            }
        } else {
            SnapshotError::Malformed {
                path: path.to_path_buf(),
                source,
            }
        }
    })?;
    log::info!(
        "Saved snapshot of {} identifiers to {}",
        groups.len(),
        path.display()
    );
    Ok(())
}

/// Load groups from a snapshot file.
///
/// # Errors
///
/// Returns an error if the file is missing, unreadable or malformed.
pub fn load_snapshot(path: &Path) -> Result<PathGroups, SnapshotError> {
    let file = File::open(path).map_err(|source| SnapshotError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let groups = read_snapshot(file).map_err(|source| SnapshotError::Malformed {
        path: path.to_path_buf(),
        source,
    })?;
    log::info!(
        "Loaded snapshot of {} identifiers ({} paths) from {}",
        groups.len(),
        groups.total_paths(),
        path.display()
    );
    Ok(groups)
}
