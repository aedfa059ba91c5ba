//! Output formatters for scan results.
//!
//! This module provides the JSON snapshot of the identifier -> paths mapping,
//! used both for offline inspection and for replaying a scan into the
//! resolution engine.
//!
//! # Example
//!
//! ```no_run
//! use iddedup::duplicates::PathGroups;
//! use iddedup::output::json::write_snapshot;
//!
//! let groups = PathGroups::new();
//! write_snapshot(&groups, std::io::stdout()).unwrap();
//! ```

pub mod json;

// Re-export main types
pub use json::{load_snapshot, save_snapshot, SnapshotError, DEFAULT_SNAPSHOT_NAME};
