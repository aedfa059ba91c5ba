//! File actions module.
//!
//! This module provides functionality for:
//! - Retrying, failure-tolerant deletion of a single path
//! - The resolution engine that decides which copy of each identifier survives
//!
//! # Deletion
//!
//! The delete module classifies faults per path:
//! - Dry run logs only (the default)
//! - Missing files count as success
//! - Permission faults are retried with a fixed backoff
//!
//! ```no_run
//! use iddedup::actions::delete::{try_delete, DeleteMode, FsRemover, RetryPolicy};
//! use std::path::Path;
//!
//! let result = try_delete(&FsRemover, Path::new("dup.mp4"), DeleteMode::DryRun, &RetryPolicy::default());
//! ```
//!
//! # Resolution
//!
//! The resolve module runs the date-then-size cascade over a scan result.

pub mod delete;
pub mod resolve;

// Re-export commonly used types
pub use delete::{
    try_delete, DeleteError, DeleteMode, DeleteOutcome, FsRemover, Remover, RetryPolicy,
};
pub use resolve::{
    date_bucket, partition_by_date, DatePartition, Deleter, ResolutionReport, ResolveError,
};
