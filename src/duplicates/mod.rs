//! Duplicate grouping module.
//!
//! This module provides functionality for:
//! - The mergeable identifier -> paths container built by the scanner
//! - Size-based bucketing of candidates that share an identifier

pub mod groups;
pub mod size;

pub use groups::PathGroups;
pub use size::{CompareError, SizeComparator, SizeGroups};
