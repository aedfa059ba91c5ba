//! Identifier grouping and the mergeable scan result container.
//!
//! # Overview
//!
//! [`PathGroups`] maps an identifier to every path that produced it. Scan
//! workers each build a small partial container for one file and fold it into
//! a shared accumulator with [`PathGroups::merge_from`].
//!
//! ## Merge contract
//!
//! Merging never drops a path. With respect to path membership, merge is
//! associative and commutative: folding partial containers in any order or
//! grouping yields the same identifier -> path-set mapping. The order of paths
//! inside one identifier's list is only meaningful within a single container's
//! own accumulation.
//!
//! # Example
//!
//! ```
//! use iddedup::duplicates::PathGroups;
//! use std::path::PathBuf;
//!
//! let a = PathGroups::single("20240101000000", PathBuf::from("/a/show_20240101000000.mp4"));
//! let b = PathGroups::single("20240101000000", PathBuf::from("/b/show_20240101000000.mp4"));
//! let c = PathGroups::single("20240202000000", PathBuf::from("/c/show_20240202000000.mp4"));
//!
//! let merged = a.merge(b).merge(c);
//!
//! assert_eq!(merged.len(), 2);
//! assert_eq!(merged.total_paths(), 3);
//! assert_eq!(merged.duplicated().count(), 1);
//! ```

use serde::{Deserialize, Serialize};
use std::collections::btree_map::{self, BTreeMap};
use std::path::{Path, PathBuf};

/// Identifier -> paths mapping produced by a scan.
///
/// Keys iterate in sorted order so snapshots and reports are deterministic.
/// Serializes as a plain JSON object of string keys to arrays of strings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PathGroups {
    groups: BTreeMap<String, Vec<PathBuf>>,
}

impl PathGroups {
    /// Create an empty container.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a container holding one path under one identifier.
    #[must_use]
    pub fn single(identifier: impl Into<String>, path: PathBuf) -> Self {
        let mut groups = BTreeMap::new();
        groups.insert(identifier.into(), vec![path]);
        Self { groups }
    }

    /// Append a path to an identifier's list.
    pub fn insert(&mut self, identifier: impl Into<String>, path: PathBuf) {
        self.groups.entry(identifier.into()).or_default().push(path);
    }

    /// Fold `other` into `self`, keeping every path of both.
    pub fn merge_from(&mut self, other: PathGroups) {
        for (identifier, paths) in other.groups {
            match self.groups.entry(identifier) {
                btree_map::Entry::Vacant(slot) => {
                    slot.insert(paths);
                }
                btree_map::Entry::Occupied(mut slot) => slot.get_mut().extend(paths),
            }
        }
    }

    /// Combine two containers into a new one.
    ///
    /// See the module docs for the associativity/commutativity contract.
    #[must_use]
    pub fn merge(mut self, other: PathGroups) -> Self {
        self.merge_from(other);
        self
    }

    /// Paths recorded for an identifier.
    #[must_use]
    pub fn get(&self, identifier: &str) -> Option<&[PathBuf]> {
        self.groups.get(identifier).map(Vec::as_slice)
    }

    /// Check whether a path is recorded under an identifier.
    #[must_use]
    pub fn contains(&self, identifier: &str, path: &Path) -> bool {
        self.get(identifier)
            .is_some_and(|paths| paths.iter().any(|p| p == path))
    }

    /// Number of distinct identifiers.
    #[must_use]
    pub fn len(&self) -> usize {
        self.groups.len()
    }

    /// Check if no identifier has been recorded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    /// Total number of paths across all identifiers.
    #[must_use]
    pub fn total_paths(&self) -> usize {
        self.groups.values().map(Vec::len).sum()
    }

    /// Iterate over all `(identifier, paths)` pairs in key order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &[PathBuf])> {
        self.groups.iter().map(|(k, v)| (k.as_str(), v.as_slice()))
    }

    /// Iterate over identifiers shared by more than one path.
    ///
    /// Singletons need no resolution and are never yielded.
    pub fn duplicated(&self) -> impl Iterator<Item = (&str, &[PathBuf])> {
        self.iter().filter(|(_, paths)| paths.len() > 1)
    }
}

impl FromIterator<(String, PathBuf)> for PathGroups {
    fn from_iter<I: IntoIterator<Item = (String, PathBuf)>>(iter: I) -> Self {
        let mut groups = PathGroups::new();
        for (identifier, path) in iter {
            groups.insert(identifier, path);
        }
        groups
    }
}

impl IntoIterator for PathGroups {
    type Item = (String, Vec<PathBuf>);
    type IntoIter = btree_map::IntoIter<String, Vec<PathBuf>>;

    fn into_iter(self) -> Self::IntoIter {
        self.groups.into_iter()
    }
}
