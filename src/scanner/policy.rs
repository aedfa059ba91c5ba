//! Extraction policies: how a discovered file is grouped.
//!
//! The scanner hands every regular file to an [`ExtractionPolicy`], which
//! returns a one-path [`PathGroups`] keyed by whatever the policy considers
//! the file's identity. The scanner never looks at the key itself, so
//! grouping strategies can be swapped without touching the walk.
//!
//! # Example
//!
//! ```
//! use iddedup::scanner::{ExtractionPolicy, IdentifierPolicy};
//! use std::path::Path;
//!
//! let policy = IdentifierPolicy::default();
//! let key = policy.key(Path::new("/downloads/show_20240101000000_ep01.mp4"));
//! assert_eq!(key, "20240101000000");
//! ```

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use clap::ValueEnum;
use serde::{Deserialize, Serialize};

use super::ScanError;
use crate::duplicates::PathGroups;

/// Default token delimiter for [`IdentifierPolicy`].
pub const DEFAULT_DELIMITER: &str = "_";

/// Default minimum identifier token length for [`IdentifierPolicy`].
pub const DEFAULT_MIN_TOKEN_LEN: usize = 14;

/// Grouping strategy applied to each discovered file.
pub trait ExtractionPolicy: Send + Sync + fmt::Debug {
    /// Short name used in logs.
    fn name(&self) -> &'static str;

    /// Grouping key for a path. Reads only the path itself.
    fn key(&self, path: &Path) -> String;

    /// Empty accumulator for this policy's results.
    fn empty(&self) -> PathGroups {
        PathGroups::new()
    }

    /// Partial result holding the canonical form of `path` under its key.
    ///
    /// # Errors
    ///
    /// Returns an error if the path cannot be canonicalized (e.g. it vanished).
    fn extract(&self, path: &Path) -> Result<PathGroups, ScanError> {
        let key = self.key(path);
        let resolved = canonicalize(path)?;
        Ok(PathGroups::single(key, resolved))
    }
}

fn canonicalize(path: &Path) -> Result<PathBuf, ScanError> {
    std::fs::canonicalize(path).map_err(|e| ScanError::from_io(path.to_path_buf(), e))
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default()
}

/// Groups files by an identifier token embedded in their names.
///
/// The file name is split on `delimiter`; tokens are scanned from index 1 and
/// the first one at least `min_token_len` characters long is the identifier.
/// If none qualifies, the index the scan stopped at is clamped to the last
/// token, which may be short. Existing data sets depend on that fallback.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IdentifierPolicy {
    delimiter: String,
    min_token_len: usize,
}

impl Default for IdentifierPolicy {
    fn default() -> Self {
        Self::new(DEFAULT_DELIMITER, DEFAULT_MIN_TOKEN_LEN)
    }
}

impl IdentifierPolicy {
    /// Create a policy with a custom delimiter and minimum token length.
    #[must_use]
    pub fn new(delimiter: impl Into<String>, min_token_len: usize) -> Self {
        Self {
            delimiter: delimiter.into(),
            min_token_len,
        }
    }

    /// Select the identifier token from a bare file name.
    #[must_use]
    pub fn identifier<'a>(&self, name: &'a str) -> &'a str {
        let tokens: Vec<&str> = if self.delimiter.is_empty() {
            vec![name]
        } else {
            name.split(self.delimiter.as_str()).collect()
        };

        let mut index = 1;
        while index < tokens.len() && tokens[index].chars().count() < self.min_token_len {
            index += 1;
        }
        // split always yields at least one token
        tokens[index.min(tokens.len() - 1)]
    }
}

impl ExtractionPolicy for IdentifierPolicy {
    fn name(&self) -> &'static str {
        "identifier"
    }

    fn key(&self, path: &Path) -> String {
        self.identifier(&file_name(path)).to_string()
    }
}

/// Groups files by lowercase extension; files without one share the empty key.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ExtensionPolicy;

impl ExtractionPolicy for ExtensionPolicy {
    fn name(&self) -> &'static str {
        "extension"
    }

    fn key(&self, path: &Path) -> String {
        path.extension()
            .map(|e| e.to_string_lossy().to_lowercase())
            .unwrap_or_default()
    }
}

/// One group per file, keyed by the canonical path itself.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PathPolicy;

impl ExtractionPolicy for PathPolicy {
    fn name(&self) -> &'static str {
        "path"
    }

    fn key(&self, path: &Path) -> String {
        path.to_string_lossy().into_owned()
    }

    fn extract(&self, path: &Path) -> Result<PathGroups, ScanError> {
        let resolved = canonicalize(path)?;
        Ok(PathGroups::single(self.key(&resolved), resolved))
    }
}

/// Policy selector used by configuration and the command line.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum PolicyKind {
    /// Identifier token embedded in the file name
    #[default]
    Identifier,
    /// Lowercase file extension
    Extension,
    /// Canonical path (no grouping)
    Path,
}

impl PolicyKind {
    /// Construct the selected policy.
    ///
    /// `delimiter` and `min_token_len` only affect [`PolicyKind::Identifier`].
    #[must_use]
    pub fn build(self, delimiter: &str, min_token_len: usize) -> Arc<dyn ExtractionPolicy> {
        match self {
            Self::Identifier => Arc::new(IdentifierPolicy::new(delimiter, min_token_len)),
            Self::Extension => Arc::new(ExtensionPolicy),
            Self::Path => Arc::new(PathPolicy),
        }
    }
}
