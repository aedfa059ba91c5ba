//! Structured error handling and exit codes.

use serde::Serialize;

/// Exit codes for the iddedup application.
///
/// - 0: Success (resolution ran over at least one duplicated identifier)
/// - 1: General error (unexpected failure)
/// - 2: Nothing to resolve (no identifier had more than one path)
/// - 3: Partial success (scan errors, integrity errors or failed deletions)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ExitCode {
    /// Success: resolution completed cleanly.
    Success = 0,
    /// General error: An unexpected error occurred.
    GeneralError = 1,
    /// Nothing to resolve: no duplicated identifiers were found.
    NothingToResolve = 2,
    /// Partial success: completed but some paths or groups were skipped.
    PartialSuccess = 3,
}

impl ExitCode {
    /// Get the numeric exit code.
    #[must_use]
    pub fn as_i32(self) -> i32 {
        self as i32
    }

    /// Get the machine-readable code prefix.
    #[must_use]
    pub fn code_prefix(self) -> &'static str {
        match self {
            Self::Success => "ID000",
            Self::GeneralError => "ID001",
            Self::NothingToResolve => "ID002",
            Self::PartialSuccess => "ID003",
        }
    }
}

/// Structured error information for JSON output.
#[derive(Debug, Serialize)]
pub struct StructuredError {
    /// The error code (e.g., "ID001")
    pub code: String,
    /// The exit code number
    pub exit_code: i32,
    /// Human-readable error message, including its causes
    pub message: String,
}

impl StructuredError {
    /// Create a new structured error from an anyhow error and an exit code.
    #[must_use]
    pub fn new(err: &anyhow::Error, exit_code: ExitCode) -> Self {
        Self {
            code: exit_code.code_prefix().to_string(),
            exit_code: exit_code.as_i32(),
            message: format!("{err:#}"),
        }
    }
}
