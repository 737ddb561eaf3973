//! Structured error handling and exit codes.

use serde::Serialize;

use crate::actions::{PruneAborted, PruneError};
use crate::duplicates::FinderError;

/// Exit codes for the DupeBridge application.
///
/// - 0: Success (scan and report written, or prune pass completed, even with nothing to do)
/// - 1: General error (any fatal, non-ignored failure)
/// - 130: Interrupted by user (Ctrl+C)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ExitCode {
    /// Success: the command completed.
    Success = 0,
    /// General error: the command stopped on a fatal error.
    GeneralError = 1,
    /// Interrupted: the command was interrupted by user (Ctrl+C).
    Interrupted = 130,
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
            Self::Success => "DB000",
            Self::GeneralError => "DB001",
            Self::Interrupted => "DB130",
        }
    }

    /// Choose the exit code for a failed run.
    #[must_use]
    pub fn for_error(err: &anyhow::Error) -> Self {
        let finder_interrupted = err
            .downcast_ref::<FinderError>()
            .is_some_and(|e| matches!(e, FinderError::Interrupted));
        let prune_interrupted = err
            .downcast_ref::<PruneAborted>()
            .is_some_and(|e| matches!(e.source, PruneError::Interrupted));

        if finder_interrupted || prune_interrupted {
            Self::Interrupted
        } else {
            Self::GeneralError
        }
    }
}

/// Structured error information for JSON output.
#[derive(Debug, Serialize)]
pub struct StructuredError {
    /// The error code (e.g., "DB001")
    pub code: String,
    /// The exit code number
    pub exit_code: i32,
    /// Human-readable error message
    pub message: String,
    /// Whether the operation was interrupted
    pub interrupted: bool,
}

impl StructuredError {
    /// Create a new structured error from an anyhow error and an exit code.
    #[must_use]
    pub fn new(err: &anyhow::Error, exit_code: ExitCode) -> Self {
        Self {
            code: exit_code.code_prefix().to_string(),
            exit_code: exit_code.as_i32(),
            message: format!("{:#}", err),
            interrupted: exit_code == ExitCode::Interrupted,
        }
    }
}
