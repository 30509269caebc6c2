//! Error types and error code constants for steptool.
//!
//! This module provides a unified error type (`StepToolError`) that bridges
//! domain-specific errors from different subsystems (patching, configuration,
//! file access) into a common format suitable for JSON output.
//!
//! ## Error Code Mapping
//!
//! - `2`: Invalid arguments (bad input from caller)
//! - `3`: Resolution errors (file not found, unparseable file, step not found)
//! - `4`: Apply errors (failed to apply or save changes)
//! - `10`: Internal errors (bugs, unexpected state)
//!
//! Recoverable per-item failures inside the engine (one bad decorator, one
//! unparseable file during a directory walk) never become a `StepToolError`;
//! they go to a [`Reporter`](crate::report::Reporter) instead.

use std::fmt;
use std::io;

use thiserror::Error;

use crate::patch::PatchError;

// ============================================================================
// Output Error Codes
// ============================================================================

/// Error codes for JSON output.
///
/// These codes map to CLI exit codes and appear in JSON error responses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum OutputErrorCode {
    /// Invalid arguments from caller (bad input, malformed request).
    InvalidArguments = 2,
    /// Resolution errors (file not found, file does not parse, step not found).
    ResolutionError = 3,
    /// Apply errors (failed to write changes).
    ApplyError = 4,
    /// Internal errors (bugs, unexpected state).
    InternalError = 10,
}

impl OutputErrorCode {
    /// Get the numeric code value.
    pub fn code(&self) -> u8 {
        *self as u8
    }
}

impl fmt::Display for OutputErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

// ============================================================================
// Unified Error Type
// ============================================================================

/// Unified error type for CLI output.
#[derive(Debug, Error)]
pub enum StepToolError {
    /// Invalid arguments from caller.
    #[error("invalid arguments: {message}")]
    InvalidArguments { message: String },

    /// File not found.
    #[error("file not found: {path}")]
    FileNotFound { path: String },

    /// File exists but is not valid source.
    #[error("failed to parse {path}")]
    ParseFailed { path: String },

    /// No step with the given text in the file.
    #[error("no step '{step}' found in {path}")]
    StepNotFound { step: String, path: String },

    /// Failed to apply changes.
    #[error("apply error: {message}")]
    ApplyError {
        message: String,
        file: Option<String>,
    },

    /// Configuration could not be loaded.
    #[error("config error: {0}")]
    Config(String),

    /// Internal error (bug or unexpected state).
    #[error("internal error: {message}")]
    InternalError { message: String },
}

// ============================================================================
// Error Code Mapping
// ============================================================================

impl From<&StepToolError> for OutputErrorCode {
    fn from(err: &StepToolError) -> Self {
        match err {
            StepToolError::InvalidArguments { .. } => OutputErrorCode::InvalidArguments,
            StepToolError::FileNotFound { .. } => OutputErrorCode::ResolutionError,
            StepToolError::ParseFailed { .. } => OutputErrorCode::ResolutionError,
            StepToolError::StepNotFound { .. } => OutputErrorCode::ResolutionError,
            StepToolError::ApplyError { .. } => OutputErrorCode::ApplyError,
            StepToolError::Config(_) => OutputErrorCode::InvalidArguments,
            StepToolError::InternalError { .. } => OutputErrorCode::InternalError,
        }
    }
}

impl From<StepToolError> for OutputErrorCode {
    fn from(err: StepToolError) -> Self {
        OutputErrorCode::from(&err)
    }
}

// ============================================================================
// Bridges
// ============================================================================

impl From<PatchError> for StepToolError {
    fn from(err: PatchError) -> Self {
        StepToolError::ApplyError {
            message: err.to_string(),
            file: None,
        }
    }
}

impl From<io::Error> for StepToolError {
    fn from(err: io::Error) -> Self {
        StepToolError::InternalError {
            message: format!("IO error: {}", err),
        }
    }
}

impl From<serde_json::Error> for StepToolError {
    fn from(err: serde_json::Error) -> Self {
        StepToolError::InternalError {
            message: format!("JSON error: {}", err),
        }
    }
}

// ============================================================================
// Convenience Constructors
// ============================================================================

impl StepToolError {
    /// Create an invalid arguments error.
    pub fn invalid_args(message: impl Into<String>) -> Self {
        StepToolError::InvalidArguments {
            message: message.into(),
        }
    }

    /// Create a file not found error.
    pub fn file_not_found(path: impl Into<String>) -> Self {
        StepToolError::FileNotFound { path: path.into() }
    }

    /// Create a parse failure error.
    pub fn parse_failed(path: impl Into<String>) -> Self {
        StepToolError::ParseFailed { path: path.into() }
    }

    /// Create an apply error for a specific file.
    pub fn apply(message: impl Into<String>, file: impl Into<String>) -> Self {
        StepToolError::ApplyError {
            message: message.into(),
            file: Some(file.into()),
        }
    }

    /// Create an internal error.
    pub fn internal(message: impl Into<String>) -> Self {
        StepToolError::InternalError {
            message: message.into(),
        }
    }

    /// Get the error code for this error.
    pub fn error_code(&self) -> OutputErrorCode {
        OutputErrorCode::from(self)
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    mod error_code_mapping {
        use super::*;

        #[test]
        fn invalid_arguments_maps_to_invalid_arguments() {
            let err = StepToolError::invalid_args("bad --params");
            assert_eq!(err.error_code(), OutputErrorCode::InvalidArguments);
            assert_eq!(err.error_code().code(), 2);
        }

        #[test]
        fn file_not_found_maps_to_resolution_error() {
            let err = StepToolError::file_not_found("missing.py");
            assert_eq!(err.error_code(), OutputErrorCode::ResolutionError);
        }

        #[test]
        fn parse_failed_maps_to_resolution_error() {
            let err = StepToolError::parse_failed("broken.py");
            assert_eq!(err.error_code().code(), 3);
        }

        #[test]
        fn step_not_found_maps_to_resolution_error() {
            let err = StepToolError::StepNotFound {
                step: "a step".to_string(),
                path: "steps.py".to_string(),
            };
            assert_eq!(err.error_code(), OutputErrorCode::ResolutionError);
        }

        #[test]
        fn patch_error_bridges_to_apply_error() {
            let err = StepToolError::from(PatchError::UnknownPosition);
            assert_eq!(err.error_code(), OutputErrorCode::ApplyError);
            assert_eq!(err.error_code().code(), 4);
        }

        #[test]
        fn io_error_bridges_to_internal() {
            let err = StepToolError::from(io::Error::other("disk on fire"));
            assert_eq!(err.error_code(), OutputErrorCode::InternalError);
            assert_eq!(err.error_code().code(), 10);
        }
    }

    mod error_display {
        use super::*;

        #[test]
        fn file_not_found_display() {
            let err = StepToolError::file_not_found("steps.py");
            assert_eq!(err.to_string(), "file not found: steps.py");
        }

        #[test]
        fn step_not_found_display() {
            let err = StepToolError::StepNotFound {
                step: "say hello".to_string(),
                path: "steps.py".to_string(),
            };
            assert_eq!(err.to_string(), "no step 'say hello' found in steps.py");
        }

        #[test]
        fn display_shows_code() {
            assert_eq!(format!("{}", OutputErrorCode::InvalidArguments), "2");
            assert_eq!(format!("{}", OutputErrorCode::InternalError), "10");
        }
    }
}
