//! JSON output types and serialization for CLI responses.
//!
//! ## Design Principles
//!
//! 1. **Status first:** Every response has `status` as first field
//! 2. **Deterministic:** Same input -> same output (field order, array ordering)
//! 3. **Nullable vs absent:** Explicit `null` for "no value"; absent field means "not applicable"
//! 4. **Versioned:** Schema version in response enables forward compatibility

use std::io::{self, Write};

use serde::{Deserialize, Serialize};

use crate::error::{OutputErrorCode, StepToolError};
use crate::patch::{ContentHash, Edit, Span};

/// Current schema version for all responses.
pub const SCHEMA_VERSION: &str = "1";

// ============================================================================
// Step Listing
// ============================================================================

/// One discovered step implementation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StepItem {
    /// Step text as written in the decorator.
    pub text: String,
    /// Name of the implementing function.
    pub function: String,
    /// File containing the implementation.
    pub file: String,
    /// Location of the function definition (decorators included).
    pub span: Span,
    /// True when the decorator lists several texts for the same function.
    pub has_alias: bool,
}

/// Response for `steptool steps`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StepsResponse {
    /// Always `"ok"`.
    pub status: String,
    /// Schema version.
    pub schema_version: String,
    /// Number of files that parsed and were scanned.
    pub files_loaded: usize,
    /// Discovered steps in file then source order.
    pub steps: Vec<StepItem>,
}

impl StepsResponse {
    /// Create a successful listing.
    pub fn new(files_loaded: usize, steps: Vec<StepItem>) -> Self {
        StepsResponse {
            status: "ok".to_string(),
            schema_version: SCHEMA_VERSION.to_string(),
            files_loaded,
            steps,
        }
    }
}

// ============================================================================
// Refactor
// ============================================================================

/// Response for `steptool refactor`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RefactorResponse {
    /// Always `"ok"`.
    pub status: String,
    /// Schema version.
    pub schema_version: String,
    /// File that was refactored.
    pub file: String,
    /// Hash of the content the edit spans address.
    pub before_hash: ContentHash,
    /// Edits in order: step text first, then the parameter list if it changed.
    pub edits: Vec<Edit>,
    /// True when the mutated file was written back.
    pub applied: bool,
}

impl RefactorResponse {
    /// Create a refactor response.
    pub fn new(
        file: impl Into<String>,
        before_hash: ContentHash,
        edits: Vec<Edit>,
        applied: bool,
    ) -> Self {
        RefactorResponse {
            status: "ok".to_string(),
            schema_version: SCHEMA_VERSION.to_string(),
            file: file.into(),
            before_hash,
            edits,
            applied,
        }
    }
}

// ============================================================================
// Check
// ============================================================================

/// Response for `steptool check`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckResponse {
    /// `"ok"` when the file parses, `"invalid"` otherwise.
    pub status: String,
    /// Schema version.
    pub schema_version: String,
    /// File that was checked.
    pub file: String,
    /// Rendered syntax error, `null` when the file parses.
    pub error: Option<String>,
}

impl CheckResponse {
    /// A file that parses.
    pub fn valid(file: impl Into<String>) -> Self {
        CheckResponse {
            status: "ok".to_string(),
            schema_version: SCHEMA_VERSION.to_string(),
            file: file.into(),
            error: None,
        }
    }

    /// A file that does not parse.
    pub fn invalid(file: impl Into<String>, error: impl Into<String>) -> Self {
        CheckResponse {
            status: "invalid".to_string(),
            schema_version: SCHEMA_VERSION.to_string(),
            file: file.into(),
            error: Some(error.into()),
        }
    }
}

// ============================================================================
// Errors
// ============================================================================

/// Error details in an error response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorInfo {
    /// Numeric error code (also the process exit code).
    pub code: u8,
    /// Human-readable message.
    pub message: String,
    /// File the error concerns, when there is one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file: Option<String>,
}

impl ErrorInfo {
    /// Build error details from a [`StepToolError`].
    pub fn from_error(err: &StepToolError) -> Self {
        let file = match err {
            StepToolError::FileNotFound { path } | StepToolError::ParseFailed { path } => {
                Some(path.clone())
            }
            StepToolError::StepNotFound { path, .. } => Some(path.clone()),
            StepToolError::ApplyError { file, .. } => file.clone(),
            _ => None,
        };
        ErrorInfo {
            code: OutputErrorCode::from(err).code(),
            message: err.to_string(),
            file,
        }
    }
}

/// Error response envelope.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// Always `"error"`.
    pub status: String,
    /// Schema version.
    pub schema_version: String,
    /// Error details.
    pub error: ErrorInfo,
}

impl ErrorResponse {
    /// Wrap a [`StepToolError`].
    pub fn from_error(err: &StepToolError) -> Self {
        ErrorResponse {
            status: "error".to_string(),
            schema_version: SCHEMA_VERSION.to_string(),
            error: ErrorInfo::from_error(err),
        }
    }
}

// ============================================================================
// Emission
// ============================================================================

/// Serialize a response as pretty JSON followed by a newline.
pub fn emit_response<T: Serialize, W: Write>(response: &T, out: &mut W) -> io::Result<()> {
    serde_json::to_writer_pretty(&mut *out, response)?;
    writeln!(out)
}

// ============================================================================
// Tests
// ============================================================================
