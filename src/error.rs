//! Error types for rar-reclaim
//!
//! This module provides the error taxonomy for the whole pipeline:
//! - Fatal errors that stop the run before anything is deleted (missing tool, no parts, failed test)
//! - Extraction failures reported by the external tool
//! - Per-part deletion failures, which are logged but never abort a run
//! - Exit status mapping for the command-line binary

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for rar-reclaim operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for rar-reclaim
///
/// Each variant carries enough context to print a useful diagnostic before the
/// process exits.
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration error with context about which setting is invalid
    #[error("configuration error: {message}")]
    Config {
        /// Human-readable error message describing the configuration issue
        message: String,
        /// The configuration key that caused the error (e.g., "part_file_pattern")
        key: Option<String>,
    },

    /// The external archiving tool could not be found
    #[error("archive tool not found (looked for: {searched})")]
    ToolMissing {
        /// Human-readable description of the locations that were checked
        searched: String,
    },

    /// The operator cancelled a file or folder selection
    #[error("selection cancelled")]
    SelectionCancelled,

    /// The archive path given to the locator does not exist
    #[error("archive not found: {path}")]
    ArchiveNotFound {
        /// The path that was expected to exist
        path: PathBuf,
    },

    /// The file name does not follow the `<base>.partN.rar` naming convention
    #[error("not a numbered archive part: {path}")]
    InvalidPartName {
        /// The offending path
        path: PathBuf,
    },

    /// No sibling parts matched the discovery pattern
    #[error("no parts of '{base_name}' found in {directory}")]
    NoPartsFound {
        /// Directory that was searched
        directory: PathBuf,
        /// Base name shared by the expected parts
        base_name: String,
    },

    /// The integrity test reported a damaged or unreadable archive
    #[error("integrity check failed for {archive}: {diagnostics}")]
    IntegrityCheckFailed {
        /// First part of the archive that was tested
        archive: PathBuf,
        /// Diagnostic text captured from the tool
        diagnostics: String,
    },

    /// The external tool exited with a non-zero status during extraction
    #[error("extraction failed for {archive} (exit code {exit_code:?}): {diagnostics}")]
    ExtractionFailed {
        /// First part of the archive being extracted
        archive: PathBuf,
        /// Exit code reported by the tool, if it exited normally
        exit_code: Option<i32>,
        /// Diagnostic text captured from the tool's error stream
        diagnostics: String,
    },

    /// Removing a consumed part from disk failed (non-fatal, logged as warning)
    #[error("failed to delete {path}: {source}")]
    DeletionFailed {
        /// The part that could not be removed
        path: PathBuf,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// External tool execution failed (spawn failure, broken pipe, etc.)
    #[error("external tool error: {0}")]
    ExternalTool(String),

    /// Configuration file could not be parsed
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The run was interrupted by a termination signal
    #[error("interrupted")]
    Interrupted,

    /// Other error
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Create a configuration error for a specific key
    pub fn config(message: impl Into<String>, key: impl Into<String>) -> Self {
        Error::Config {
            message: message.into(),
            key: Some(key.into()),
        }
    }

    /// Returns `true` for outcomes that end the run without being a failure
    pub fn is_benign(&self) -> bool {
        matches!(self, Error::SelectionCancelled)
    }
}

/// Convert errors to process exit status for the command-line binary
///
/// Benign outcomes (cancelled selections) exit with 0; everything else exits with 1.
pub trait ToExitCode {
    /// Get the process exit status for this error
    fn exit_code(&self) -> i32;

    /// Get the machine-readable error code
    fn error_code(&self) -> &str;
}

impl ToExitCode for Error {
    fn exit_code(&self) -> i32 {
        if self.is_benign() { 0 } else { 1 }
    }

    fn error_code(&self) -> &str {
        match self {
            Error::Config { .. } => "config_error",
            Error::ToolMissing { .. } => "tool_missing",
            Error::SelectionCancelled => "selection_cancelled",
            Error::ArchiveNotFound { .. } => "archive_not_found",
            Error::InvalidPartName { .. } => "invalid_part_name",
            Error::NoPartsFound { .. } => "no_parts_found",
            Error::IntegrityCheckFailed { .. } => "integrity_check_failed",
            Error::ExtractionFailed { .. } => "extraction_failed",
            Error::DeletionFailed { .. } => "deletion_failed",
            Error::ExternalTool(_) => "external_tool_error",
            Error::Serialization(_) => "serialization_error",
            Error::Io(_) => "io_error",
            Error::Interrupted => "interrupted",
            Error::Other(_) => "internal_error",
        }
    }
}
