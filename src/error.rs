// ⚠️ Error Taxonomy - typed errors for conversions and the comment board
//
// Every error is local to one user action. None of them should take the
// process down: front ends report them inline and keep running.

use std::path::PathBuf;
use thiserror::Error;

// ============================================================================
// CONVERSION ERRORS
// ============================================================================

/// Errors raised while looking up units or converting a value
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConversionError {
    /// Category name not present in the unit table
    #[error("Unknown category: {0}")]
    UnknownCategory(String),

    /// Unit name not listed for the given category
    #[error("Unknown unit '{unit}' in category {category}")]
    UnknownUnit { category: String, unit: String },

    /// Scale factor requested for a formula-based category (Temperature)
    #[error("Category {category} has no linear scale factor")]
    NotLinear { category: String },

    /// Inputs must be non-negative
    #[error("Value cannot be negative: {0}")]
    NegativeValue(f64),

    #[error("Value must be a finite number")]
    NonFiniteValue,
}

// ============================================================================
// COMMENT STORE ERRORS
// ============================================================================

/// Errors raised by the persisted comment board
#[derive(Error, Debug)]
pub enum CommentError {
    /// Empty or blank name/comment on submit
    #[error("Please enter both name and comment before submitting ({field} is empty)")]
    Validation { field: &'static str },

    /// Delete of a stale or invalid position
    #[error("No comment at position {index} (board has {len} comments)")]
    IndexOutOfRange { index: usize, len: usize },

    /// Persisted file exists but is not a JSON array of strings
    #[error("Comment file {path:?} is corrupt: {source}")]
    CorruptState {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// Board could not be encoded as JSON; the file is left as it was
    #[error("Failed to encode comments for {path:?}: {source}")]
    Encode {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("I/O error on comment file {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl CommentError {
    /// True when the only way forward is resetting the file to an empty board
    pub fn is_corrupt_state(&self) -> bool {
        matches!(self, CommentError::CorruptState { .. })
    }
}

pub type ConversionResult<T> = Result<T, ConversionError>;
pub type CommentResult<T> = Result<T, CommentError>;
