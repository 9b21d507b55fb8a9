//! # Error Types
//!
//! Structured error types for quote_core. Per-field validation failures are
//! NOT errors — they are [`Validity`](crate::fields::Validity) verdicts — and
//! a rejected commit is a message recorded on the tab, never an `Err`. What
//! remains here are the genuinely exceptional paths: malformed import
//! payloads, blocked exports, catalog sources that could not be read, and
//! snapshot I/O.
//!
//! ## Example
//!
//! ```rust
//! use quote_core::errors::QuoteError;
//!
//! let err = QuoteError::import_shape("Payload does not contain any tabs");
//! assert_eq!(err.error_code(), "IMPORT_SHAPE");
//! ```

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Result type alias for quote_core operations
pub type QuoteResult<T> = Result<T, QuoteError>;

/// Structured error type for the quotation engine.
#[derive(Error, Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", content = "details")]
pub enum QuoteError {
    /// Import text is not parseable JSON
    #[error("Import parse error: {reason}")]
    ImportParse { reason: String },

    /// Import JSON parsed but does not have the required payload shape
    #[error("Import payload invalid: {reason}")]
    ImportShape { reason: String },

    /// A catalog source could not be read or parsed
    #[error("Catalog '{source_id}' failed to load: {reason}")]
    CatalogLoad { source_id: String, reason: String },

    /// Export/PDF collection requested while no quotes exist
    #[error("There are no quotes to export.")]
    NothingToExport,

    /// A specific tab blocks export/PDF collection
    #[error("Quote \"{tab_label}\" {reason}")]
    ExportBlocked { tab_label: String, reason: String },

    /// Snapshot file I/O error
    #[error("File error: {operation} on '{path}' - {reason}")]
    FileError {
        operation: String,
        path: String,
        reason: String,
    },

    /// JSON serialization/deserialization error
    #[error("Serialization error: {reason}")]
    Serialization { reason: String },
}

impl QuoteError {
    /// Create an ImportParse error
    pub fn import_parse(reason: impl Into<String>) -> Self {
        QuoteError::ImportParse {
            reason: reason.into(),
        }
    }

    /// Create an ImportShape error
    pub fn import_shape(reason: impl Into<String>) -> Self {
        QuoteError::ImportShape {
            reason: reason.into(),
        }
    }

    /// Create a CatalogLoad error
    pub fn catalog_load(source_id: impl Into<String>, reason: impl Into<String>) -> Self {
        QuoteError::CatalogLoad {
            source_id: source_id.into(),
            reason: reason.into(),
        }
    }

    /// Create an ExportBlocked error for a specific tab
    pub fn export_blocked(tab_label: impl Into<String>, reason: impl Into<String>) -> Self {
        QuoteError::ExportBlocked {
            tab_label: tab_label.into(),
            reason: reason.into(),
        }
    }

    /// Create a FileError
    pub fn file_error(
        operation: impl Into<String>,
        path: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        QuoteError::FileError {
            operation: operation.into(),
            path: path.into(),
            reason: reason.into(),
        }
    }

    /// Get a short error code for programmatic handling
    pub fn error_code(&self) -> &'static str {
        match self {
            QuoteError::ImportParse { .. } => "IMPORT_PARSE",
            QuoteError::ImportShape { .. } => "IMPORT_SHAPE",
            QuoteError::CatalogLoad { .. } => "CATALOG_LOAD",
            QuoteError::NothingToExport => "NOTHING_TO_EXPORT",
            QuoteError::ExportBlocked { .. } => "EXPORT_BLOCKED",
            QuoteError::FileError { .. } => "FILE_ERROR",
            QuoteError::Serialization { .. } => "SERIALIZATION_ERROR",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_serialization() {
        let error = QuoteError::import_shape("Payload does not contain any tabs");
        let json = serde_json::to_string(&error).unwrap();
        let roundtrip: QuoteError = serde_json::from_str(&json).unwrap();
        assert_eq!(error, roundtrip);
    }

    #[test]
    fn test_error_codes() {
        assert_eq!(QuoteError::import_parse("x").error_code(), "IMPORT_PARSE");
        assert_eq!(
            QuoteError::catalog_load("materials", "unreadable").error_code(),
            "CATALOG_LOAD"
        );
        assert_eq!(QuoteError::NothingToExport.error_code(), "NOTHING_TO_EXPORT");
    }

    #[test]
    fn test_export_blocked_message_names_the_tab() {
        let err = QuoteError::export_blocked(
            "Quote 2",
            "has uncommitted changes. Please click \"Update summary\" first.",
        );
        let msg = err.to_string();
        assert!(msg.contains("Quote 2"));
        assert!(msg.contains("uncommitted changes"));
    }
}
