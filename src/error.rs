//! Error types for the releve library.

use thiserror::Error;

/// Result type alias for releve operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Error types that can occur during statement extraction.
///
/// Only genuinely fatal conditions live here. Missing sections, rows that
/// fail the strict amount filter, and validation mismatches are structured
/// results (warnings, placeholders, `is_valid = false`), not errors.
#[derive(Error, Debug)]
pub enum Error {
    /// The external decoder produced no text content at all.
    #[error("Document contains no text content")]
    EmptyDocument,

    /// No template with the given identifier is registered.
    #[error("Unknown statement template: {0}")]
    UnknownTemplate(String),

    /// Both extraction strategies failed for the same document.
    #[error("Both strategies failed (geometric: {geometric}; textual: {textual})")]
    BothStrategiesFailed { geometric: String, textual: String },

    /// Generic error with message.
    #[error("{0}")]
    Other(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = Error::EmptyDocument;
        assert_eq!(err.to_string(), "Document contains no text content");

        let err = Error::UnknownTemplate("fcfa-bank-v9".to_string());
        assert_eq!(err.to_string(), "Unknown statement template: fcfa-bank-v9");
    }

    #[test]
    fn test_both_strategies_failed_names_both_causes() {
        let err = Error::BothStrategiesFailed {
            geometric: "no zones".to_string(),
            textual: "no anchors".to_string(),
        };
        let msg = err.to_string();
        assert!(msg.contains("no zones"));
        assert!(msg.contains("no anchors"));
    }
}
