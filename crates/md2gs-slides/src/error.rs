//! Error types for deck compilation and reconciliation.

use thiserror::Error;

/// Result type for slide operations
pub type Result<T> = std::result::Result<T, SlidesError>;

/// Errors that can occur while compiling, rendering or reconciling a deck
#[derive(Error, Debug)]
pub enum SlidesError {
    /// Configuration file is structurally valid TOML but semantically wrong
    #[error("Invalid configuration: {reason}")]
    InvalidConfig { reason: String },

    /// A forced layout name matches neither a predefined nor a remote layout
    #[error("Unknown layout '{name}' on slide {slide}")]
    UnknownLayout { name: String, slide: usize },

    /// The remote API answered with an error status or an unreadable body
    #[error("{operation} on presentation {presentation_id} failed{}: {message}", status_suffix(.status))]
    Remote {
        operation: String,
        presentation_id: String,
        status: Option<u16>,
        message: String,
    },

    /// A duplicate request was accepted but its reply carried no new object
    #[error("duplicateObject of {slide_id} in presentation {presentation_id} returned no object id")]
    MissingDuplicateReply {
        presentation_id: String,
        slide_id: String,
    },

    /// A reconciliation step failed for a specific remote object
    #[error("{operation} failed for {object_id} in presentation {presentation_id}: {source}")]
    Reconcile {
        operation: &'static str,
        presentation_id: String,
        object_id: String,
        #[source]
        source: Box<SlidesError>,
    },

    /// Font file could not be loaded
    #[error("Font error: {0}")]
    FontError(#[from] md2gs_text::TextError),

    /// I/O error
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    /// TOML parsing error (for DeckConfig)
    #[error("TOML parsing error: {0}")]
    TomlError(#[from] toml::de::Error),

    /// JSON encoding or decoding error
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),
}

fn status_suffix(status: &Option<u16>) -> String {
    status.map(|s| format!(" ({s})")).unwrap_or_default()
}

impl SlidesError {
    /// Create an invalid configuration error
    pub fn invalid_config(reason: impl Into<String>) -> Self {
        Self::InvalidConfig {
            reason: reason.into(),
        }
    }

    /// Create an unknown layout error
    pub fn unknown_layout(name: impl Into<String>, slide: usize) -> Self {
        Self::UnknownLayout {
            name: name.into(),
            slide,
        }
    }

    /// Create a remote API error
    pub fn remote(
        operation: impl Into<String>,
        presentation_id: impl Into<String>,
        status: Option<u16>,
        message: impl Into<String>,
    ) -> Self {
        Self::Remote {
            operation: operation.into(),
            presentation_id: presentation_id.into(),
            status,
            message: message.into(),
        }
    }

    /// Create a missing duplicate reply error
    pub fn missing_duplicate_reply(
        presentation_id: impl Into<String>,
        slide_id: impl Into<String>,
    ) -> Self {
        Self::MissingDuplicateReply {
            presentation_id: presentation_id.into(),
            slide_id: slide_id.into(),
        }
    }

    /// Wrap an error with the reconciliation step and object it concerns
    pub fn reconcile(
        operation: &'static str,
        presentation_id: impl Into<String>,
        object_id: impl Into<String>,
        source: SlidesError,
    ) -> Self {
        Self::Reconcile {
            operation,
            presentation_id: presentation_id.into(),
            object_id: object_id.into(),
            source: Box::new(source),
        }
    }

    /// Get the error code for diagnostics
    pub fn code(&self) -> &'static str {
        match self {
            Self::InvalidConfig { .. } => "SLIDES001",
            Self::UnknownLayout { .. } => "SLIDES002",
            Self::Remote { .. } => "SLIDES003",
            Self::MissingDuplicateReply { .. } => "SLIDES004",
            Self::Reconcile { .. } => "SLIDES005",
            Self::FontError(_) => "SLIDES006",
            Self::IoError(_) => "SLIDES007",
            Self::TomlError(_) => "SLIDES008",
            Self::JsonError(_) => "SLIDES009",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_codes() {
        let err = SlidesError::missing_duplicate_reply("deck1", "slide7");
        assert_eq!(err.code(), "SLIDES004");
        assert!(err.to_string().contains("deck1"));
        assert!(err.to_string().contains("slide7"));

        let err = SlidesError::unknown_layout("FANCY", 3);
        assert_eq!(err.code(), "SLIDES002");
        assert!(err.to_string().contains("FANCY"));
    }

    #[test]
    fn test_remote_display() {
        let err = SlidesError::remote("batchUpdate", "deck1", Some(400), "Invalid requests[0]");
        assert_eq!(
            err.to_string(),
            "batchUpdate on presentation deck1 failed (400): Invalid requests[0]"
        );

        let err = SlidesError::remote("get", "deck1", None, "connection reset");
        assert_eq!(
            err.to_string(),
            "get on presentation deck1 failed: connection reset"
        );
    }

    #[test]
    fn test_reconcile_wraps_source() {
        let inner = SlidesError::remote("batchUpdate", "deck1", Some(500), "backend error");
        let err = SlidesError::reconcile("editSlide", "deck1", "el1", inner);
        assert_eq!(err.code(), "SLIDES005");
        let message = err.to_string();
        assert!(message.starts_with("editSlide failed for el1"));
        assert!(message.contains("backend error"));
        assert!(std::error::Error::source(&err).is_some());
    }
}
