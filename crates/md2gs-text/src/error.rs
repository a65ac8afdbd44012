//! Error types for text geometry.
//!
//! Font resolution and fitting never fail; the only fallible operation is
//! registering a font file whose data cannot be parsed.

use thiserror::Error;

/// Result type for text operations
pub type Result<T> = std::result::Result<T, TextError>;

/// Errors that can occur while loading font data
#[derive(Error, Debug)]
pub enum TextError {
    /// Font data could not be parsed
    #[error("Invalid font data for '{family}': {reason}")]
    InvalidFont { family: String, reason: String },

    /// Font parsed but carries no usable horizontal metrics
    #[error("Font '{family}' has no horizontal line metrics")]
    MissingLineMetrics { family: String },
}

impl TextError {
    /// Create an invalid font error
    pub fn invalid_font(family: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidFont {
            family: family.into(),
            reason: reason.into(),
        }
    }

    /// Get the error code for diagnostics
    pub fn code(&self) -> &'static str {
        match self {
            Self::InvalidFont { .. } => "TEXT001",
            Self::MissingLineMetrics { .. } => "TEXT002",
        }
    }
}
