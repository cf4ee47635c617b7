//! Error types for sqlsketch

use thiserror::Error;

/// Result type alias for sqlsketch operations
pub type SketchResult<T> = Result<T, SketchError>;

/// Error types for SQL generation and project bookkeeping
#[derive(Debug, Error)]
pub enum SketchError {
    /// A required input was not provided (table info, fields, WHERE, ...)
    #[error("Missing input: {0}")]
    MissingInput(String),

    /// The selected tables cannot be connected through foreign keys
    #[error("Tables are not related: {from} and {to}")]
    Unrelated { from: String, to: String },

    /// Option validation failed
    #[error("Validation error: {0}")]
    Validation(String),

    /// A table was not found in the project
    #[error("Not found: {0}")]
    NotFound(String),

    /// A table with the same schema and title already exists
    #[error("Duplicate table: {0}")]
    Duplicate(String),
}

impl SketchError {
    /// Create a missing input error
    pub fn missing(message: impl Into<String>) -> Self {
        Self::MissingInput(message.into())
    }

    /// Create an unrelated tables error
    pub fn unrelated(from: impl Into<String>, to: impl Into<String>) -> Self {
        Self::Unrelated {
            from: from.into(),
            to: to.into(),
        }
    }

    /// Create a validation error
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    /// Create a not found error
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound(message.into())
    }

    /// Check if this is a missing input error
    pub fn is_missing_input(&self) -> bool {
        matches!(self, Self::MissingInput(_))
    }

    /// Check if this is an unrelated tables error
    pub fn is_unrelated(&self) -> bool {
        matches!(self, Self::Unrelated { .. })
    }

    /// Check if this is a not found error
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }
}
