//! Error types for the tocss transformation.
//!
//! Copyright (c) 2025 Posit, PBC

use thiserror::Error;

/// Errors that can occur while transforming a stylesheet
#[derive(Debug, Error)]
pub enum TransformError {
    /// User-declared options could not be decoded
    #[error("invalid tocss options: {message}")]
    InvalidOptions { message: String },

    /// The compiler rejected the assembled option combination
    #[error("{0}")]
    CompilerInit(String),

    /// The stylesheet (or one of its imports) failed to compile
    #[error("SCSS processing failed: {message}")]
    CompilationFailed { message: String },

    /// The output stream or the artifact sink failed to accept bytes
    #[error(transparent)]
    Publish(#[from] std::io::Error),
}

impl TransformError {
    pub fn compilation_failed(message: impl Into<String>) -> Self {
        Self::CompilationFailed {
            message: message.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, TransformError>;
