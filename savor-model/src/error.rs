//! Error types for the `savor-model` crate.

use thiserror::Error;

/// Errors raised while assembling prompts, calling a model or converting its output.
#[derive(Debug, Error)]
pub enum ModelError {
    /// A prompt template referenced a slot that was not bound.
    #[error("Template error: {0}")]
    Template(String),

    /// The model output could not be converted to the requested shape.
    #[error("Failed to parse model output: {0}")]
    Parse(String),

    /// The language model call itself failed.
    #[error("Model error ({provider}): {message}")]
    Downstream {
        /// The model or provider that produced the error.
        provider: String,
        /// A description of the failure.
        message: String,
    },

    /// A client was constructed with unusable settings.
    #[error("Configuration error: {0}")]
    Config(String),
}

/// A convenience result type for model operations.
pub type Result<T> = std::result::Result<T, ModelError>;
