//! Errors that abort a run.
//!
//! Infeasible starting points and non-converging searches are *not* errors:
//! they are reported through [SolveOutcome](crate::SolveOutcome).
use thiserror::Error;

/// Anything that prevents the engine or one of its collaborators from doing its job
#[derive(Error, Debug)]
pub enum Error {
    /// Malformed or out-of-range coefficient data
    #[error("Invalid input: {message}")]
    InvalidInput { message: String },

    /// Vectors whose lengths do not match the coefficient table, or unusable bounds
    #[error("Shape error: {message}")]
    Shape { message: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV processing error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Configuration error: {0}")]
    Config(#[from] toml::de::Error),

    /// A result was requested from a solve that did not produce one
    #[error("No solution to report: {reason}")]
    NoSolution { reason: String },

    /// Charts could not be drawn. Never invalidates an already computed blend.
    #[error("Rendering failure: {message}")]
    Rendering { message: String },
}

impl Error {
    pub(crate) fn invalid_input(message: impl Into<String>) -> Self {
        Error::InvalidInput {
            message: message.into(),
        }
    }

    pub(crate) fn shape(message: impl Into<String>) -> Self {
        Error::Shape {
            message: message.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
