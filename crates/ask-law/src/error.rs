// error.rs - Error types for the law subsystem.

use thiserror::Error;

/// Errors that can occur while compiling or translating laws.
#[derive(Debug, Error)]
pub enum LawError {
    /// The text does not match the LawScript grammar.
    #[error("invalid LawScript: {text}")]
    InvalidLawScript { text: String },

    /// A serialized condition could not be parsed.
    #[error("invalid condition '{condition}': {reason}")]
    InvalidCondition { condition: String, reason: String },

    /// An ordering comparison was given a non-integer threshold.
    #[error("operator '{operator}' needs an integer threshold, got '{value}'")]
    InvalidThreshold { operator: String, value: String },

    /// Plain-text feedback that the translator has no pattern for.
    #[error("cannot translate this feedback yet: {feedback}")]
    Untranslatable { feedback: String },
}
