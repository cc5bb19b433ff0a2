// error.rs - Error types for plan normalization.

use thiserror::Error;

/// Raised when untrusted planner output cannot be turned into an ActionPlan.
///
/// Always surfaced to the caller; the kernel never repairs a plan itself.
#[derive(Debug, Error)]
pub enum FormatError {
    /// The planner output is not valid JSON.
    #[error("plan is not valid JSON: {0}")]
    InvalidJson(#[from] serde_json::Error),

    /// The plan root is not a JSON object.
    #[error("plan root must be a JSON object, got {found}")]
    NotAnObject { found: String },

    /// None of the known plan shapes matched.
    #[error("unrecognized plan format: {plan}")]
    UnrecognizedFormat { plan: String },

    /// The plan matched a shape but carries no actions.
    #[error("plan contains no actions")]
    EmptyPlan,

    /// An order identifier is structurally required but missing.
    #[error("order_id required but missing for step '{step}'")]
    MissingOrderId { step: String },

    /// A step entry is not shaped the way its plan shape requires.
    #[error("malformed step at index {index}: {reason}")]
    MalformedStep { index: usize, reason: String },
}
