//! # ask-plan
//!
//! Canonical action plans for the Assured Safe Kernel, and the normalizer
//! that produces them from untrusted planner output.
//!
//! A planner (typically a language model) proposes a plan as loosely
//! structured JSON. [`PlanNormalizer`] recognizes the shapes such output
//! comes in and reduces every one of them to an [`ActionPlan`]: an ordered
//! list of [`ActionStep`]s plus a fallback list.
//!
//! ## Key invariants
//!
//! - **No empty plans**: a plan with no actions is a [`FormatError`].
//! - **Clean inputs**: reserved descriptive keys (`action`, `description`,
//!   step numbering) never reach a step's inputs.
//! - **Order id threading**: in step lists, a step without an order id
//!   inherits the most recent one seen, left to right.

pub mod error;
pub mod normalizer;
pub mod plan;
pub mod shapes;
pub mod tool_name;

pub use error::FormatError;
pub use normalizer::{extract_json, normalize, normalize_text, PlanNormalizer};
pub use plan::{ActionPlan, ActionStep, StepInputs, SUCCESS_CONDITION};
pub use shapes::{PlanShape, ORDER_ID};
pub use tool_name::{normalize_tool_name, CHECK_INVENTORY, REFUND_ORDER, VERIFY_ORDER};
