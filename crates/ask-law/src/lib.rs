//! # ask-law
//!
//! Human-authored laws and the legality checker for the Assured Safe Kernel.
//!
//! Laws are written in a tiny declarative language:
//!
//! ```text
//! LAW { when inventory > 0 block refund_order because "Check inventory first" }
//! ```
//!
//! [`LawCompiler`] turns that text into a typed [`Law`]; a [`LawBook`] keeps
//! laws in insertion order; the [`LegalityChecker`] evaluates plans and
//! steps against the book and the live [`WorldState`].
//!
//! ## Quick Example
//!
//! ```rust
//! use ask_law::{compile_law, Decision, LegalityChecker, WorldState};
//! use ask_plan::{ActionPlan, ActionStep, StepInputs};
//!
//! let law = compile_law(r#"LAW { when inventory > 0 block refund_order because "x" }"#).unwrap();
//! let checker = LegalityChecker::new([law].into_iter().collect());
//! let world: WorldState = [("inventory", 10)].into_iter().collect();
//! let plan = ActionPlan::new("refund", vec![ActionStep::new("refund_order", StepInputs::new())]);
//!
//! assert!(matches!(checker.check_plan(&plan, &world), Decision::Block { .. }));
//! ```
//!
//! ## Key invariants
//!
//! - **Absence is not a violation**: a law over a missing field never holds.
//! - **Stable ids**: a law's id is a digest of its source text.
//! - **Owned books**: there is no global law book; each checker owns one.

pub mod book;
pub mod compiler;
pub mod enforcer;
pub mod error;
pub mod law;
pub mod translator;
pub mod world;

pub use book::LawBook;
pub use compiler::{compile_law, law_id, LawCompiler};
pub use enforcer::{evaluate, Decision, EvaluationTrace, FieldSource, LawCheck, LegalityChecker};
pub use error::LawError;
pub use law::{Comparison, Condition, Law, Operator};
pub use translator::{feedback_to_law_script, translate_feedback};
pub use world::WorldState;
