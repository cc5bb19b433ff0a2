//! # ask-engine
//!
//! Guarded execution for the Assured Safe Kernel.
//!
//! The [`ExecutionEngine`] sits between an untrusted planner and the real
//! tools. It takes a canonical [`ActionPlan`](ask_plan::ActionPlan) (or raw
//! planner output, which it normalizes first), checks it against the law
//! book, runs only legal steps through the [`ToolRegistry`], and runs the
//! plan's fallback when a law blocks it or a step fails.
//!
//! ## Quick Example
//!
//! ```rust
//! use ask_engine::{ExecutionEngine, ExecutionStatus, ToolError, ToolOutput, ToolRegistry};
//! use ask_law::{compile_law, LegalityChecker, WorldState};
//! use ask_plan::StepInputs;
//! use serde_json::json;
//!
//! let law = compile_law(r#"LAW { when inventory > 0 block refund_order because "Check inventory first" }"#).unwrap();
//! let tools = ToolRegistry::new().with_tool("refund_order", |_: &StepInputs| -> Result<ToolOutput, ToolError> {
//!     let mut out = ToolOutput::new();
//!     out.insert("status".into(), json!("success"));
//!     Ok(out)
//! });
//! let engine = ExecutionEngine::new(LegalityChecker::new([law].into_iter().collect()), tools);
//!
//! let mut world: WorldState = [("inventory", 10)].into_iter().collect();
//! let raw = json!({"plan": [{"action": "refund", "order_id": 7}]});
//! let result = engine.execute_raw(&raw, &mut world).unwrap();
//! assert_eq!(result.status, ExecutionStatus::Blocked);
//! ```
//!
//! ## Key invariants
//!
//! - **Checked before run**: no tool is called for a step until the checker
//!   has allowed it against the live world state.
//! - **Outcomes, not panics**: law violations and step failures become
//!   BLOCKED or FAILED results; only malformed plans and bad configuration
//!   are errors.
//! - **One engine-owned effect**: a successful refund sets the refund flag.

pub mod config;
pub mod engine;
pub mod error;
pub mod result;
pub mod tool;

pub use config::{EngineOptions, KernelConfig};
pub use engine::ExecutionEngine;
pub use error::{EngineError, ToolError};
pub use result::{
    ExecutionResult, ExecutionStatus, FallbackFailure, FallbackReport, StepOutcome, StepRecord,
};
pub use tool::{output_status, Tool, ToolOutput, ToolRegistry};
