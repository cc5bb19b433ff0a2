// result.rs - Execution result model.
//
// The result is the only thing a caller needs to decide what happens next:
// the status, the blocking reason, and the world state after execution.
// Per-step records and the fallback report make the run observable.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use ask_law::WorldState;

use crate::tool::ToolOutput;

/// Top-level outcome of one `execute` call.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ExecutionStatus {
    /// Every action ran and reported success.
    Success,
    /// A law forbade the plan or one of its steps.
    Blocked,
    /// A step did not report success.
    Failed,
}

impl fmt::Display for ExecutionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExecutionStatus::Success => write!(f, "SUCCESS"),
            ExecutionStatus::Blocked => write!(f, "BLOCKED"),
            ExecutionStatus::Failed => write!(f, "FAILED"),
        }
    }
}

/// What happened to one action step.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum StepOutcome {
    /// The tool ran and reported success.
    Succeeded,
    /// A law forbade the step; the tool was never called.
    Blocked { law_id: String, reason: String },
    /// The tool was missing, returned an error, or reported a non-success status.
    Failed { reason: String },
}

/// Record of one action step that the engine reached.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StepRecord {
    /// Position of the step in the plan's action list.
    pub index: usize,
    pub tool: String,
    pub outcome: StepOutcome,
    /// The tool's result mapping, when the tool returned one.
    pub output: Option<ToolOutput>,
}

/// One fallback step that did not succeed.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct FallbackFailure {
    pub index: usize,
    pub tool: String,
    pub reason: String,
}

/// What happened while running the plan's fallback sequence.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FallbackReport {
    /// Number of fallback steps attempted.
    pub steps_run: usize,
    /// Fallback steps that did not succeed. Surfaced, never swallowed.
    pub failures: Vec<FallbackFailure>,
}

impl FallbackReport {
    /// Whether every fallback step succeeded.
    pub fn succeeded(&self) -> bool {
        self.failures.is_empty()
    }
}

/// The result of executing one plan.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecutionResult {
    /// Unique id of this execution.
    pub execution_id: Uuid,
    pub status: ExecutionStatus,
    /// Why the plan was blocked or failed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    /// World state after execution (including fallback effects).
    pub world_state: WorldState,
    /// Action steps the engine reached, in order.
    pub steps: Vec<StepRecord>,
    /// Present when the fallback sequence was triggered.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fallback: Option<FallbackReport>,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
}

impl ExecutionResult {
    pub fn is_success(&self) -> bool {
        self.status == ExecutionStatus::Success
    }

    /// Whether a triggered fallback sequence had failing steps.
    pub fn fallback_failed(&self) -> bool {
        self.fallback.as_ref().is_some_and(|f| !f.succeeded())
    }
}
