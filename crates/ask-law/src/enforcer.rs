// enforcer.rs - Legality checker.
//
// Every plan and every step passes through the checker before any tool
// runs. Two entry points share one evaluation core:
//
// - check_plan: cheap gate before any side effect. Each law's condition is
//   evaluated against world state alone; a holding law blocks the plan only
//   if the plan's FIRST action is one of its blocked tools.
// - check_step: run before every step. The field is looked up in world
//   state first, then in the step's own inputs; a holding law blocks the
//   step if the step's tool is one of its blocked tools.
//
// Conditions are re-evaluated against live world state on every check. An
// earlier step does not retire a law unless it changes the field the law
// reads.
//
// An absent field never violates a law.

use std::cmp::Ordering;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use ask_plan::{ActionPlan, ActionStep};

use crate::book::LawBook;
use crate::law::{Comparison, Condition, Law};
use crate::world::WorldState;

/// Outcome of a legality check.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "decision", rename_all = "snake_case")]
pub enum Decision {
    /// No law forbids the action.
    Allow,
    /// A law's condition holds and its block set includes the tool.
    Block {
        law_id: String,
        tool: String,
        reason: String,
    },
}

impl Decision {
    pub fn is_allowed(&self) -> bool {
        matches!(self, Decision::Allow)
    }

    fn block(law: &Law, tool: &str) -> Self {
        Decision::Block {
            law_id: law.id.clone(),
            tool: tool.to_string(),
            reason: law.reason.clone(),
        }
    }
}

/// Where a condition's field value was found.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum FieldSource {
    WorldState,
    StepInput,
    Absent,
}

/// One law inspected during a traced check.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LawCheck {
    pub law_id: String,
    /// The condition as written (e.g., "inventory > 0").
    pub condition: String,
    /// Where the field value came from.
    pub source: FieldSource,
    /// Whether the condition held.
    pub held: bool,
    /// Whether this law produced the final Block decision.
    pub terminal: bool,
}

/// Full record of a step check: every law inspected, plus the decision.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvaluationTrace {
    pub decision: Decision,
    pub checks: Vec<LawCheck>,
}

/// Evaluate a condition against a field lookup.
///
/// Ordering operators compare integers; equality operators compare the
/// stringified field value. A missing (or null) field never holds.
pub fn evaluate<'a, F>(condition: &Condition, lookup: F) -> bool
where
    F: Fn(&str) -> Option<&'a Value>,
{
    match lookup(&condition.field) {
        Some(actual) if !actual.is_null() => compare(actual, &condition.comparison),
        _ => false,
    }
}

fn compare(actual: &Value, comparison: &Comparison) -> bool {
    match comparison {
        Comparison::GreaterThan(threshold) => {
            integer_order(actual, *threshold) == Some(Ordering::Greater)
        }
        Comparison::LessThan(threshold) => integer_order(actual, *threshold) == Some(Ordering::Less),
        Comparison::Equals(expected) => text_equals(actual, expected),
        Comparison::NotEquals(expected) => !text_equals(actual, expected),
    }
}

/// Order a field value against an integer threshold.
///
/// Integers, floats, booleans (as 0/1) and numeric strings are comparable;
/// anything else is not, and the condition does not hold.
fn integer_order(actual: &Value, threshold: i64) -> Option<Ordering> {
    match actual {
        Value::Number(n) => match n.as_i64() {
            Some(i) => Some(i.cmp(&threshold)),
            None => n.as_f64()?.partial_cmp(&(threshold as f64)),
        },
        Value::Bool(b) => Some(i64::from(*b).cmp(&threshold)),
        Value::String(s) => {
            let s = s.trim();
            match s.parse::<i64>() {
                Ok(i) => Some(i.cmp(&threshold)),
                Err(_) => s.parse::<f64>().ok()?.partial_cmp(&(threshold as f64)),
            }
        }
        _ => None,
    }
}

/// Compare the stringified field value with the law's value.
///
/// Booleans compare case-insensitively so `True` and `true` agree.
fn text_equals(actual: &Value, expected: &str) -> bool {
    match actual {
        Value::String(s) => s == expected,
        Value::Bool(b) => b.to_string().eq_ignore_ascii_case(expected),
        other => other.to_string() == expected,
    }
}

/// Resolve a field for a step check: world state first, then step inputs.
fn resolve<'a>(
    field: &str,
    world: &'a WorldState,
    step: &'a ActionStep,
) -> (Option<&'a Value>, FieldSource) {
    if let Some(value) = world.get(field) {
        return (Some(value), FieldSource::WorldState);
    }
    match step.input(field).filter(|v| !v.is_null()) {
        Some(value) => (Some(value), FieldSource::StepInput),
        None => (None, FieldSource::Absent),
    }
}

/// Checks plans and steps against an owned law book.
#[derive(Debug, Clone, Default)]
pub struct LegalityChecker {
    book: LawBook,
}

impl LegalityChecker {
    pub fn new(book: LawBook) -> Self {
        Self { book }
    }

    pub fn book(&self) -> &LawBook {
        &self.book
    }

    /// Add a law. Requires exclusive access, so no check can be in flight.
    pub fn add_law(&mut self, law: Law) {
        self.book.add(law);
    }

    /// Plan-level gate: only the plan's first action is inspected.
    pub fn check_plan(&self, plan: &ActionPlan, world: &WorldState) -> Decision {
        let Some(first) = plan.first_action() else {
            return Decision::Allow;
        };

        for law in self.book.all() {
            if !evaluate(&law.condition, |field| world.get(field)) {
                continue;
            }
            tracing::debug!(law_id = %law.id, condition = %law.condition, "law condition holds");
            if law.blocks(&first.tool) {
                tracing::info!(
                    law_id = %law.id,
                    tool = %first.tool,
                    "plan blocked at first action: {}",
                    law.reason
                );
                return Decision::block(law, &first.tool);
            }
        }
        Decision::Allow
    }

    /// Step-level gate, run before every step.
    pub fn check_step(&self, step: &ActionStep, world: &WorldState) -> Decision {
        self.check_step_with_trace(step, world).decision
    }

    /// Same as `check_step` but records every law inspected.
    pub fn check_step_with_trace(&self, step: &ActionStep, world: &WorldState) -> EvaluationTrace {
        let mut checks = Vec::new();

        for law in self.book.all() {
            let (value, source) = resolve(&law.condition.field, world, step);
            let held = evaluate(&law.condition, |_| value);
            let blocking = held && law.blocks(&step.tool);

            checks.push(LawCheck {
                law_id: law.id.clone(),
                condition: law.condition.to_string(),
                source,
                held,
                terminal: blocking,
            });

            if held {
                tracing::debug!(law_id = %law.id, condition = %law.condition, "law condition holds");
            }
            if blocking {
                tracing::info!(
                    law_id = %law.id,
                    tool = %step.tool,
                    "step blocked: {}",
                    law.reason
                );
                return EvaluationTrace {
                    decision: Decision::block(law, &step.tool),
                    checks,
                };
            }
        }

        EvaluationTrace {
            decision: Decision::Allow,
            checks,
        }
    }
}
