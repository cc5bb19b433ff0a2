// plan.rs - Canonical action plan and step definitions.
//
// An ActionPlan is what the kernel actually executes. Whatever shape the
// planner emitted, the normalizer reduces it to this form: an ordered list
// of steps to run, plus an ordered fallback list run when the plan is
// blocked or a step fails.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Named inputs handed to a tool, keyed by parameter name.
pub type StepInputs = Map<String, Value>;

/// The success predicate recorded on every normalized step.
///
/// Informational only: the engine's success test is a fixed check on the
/// tool result's `status` field.
pub const SUCCESS_CONDITION: &str = "result.status == \"success\"";

/// One tool invocation.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ActionStep {
    /// Normalized tool identifier (e.g., "refund_order").
    pub tool: String,
    /// Parameters passed to the tool. Never contains reserved descriptive keys.
    pub input_schema: StepInputs,
    /// Human-readable success predicate.
    pub success_condition: String,
}

impl ActionStep {
    /// Create a step with the standard success condition.
    pub fn new(tool: impl Into<String>, input_schema: StepInputs) -> Self {
        Self {
            tool: tool.into(),
            input_schema,
            success_condition: SUCCESS_CONDITION.to_string(),
        }
    }

    /// Replace the success condition (builder pattern).
    pub fn with_success_condition(mut self, condition: impl Into<String>) -> Self {
        self.success_condition = condition.into();
        self
    }

    /// Look up one input parameter.
    pub fn input(&self, name: &str) -> Option<&Value> {
        self.input_schema.get(name)
    }
}

/// A canonical plan: what to do, in order, and what to do instead.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ActionPlan {
    /// Free-text description. Descriptive only.
    pub goal: String,
    /// Reserved; not evaluated.
    #[serde(default)]
    pub preconditions: Vec<String>,
    /// Steps in execution order.
    pub actions: Vec<ActionStep>,
    /// Reserved; not evaluated.
    #[serde(default)]
    pub postconditions: Vec<String>,
    /// Steps run when the plan is blocked or a step fails.
    #[serde(default)]
    pub fallback: Vec<ActionStep>,
}

impl ActionPlan {
    pub fn new(goal: impl Into<String>, actions: Vec<ActionStep>) -> Self {
        Self {
            goal: goal.into(),
            actions,
            ..Default::default()
        }
    }

    /// Set the fallback sequence and return self.
    pub fn with_fallback(mut self, fallback: Vec<ActionStep>) -> Self {
        self.fallback = fallback;
        self
    }

    /// The step the plan opens with, if any.
    pub fn first_action(&self) -> Option<&ActionStep> {
        self.actions.first()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn inputs(order_id: i64) -> StepInputs {
        let mut map = StepInputs::new();
        map.insert("order_id".to_string(), json!(order_id));
        map
    }

    #[test]
    fn new_step_uses_standard_success_condition() {
        let step = ActionStep::new("refund_order", inputs(7));
        assert_eq!(step.success_condition, SUCCESS_CONDITION);
        assert_eq!(step.input("order_id"), Some(&json!(7)));
        assert_eq!(step.input("amount"), None);
    }

    #[test]
    fn first_action_of_empty_plan_is_none() {
        let plan = ActionPlan::new("nothing", vec![]);
        assert!(plan.first_action().is_none());
    }

    #[test]
    fn plan_deserializes_without_reserved_lists() {
        let plan: ActionPlan = serde_json::from_value(json!({
            "goal": "refund",
            "actions": [{
                "tool": "refund_order",
                "input_schema": {"order_id": 1},
                "success_condition": "ok"
            }]
        }))
        .unwrap();

        assert_eq!(plan.actions.len(), 1);
        assert!(plan.fallback.is_empty());
        assert!(plan.preconditions.is_empty());
        assert_eq!(plan.first_action().unwrap().tool, "refund_order");
    }
}
