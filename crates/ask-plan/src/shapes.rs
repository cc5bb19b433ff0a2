// shapes.rs - The plan shapes the normalizer recognizes.
//
// Planner output is untrusted and not held to one schema. Each shape is a
// predicate (does this root look like me?) plus an extractor (build the
// canonical plan or fail). The normalizer tries shapes in priority order and
// the first predicate that matches owns the input: its extractor's error is
// final, later shapes are not consulted.

use serde_json::{Map, Value};

use crate::error::FormatError;
use crate::plan::{ActionPlan, ActionStep, StepInputs, SUCCESS_CONDITION};
use crate::tool_name::{normalize_tool_name, requires_order_id};

/// Canonical key for the order identifier in step inputs.
pub const ORDER_ID: &str = "order_id";

/// Accepted spellings of the order identifier (matched case-insensitively).
const ORDER_ID_KEYS: &[&str] = &["order_id", "orderid"];

/// Keys under which the nested workflow shape keeps its step list.
const STEP_LIST_KEYS: &[&str] = &["actions", "steps"];

/// Keys a workflow step may use for its action label, in priority order.
const STEP_LABEL_KEYS: &[&str] = &["action", "description", "task"];

/// A recognizable plan layout: predicate plus extractor.
pub trait PlanShape: Send + Sync {
    /// Short name used in logs.
    fn name(&self) -> &'static str;

    /// Whether this shape claims the given plan root.
    fn matches(&self, root: &Map<String, Value>) -> bool;

    /// Build the canonical plan. Only called when `matches` returned true.
    fn extract(&self, root: &Map<String, Value>) -> Result<ActionPlan, FormatError>;
}

/// The built-in shapes, highest priority first.
pub fn builtin_shapes() -> Vec<Box<dyn PlanShape>> {
    vec![
        Box::new(CanonicalShape),
        Box::new(WorkflowShape),
        Box::new(SingleActionShape),
        Box::new(PreCanonicalShape),
        Box::new(StepListShape),
    ]
}

// ── Shape 1: {"plan": [{"action": ..., "order_id": ...}, ...]} ──

/// Strict canonical shape: every step names an action and an order id.
///
/// Only the order id is kept as input; any extra step keys are dropped.
pub struct CanonicalShape;

impl CanonicalShape {
    fn is_strict_step(step: &Value) -> bool {
        step.as_object().is_some_and(|s| {
            s.get("action").is_some_and(Value::is_string)
                && s.get(ORDER_ID).is_some_and(|v| !v.is_null())
        })
    }
}

impl PlanShape for CanonicalShape {
    fn name(&self) -> &'static str {
        "canonical"
    }

    fn matches(&self, root: &Map<String, Value>) -> bool {
        match root.get("plan").and_then(Value::as_array) {
            Some(steps) => !steps.is_empty() && steps.iter().all(Self::is_strict_step),
            None => false,
        }
    }

    fn extract(&self, root: &Map<String, Value>) -> Result<ActionPlan, FormatError> {
        let steps = root
            .get("plan")
            .and_then(Value::as_array)
            .ok_or(FormatError::EmptyPlan)?;

        let mut actions = Vec::with_capacity(steps.len());
        let mut first_order_id = None;
        for step in steps.iter().filter_map(Value::as_object) {
            let label = step.get("action").and_then(Value::as_str).unwrap_or("");
            let order_id = step.get(ORDER_ID).cloned().unwrap_or(Value::Null);
            first_order_id.get_or_insert_with(|| order_id.clone());
            actions.push(ActionStep::new(
                normalize_tool_name(label),
                order_inputs(order_id),
            ));
        }

        let goal = match &first_order_id {
            Some(id) => format!("Execute plan for order {}", display_value(id)),
            None => "Execute plan".to_string(),
        };
        Ok(ActionPlan::new(goal, actions))
    }
}

// ── Shape 2: {"ActionPlan": {"orderId": ..., "Steps": [{"Task": ...}]}} ──

/// Nested workflow object: one shared order id and a list of step descriptors.
pub struct WorkflowShape;

impl PlanShape for WorkflowShape {
    fn name(&self) -> &'static str {
        "workflow"
    }

    fn matches(&self, root: &Map<String, Value>) -> bool {
        action_plan_object(root)
            .and_then(|ap| find_key(ap, STEP_LIST_KEYS))
            .is_some_and(Value::is_array)
    }

    fn extract(&self, root: &Map<String, Value>) -> Result<ActionPlan, FormatError> {
        let ap = action_plan_object(root).ok_or(FormatError::EmptyPlan)?;
        let steps = find_key(ap, STEP_LIST_KEYS)
            .and_then(Value::as_array)
            .ok_or(FormatError::EmptyPlan)?;
        if steps.is_empty() {
            return Err(FormatError::EmptyPlan);
        }

        let order_id = find_key(ap, ORDER_ID_KEYS)
            .cloned()
            .ok_or_else(|| FormatError::MissingOrderId {
                step: "workflow".to_string(),
            })?;

        let mut actions = Vec::with_capacity(steps.len());
        for (index, step) in steps.iter().enumerate() {
            let step = step.as_object().ok_or_else(|| FormatError::MalformedStep {
                index,
                reason: "workflow step must be an object".to_string(),
            })?;
            let label = find_key(step, STEP_LABEL_KEYS)
                .and_then(Value::as_str)
                .unwrap_or("");
            actions.push(ActionStep::new(
                normalize_tool_name(label),
                order_inputs(order_id.clone()),
            ));
        }

        Ok(ActionPlan::new(
            format!("Process workflow for order {}", display_value(&order_id)),
            actions,
        ))
    }
}

// ── Shape 3: {"actionPlan": {"action": ..., "order_id": ...}} ──

/// A single action with its order id.
pub struct SingleActionShape;

impl PlanShape for SingleActionShape {
    fn name(&self) -> &'static str {
        "single_action"
    }

    fn matches(&self, root: &Map<String, Value>) -> bool {
        action_plan_object(root).is_some_and(|ap| ap.get("action").is_some_and(Value::is_string))
    }

    fn extract(&self, root: &Map<String, Value>) -> Result<ActionPlan, FormatError> {
        let ap = action_plan_object(root).ok_or(FormatError::EmptyPlan)?;
        let label = ap.get("action").and_then(Value::as_str).unwrap_or("");
        let tool = normalize_tool_name(label);

        let order_id = find_key(ap, ORDER_ID_KEYS)
            .cloned()
            .ok_or_else(|| FormatError::MissingOrderId { step: tool.clone() })?;

        let goal = format!("Execute {} for order {}", tool, display_value(&order_id));
        Ok(ActionPlan::new(
            goal,
            vec![ActionStep::new(tool, order_inputs(order_id))],
        ))
    }
}

// ── Shape 4: {"goal": ..., "actions": [{"tool", "inputs", "success_condition"}]} ──

/// Entries already name the tool, its inputs, and the success condition.
///
/// Tool names are taken as given. An optional `fallback` list in the same
/// entry format is honored.
pub struct PreCanonicalShape;

impl PreCanonicalShape {
    fn parse_steps(entries: &[Value]) -> Result<Vec<ActionStep>, FormatError> {
        entries
            .iter()
            .enumerate()
            .map(|(index, entry)| Self::parse_step(index, entry))
            .collect()
    }

    fn parse_step(index: usize, entry: &Value) -> Result<ActionStep, FormatError> {
        let malformed = |reason: &str| FormatError::MalformedStep {
            index,
            reason: reason.to_string(),
        };

        let entry = entry
            .as_object()
            .ok_or_else(|| malformed("entry must be an object"))?;
        let tool = entry
            .get("tool")
            .and_then(Value::as_str)
            .filter(|t| !t.trim().is_empty())
            .ok_or_else(|| malformed("missing string field 'tool'"))?;
        let inputs = entry
            .get("inputs")
            .and_then(Value::as_object)
            .ok_or_else(|| malformed("missing object field 'inputs'"))?;
        let condition = entry
            .get("success_condition")
            .and_then(Value::as_str)
            .unwrap_or(SUCCESS_CONDITION);

        Ok(ActionStep::new(tool, collect_inputs(inputs)).with_success_condition(condition))
    }
}

impl PlanShape for PreCanonicalShape {
    fn name(&self) -> &'static str {
        "pre_canonical"
    }

    fn matches(&self, root: &Map<String, Value>) -> bool {
        root.get("actions").is_some_and(Value::is_array)
    }

    fn extract(&self, root: &Map<String, Value>) -> Result<ActionPlan, FormatError> {
        let entries = root
            .get("actions")
            .and_then(Value::as_array)
            .ok_or(FormatError::EmptyPlan)?;
        if entries.is_empty() {
            return Err(FormatError::EmptyPlan);
        }

        let actions = Self::parse_steps(entries)?;
        let fallback = match root.get("fallback").and_then(Value::as_array) {
            Some(entries) => Self::parse_steps(entries)?,
            None => Vec::new(),
        };
        let goal = root
            .get("goal")
            .and_then(Value::as_str)
            .unwrap_or("Execute plan");

        Ok(ActionPlan::new(goal, actions).with_fallback(fallback))
    }
}

// ── Shape 5: {"order_id"?: ..., "plan": [{"action": ..., ...params}]} ──

/// The permissive step list.
///
/// Every non-reserved key becomes a step input. The order id threads left to
/// right: a step without one inherits the most recent id seen (from the plan
/// root or an earlier step); a step that supplies its own id becomes the new
/// source for the steps after it.
pub struct StepListShape;

impl PlanShape for StepListShape {
    fn name(&self) -> &'static str {
        "step_list"
    }

    fn matches(&self, root: &Map<String, Value>) -> bool {
        root.get("plan").is_some_and(Value::is_array)
    }

    fn extract(&self, root: &Map<String, Value>) -> Result<ActionPlan, FormatError> {
        let steps = root
            .get("plan")
            .and_then(Value::as_array)
            .ok_or(FormatError::EmptyPlan)?;
        if steps.is_empty() {
            return Err(FormatError::EmptyPlan);
        }

        let mut carried = find_key(root, ORDER_ID_KEYS).cloned();
        let mut actions = Vec::with_capacity(steps.len());

        for (index, step) in steps.iter().enumerate() {
            let step = step.as_object().ok_or_else(|| FormatError::MalformedStep {
                index,
                reason: "plan step must be an object".to_string(),
            })?;
            let label = step.get("action").and_then(Value::as_str).unwrap_or("");
            let tool = normalize_tool_name(label);
            let mut inputs = collect_inputs(step);

            match inputs.get(ORDER_ID) {
                Some(own) => carried = Some(own.clone()),
                None => match &carried {
                    Some(id) => {
                        inputs.insert(ORDER_ID.to_string(), id.clone());
                    }
                    None if requires_order_id(&tool) => {
                        return Err(FormatError::MissingOrderId { step: tool });
                    }
                    None => {}
                },
            }

            actions.push(ActionStep::new(tool, inputs));
        }

        let goal = match &carried {
            Some(id) => format!("Execute plan for order {}", display_value(id)),
            None => "Execute plan".to_string(),
        };
        Ok(ActionPlan::new(goal, actions))
    }
}

// ── Key helpers ──

/// Find the first non-null value whose key matches one of `spellings`,
/// ignoring ASCII case. Spellings are tried in order.
fn find_key<'a>(map: &'a Map<String, Value>, spellings: &[&str]) -> Option<&'a Value> {
    spellings.iter().find_map(|spelling| {
        map.iter()
            .find(|(key, value)| key.eq_ignore_ascii_case(spelling) && !value.is_null())
            .map(|(_, value)| value)
    })
}

/// The `ActionPlan`/`actionPlan` object of the nested shapes.
fn action_plan_object(root: &Map<String, Value>) -> Option<&Map<String, Value>> {
    find_key(root, &["actionplan"]).and_then(Value::as_object)
}

/// Fold a key for comparison: lowercase, underscores removed.
fn fold_key(key: &str) -> String {
    key.to_lowercase().replace('_', "")
}

/// Descriptive keys planners attach to steps that are never tool inputs.
pub fn is_reserved_key(key: &str) -> bool {
    matches!(
        fold_key(key).as_str(),
        "action" | "description" | "nextstep" | "nextsteps" | "step" | "stepnumber"
    )
}

fn is_order_id_key(key: &str) -> bool {
    fold_key(key) == "orderid"
}

/// Keep everything a step supplied except reserved descriptive keys.
/// Order id spellings are stored under the canonical `order_id` key.
pub fn collect_inputs(step: &Map<String, Value>) -> StepInputs {
    let mut inputs = StepInputs::new();
    for (key, value) in step {
        if is_reserved_key(key) {
            continue;
        }
        if is_order_id_key(key) {
            if !value.is_null() {
                inputs.insert(ORDER_ID.to_string(), value.clone());
            }
        } else {
            inputs.insert(key.clone(), value.clone());
        }
    }
    inputs
}

fn order_inputs(order_id: Value) -> StepInputs {
    let mut inputs = StepInputs::new();
    inputs.insert(ORDER_ID.to_string(), order_id);
    inputs
}

/// Render a JSON value for a goal line: strings unquoted, the rest as JSON.
fn display_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
