// normalizer.rs - Turns untrusted planner output into a canonical ActionPlan.
//
// The normalizer is the only way raw planner output enters the kernel:
//
// 1. Text → JSON (fenced ```json blocks are unwrapped first)
// 2. The root must be an object
// 3. Shapes are tried in priority order; the first match extracts the plan
// 4. No match → UnrecognizedFormat
//
// The normalizer never repairs or retries. A FormatError goes back to the
// caller, which decides whether to ask the planner again.

use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;

use crate::error::FormatError;
use crate::plan::ActionPlan;
use crate::shapes::{builtin_shapes, PlanShape};

static JSON_FENCE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?s)```json(.*?)```").unwrap());

/// Ordered collection of plan shapes.
pub struct PlanNormalizer {
    shapes: Vec<Box<dyn PlanShape>>,
}

impl PlanNormalizer {
    /// A normalizer with the five built-in shapes.
    pub fn new() -> Self {
        Self {
            shapes: builtin_shapes(),
        }
    }

    /// Append a custom shape. It is tried after every shape already present.
    pub fn with_shape(mut self, shape: Box<dyn PlanShape>) -> Self {
        self.shapes.push(shape);
        self
    }

    /// Names of the shapes in the order they are tried.
    pub fn shape_names(&self) -> Vec<&'static str> {
        self.shapes.iter().map(|s| s.name()).collect()
    }

    /// Normalize an already-parsed JSON value.
    pub fn normalize(&self, raw: &Value) -> Result<ActionPlan, FormatError> {
        let root = raw.as_object().ok_or_else(|| FormatError::NotAnObject {
            found: json_kind(raw).to_string(),
        })?;

        for shape in &self.shapes {
            if shape.matches(root) {
                tracing::debug!(shape = shape.name(), "plan shape matched");
                let plan = shape.extract(root)?;
                if plan.actions.is_empty() {
                    return Err(FormatError::EmptyPlan);
                }
                return Ok(plan);
            }
        }

        Err(FormatError::UnrecognizedFormat {
            plan: raw.to_string(),
        })
    }

    /// Normalize raw planner text.
    pub fn normalize_text(&self, text: &str) -> Result<ActionPlan, FormatError> {
        let raw: Value = serde_json::from_str(extract_json(text))?;
        self.normalize(&raw)
    }
}

impl Default for PlanNormalizer {
    fn default() -> Self {
        Self::new()
    }
}

/// Normalize a JSON value with the built-in shapes.
pub fn normalize(raw: &Value) -> Result<ActionPlan, FormatError> {
    PlanNormalizer::new().normalize(raw)
}

/// Normalize planner text with the built-in shapes.
pub fn normalize_text(text: &str) -> Result<ActionPlan, FormatError> {
    PlanNormalizer::new().normalize_text(text)
}

/// The body of the first ```json fence, or the whole text, trimmed.
pub fn extract_json(text: &str) -> &str {
    match JSON_FENCE.captures(text).and_then(|c| c.get(1)) {
        Some(body) => body.as_str().trim(),
        None => text.trim(),
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
