// tool.rs - Tool contract and registry.
//
// Tools are the real side-effecting operations (refund, inventory check,
// order verification). The kernel never implements them; the embedding
// process registers them by canonical name. A tool takes the step's inputs
// and returns a result mapping whose `status` field is the only value the
// kernel inspects.

use std::collections::HashMap;
use std::fmt;

use serde_json::{Map, Value};

use ask_plan::StepInputs;

use crate::error::ToolError;

/// Result mapping returned by a tool. Must carry a `status` field.
pub type ToolOutput = Map<String, Value>;

/// The `status` field of a tool result, if it is a string.
pub fn output_status(output: &ToolOutput) -> Option<&str> {
    output.get("status").and_then(Value::as_str)
}

/// A callable side-effecting operation.
pub trait Tool: Send + Sync {
    fn call(&self, inputs: &StepInputs) -> Result<ToolOutput, ToolError>;
}

/// Any matching closure or function is a tool.
impl<F> Tool for F
where
    F: Fn(&StepInputs) -> Result<ToolOutput, ToolError> + Send + Sync,
{
    fn call(&self, inputs: &StepInputs) -> Result<ToolOutput, ToolError> {
        self(inputs)
    }
}

/// Maps canonical tool names to tools.
#[derive(Default)]
pub struct ToolRegistry {
    tools: HashMap<String, Box<dyn Tool>>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a tool under a name. Replaces any tool already registered
    /// under that name.
    pub fn register(&mut self, name: impl Into<String>, tool: impl Tool + 'static) {
        self.tools.insert(name.into(), Box::new(tool));
    }

    /// Register a tool and return self (builder pattern).
    pub fn with_tool(mut self, name: impl Into<String>, tool: impl Tool + 'static) -> Self {
        self.register(name, tool);
        self
    }

    pub fn get(&self, name: &str) -> Option<&dyn Tool> {
        self.tools.get(name).map(|tool| tool.as_ref())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.tools.contains_key(name)
    }

    /// Registered tool names, sorted.
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.tools.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }
}

impl fmt::Debug for ToolRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ToolRegistry")
            .field("tools", &self.names())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn echo(inputs: &StepInputs) -> Result<ToolOutput, ToolError> {
        let mut output = inputs.clone();
        output.insert("status".to_string(), json!("success"));
        Ok(output)
    }

    #[test]
    fn functions_and_closures_are_tools() {
        let registry = ToolRegistry::new()
            .with_tool("echo", echo)
            .with_tool("fail", |_: &StepInputs| -> Result<ToolOutput, ToolError> {
                Err(ToolError::Failed {
                    tool: "fail".to_string(),
                    message: "boom".to_string(),
                })
            });

        let mut inputs = StepInputs::new();
        inputs.insert("order_id".to_string(), json!(1));

        let output = registry.get("echo").unwrap().call(&inputs).unwrap();
        assert_eq!(output_status(&output), Some("success"));
        assert_eq!(output.get("order_id"), Some(&json!(1)));

        let err = registry.get("fail").unwrap().call(&inputs).unwrap_err();
        assert!(err.to_string().contains("boom"));
    }

    #[test]
    fn register_replaces_existing_tool() {
        let mut registry = ToolRegistry::new();
        registry.register("echo", echo);
        registry.register("echo", |_: &StepInputs| -> Result<ToolOutput, ToolError> {
            Ok(ToolOutput::new())
        });

        assert_eq!(registry.len(), 1);
        let output = registry.get("echo").unwrap().call(&StepInputs::new()).unwrap();
        assert_eq!(output_status(&output), None);
    }

    #[test]
    fn names_are_sorted() {
        let registry = ToolRegistry::new()
            .with_tool("verify_order", echo)
            .with_tool("check_inventory", echo);
        assert_eq!(registry.names(), vec!["check_inventory", "verify_order"]);
        assert!(registry.contains("verify_order"));
        assert!(!registry.contains("refund_order"));
        assert!(format!("{:?}", registry).contains("check_inventory"));
    }

    #[test]
    fn non_string_status_is_not_a_status() {
        let mut output = ToolOutput::new();
        output.insert("status".to_string(), json!(200));
        assert_eq!(output_status(&output), None);
    }
}
