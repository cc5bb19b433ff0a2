// engine.rs - Guarded execution of canonical plans.
//
// The engine is a small state machine:
//
//   check_plan ──block──▶ fallback ─▶ BLOCKED
//       │
//       ▼  for each action
//   check_step ──block──▶ fallback ─▶ BLOCKED
//       │
//       ▼
//   invoke tool ──not success──▶ fallback ─▶ FAILED
//       │
//       ▼  (refund tool succeeded → world[refund_flag] = true)
//   next action ... ─▶ SUCCESS
//
// Law violations and step failures are values, matched here. Nothing
// propagates past `execute` except through the returned result.

use chrono::Utc;
use serde_json::Value;
use uuid::Uuid;

use ask_law::{Decision, LegalityChecker, WorldState};
use ask_plan::{ActionPlan, ActionStep, PlanNormalizer};

use crate::config::{EngineOptions, KernelConfig};
use crate::error::EngineError;
use crate::result::{
    ExecutionResult, ExecutionStatus, FallbackFailure, FallbackReport, StepOutcome, StepRecord,
};
use crate::tool::{output_status, ToolOutput, ToolRegistry};

/// Result of calling one tool.
enum Invocation {
    /// The tool reported the success status.
    Completed(ToolOutput),
    /// The tool was missing, errored, or reported another status.
    Failed {
        reason: String,
        output: Option<ToolOutput>,
    },
}

/// Drives plans through the legality checker and the tool registry.
pub struct ExecutionEngine {
    checker: LegalityChecker,
    tools: ToolRegistry,
    normalizer: PlanNormalizer,
    options: EngineOptions,
}

impl ExecutionEngine {
    pub fn new(checker: LegalityChecker, tools: ToolRegistry) -> Self {
        Self {
            checker,
            tools,
            normalizer: PlanNormalizer::new(),
            options: EngineOptions::default(),
        }
    }

    /// Replace the engine conventions (builder pattern).
    pub fn with_options(mut self, options: EngineOptions) -> Self {
        self.options = options;
        self
    }

    /// Replace the normalizer used by `execute_raw` and `execute_text`.
    pub fn with_normalizer(mut self, normalizer: PlanNormalizer) -> Self {
        self.normalizer = normalizer;
        self
    }

    /// Build an engine from configuration: compile its laws and adopt its
    /// engine options.
    pub fn from_config(config: &KernelConfig, tools: ToolRegistry) -> Result<Self, EngineError> {
        let book = config.compile_laws()?;
        tracing::info!(laws = book.len(), tools = tools.len(), "execution engine configured");
        Ok(Self::new(LegalityChecker::new(book), tools).with_options(config.engine.clone()))
    }

    pub fn checker(&self) -> &LegalityChecker {
        &self.checker
    }

    /// Mutable access for adding laws. No execution can be in flight while
    /// this borrow is held.
    pub fn checker_mut(&mut self) -> &mut LegalityChecker {
        &mut self.checker
    }

    pub fn tools(&self) -> &ToolRegistry {
        &self.tools
    }

    pub fn tools_mut(&mut self) -> &mut ToolRegistry {
        &mut self.tools
    }

    pub fn options(&self) -> &EngineOptions {
        &self.options
    }

    /// Execute a canonical plan against a world state.
    ///
    /// The world state is mutated in place and a snapshot is returned in
    /// the result. The refund flag is the only field the engine writes.
    pub fn execute(&self, plan: &ActionPlan, world: &mut WorldState) -> ExecutionResult {
        let started_at = Utc::now();
        let execution_id = Uuid::new_v4();
        tracing::info!(
            %execution_id,
            goal = %plan.goal,
            actions = plan.actions.len(),
            "executing plan"
        );

        let mut steps = Vec::with_capacity(plan.actions.len());

        let (status, reason, fallback) = match self.checker.check_plan(plan, world) {
            Decision::Block { reason, .. } => {
                let report = self.run_fallback(plan);
                (ExecutionStatus::Blocked, Some(reason), Some(report))
            }
            Decision::Allow => match self.run_actions(plan, world, &mut steps) {
                None => (ExecutionStatus::Success, None, None),
                Some((status, reason)) => {
                    let report = self.run_fallback(plan);
                    (status, Some(reason), Some(report))
                }
            },
        };

        tracing::info!(%execution_id, %status, "plan finished");

        ExecutionResult {
            execution_id,
            status,
            reason,
            world_state: world.clone(),
            steps,
            fallback,
            started_at,
            finished_at: Utc::now(),
        }
    }

    /// Normalize a raw planner value, then execute it.
    pub fn execute_raw(
        &self,
        raw: &Value,
        world: &mut WorldState,
    ) -> Result<ExecutionResult, EngineError> {
        let plan = self.normalizer.normalize(raw)?;
        Ok(self.execute(&plan, world))
    }

    /// Normalize raw planner text, then execute it.
    pub fn execute_text(
        &self,
        text: &str,
        world: &mut WorldState,
    ) -> Result<ExecutionResult, EngineError> {
        let plan = self.normalizer.normalize_text(text)?;
        Ok(self.execute(&plan, world))
    }

    /// Run every action in order. Returns the terminal status and reason
    /// when a step is blocked or fails, `None` when all steps succeed.
    fn run_actions(
        &self,
        plan: &ActionPlan,
        world: &mut WorldState,
        records: &mut Vec<StepRecord>,
    ) -> Option<(ExecutionStatus, String)> {
        for (index, step) in plan.actions.iter().enumerate() {
            if let Decision::Block { law_id, reason, .. } = self.checker.check_step(step, world) {
                records.push(StepRecord {
                    index,
                    tool: step.tool.clone(),
                    outcome: StepOutcome::Blocked {
                        law_id,
                        reason: reason.clone(),
                    },
                    output: None,
                });
                return Some((ExecutionStatus::Blocked, reason));
            }

            tracing::debug!(index, tool = %step.tool, "invoking step");
            match self.invoke(step) {
                Invocation::Completed(output) => {
                    if step.tool == self.options.refund_tool {
                        world.set(self.options.refund_flag.clone(), true);
                    }
                    records.push(StepRecord {
                        index,
                        tool: step.tool.clone(),
                        outcome: StepOutcome::Succeeded,
                        output: Some(output),
                    });
                }
                Invocation::Failed { reason, output } => {
                    tracing::warn!(index, tool = %step.tool, "step failed: {}", reason);
                    records.push(StepRecord {
                        index,
                        tool: step.tool.clone(),
                        outcome: StepOutcome::Failed {
                            reason: reason.clone(),
                        },
                        output,
                    });
                    return Some((ExecutionStatus::Failed, reason));
                }
            }
        }
        None
    }

    /// Run the fallback sequence without legality checks. Every step runs;
    /// failures are collected, not raised.
    fn run_fallback(&self, plan: &ActionPlan) -> FallbackReport {
        let mut report = FallbackReport::default();
        if plan.fallback.is_empty() {
            return report;
        }
        tracing::info!(steps = plan.fallback.len(), "running fallback");

        for (index, step) in plan.fallback.iter().enumerate() {
            report.steps_run += 1;
            if let Invocation::Failed { reason, .. } = self.invoke(step) {
                tracing::warn!(index, tool = %step.tool, "fallback step failed: {}", reason);
                report.failures.push(FallbackFailure {
                    index,
                    tool: step.tool.clone(),
                    reason,
                });
            }
        }
        report
    }

    fn invoke(&self, step: &ActionStep) -> Invocation {
        let Some(tool) = self.tools.get(&step.tool) else {
            return Invocation::Failed {
                reason: format!("unknown tool '{}'", step.tool),
                output: None,
            };
        };

        match tool.call(&step.input_schema) {
            Ok(output) => match output_status(&output) {
                Some(status) if status == self.options.success_status => {
                    Invocation::Completed(output)
                }
                status => {
                    let reason = format!(
                        "tool '{}' returned status '{}'",
                        step.tool,
                        status.unwrap_or("<missing>")
                    );
                    Invocation::Failed {
                        reason,
                        output: Some(output),
                    }
                }
            },
            Err(err) => Invocation::Failed {
                reason: err.to_string(),
                output: None,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ToolError;
    use ask_law::compile_law;
    use ask_plan::StepInputs;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    const INVENTORY_LAW: &str =
        r#"LAW { when inventory > 0 block refund_order because "Check inventory first" }"#;

    fn status(value: &str) -> ToolOutput {
        let mut output = ToolOutput::new();
        output.insert("status".to_string(), json!(value));
        output
    }

    fn succeed(_: &StepInputs) -> Result<ToolOutput, ToolError> {
        Ok(status("success"))
    }

    fn step(tool: &str) -> ActionStep {
        let mut inputs = StepInputs::new();
        inputs.insert("order_id".to_string(), json!(1));
        ActionStep::new(tool, inputs)
    }

    fn engine(laws: &[&str], tools: ToolRegistry) -> ExecutionEngine {
        let checker = LegalityChecker::new(laws.iter().map(|t| compile_law(t).unwrap()).collect());
        ExecutionEngine::new(checker, tools)
    }

    fn standard_tools() -> ToolRegistry {
        ToolRegistry::new()
            .with_tool("refund_order", succeed)
            .with_tool("check_inventory", succeed)
            .with_tool("verify_order", succeed)
    }

    fn world(value: serde_json::Value) -> WorldState {
        WorldState::from(value.as_object().cloned().unwrap())
    }

    /// A tool that counts how often it ran.
    fn counting(counter: Arc<AtomicUsize>) -> impl Fn(&StepInputs) -> Result<ToolOutput, ToolError> {
        move |_: &StepInputs| {
            counter.fetch_add(1, Ordering::SeqCst);
            Ok(status("success"))
        }
    }

    #[test]
    fn all_steps_succeed() {
        let engine = engine(&[INVENTORY_LAW], standard_tools());
        let plan = ActionPlan::new("verify", vec![step("verify_order"), step("check_inventory")]);
        let mut state = world(json!({"inventory": 0}));

        let result = engine.execute(&plan, &mut state);
        assert_eq!(result.status, ExecutionStatus::Success);
        assert!(result.reason.is_none());
        assert!(result.fallback.is_none());
        assert_eq!(result.steps.len(), 2);
        assert!(result.finished_at >= result.started_at);
    }

    #[test]
    fn refund_success_sets_flag() {
        let engine = engine(&[INVENTORY_LAW], standard_tools());
        let plan = ActionPlan::new("refund", vec![step("refund_order")]);
        let mut state = world(json!({"inventory": 0}));

        let result = engine.execute(&plan, &mut state);
        assert!(result.is_success());
        assert_eq!(state.get("refund_done"), Some(&json!(true)));
        assert_eq!(result.world_state.get("refund_done"), Some(&json!(true)));
    }

    #[test]
    fn plan_block_skips_actions_and_runs_fallback() {
        let refunds = Arc::new(AtomicUsize::new(0));
        let notices = Arc::new(AtomicUsize::new(0));
        let tools = ToolRegistry::new()
            .with_tool("refund_order", counting(refunds.clone()))
            .with_tool("notify_customer", counting(notices.clone()));
        let engine = engine(&[INVENTORY_LAW], tools);
        let plan = ActionPlan::new("refund", vec![step("refund_order")])
            .with_fallback(vec![step("notify_customer")]);
        let mut state = world(json!({"inventory": 10}));

        let result = engine.execute(&plan, &mut state);
        assert_eq!(result.status, ExecutionStatus::Blocked);
        assert_eq!(result.reason.as_deref(), Some("Check inventory first"));
        assert!(result.steps.is_empty());
        assert_eq!(refunds.load(Ordering::SeqCst), 0);
        assert_eq!(notices.load(Ordering::SeqCst), 1);
        assert!(state.get("refund_done").is_none());
        assert_eq!(result.fallback.unwrap().steps_run, 1);
    }

    #[test]
    fn step_block_after_earlier_steps() {
        let engine = engine(&[INVENTORY_LAW], standard_tools());
        let plan = ActionPlan::new("refund", vec![step("check_inventory"), step("refund_order")]);
        let mut state = world(json!({"inventory": 10}));

        let result = engine.execute(&plan, &mut state);
        assert_eq!(result.status, ExecutionStatus::Blocked);
        assert_eq!(result.steps.len(), 2);
        assert_eq!(result.steps[0].outcome, StepOutcome::Succeeded);
        match &result.steps[1].outcome {
            StepOutcome::Blocked { reason, law_id } => {
                assert_eq!(reason, "Check inventory first");
                assert_eq!(law_id.len(), 8);
            }
            other => panic!("expected Blocked, got {:?}", other),
        }
        assert!(state.get("refund_done").is_none());
    }

    #[test]
    fn non_success_status_fails_the_plan() {
        let tools = standard_tools().with_tool(
            "verify_order",
            |_: &StepInputs| -> Result<ToolOutput, ToolError> { Ok(status("invalid")) },
        );
        let engine = engine(&[], tools);
        let plan = ActionPlan::new("verify", vec![step("verify_order"), step("refund_order")]);
        let mut state = WorldState::new();

        let result = engine.execute(&plan, &mut state);
        assert_eq!(result.status, ExecutionStatus::Failed);
        assert_eq!(result.steps.len(), 1);
        assert!(result.reason.unwrap().contains("invalid"));
        assert!(result.steps[0].output.is_some());
        assert!(state.get("refund_done").is_none());
    }

    #[test]
    fn failed_refund_does_not_set_flag() {
        let tools = ToolRegistry::new().with_tool(
            "refund_order",
            |_: &StepInputs| -> Result<ToolOutput, ToolError> { Ok(status("error")) },
        );
        let engine = engine(&[], tools);
        let mut state = WorldState::new();

        let result = engine.execute(&ActionPlan::new("refund", vec![step("refund_order")]), &mut state);
        assert_eq!(result.status, ExecutionStatus::Failed);
        assert!(state.get("refund_done").is_none());
    }

    #[test]
    fn missing_status_is_a_failure() {
        let tools = ToolRegistry::new().with_tool(
            "verify_order",
            |_: &StepInputs| -> Result<ToolOutput, ToolError> { Ok(ToolOutput::new()) },
        );
        let engine = engine(&[], tools);
        let result = engine.execute(
            &ActionPlan::new("verify", vec![step("verify_order")]),
            &mut WorldState::new(),
        );
        assert_eq!(result.status, ExecutionStatus::Failed);
        assert!(result.reason.unwrap().contains("<missing>"));
    }

    #[test]
    fn unknown_tool_fails_the_plan() {
        let engine = engine(&[], ToolRegistry::new());
        let result = engine.execute(
            &ActionPlan::new("mystery", vec![step("unknown_action")]),
            &mut WorldState::new(),
        );
        assert_eq!(result.status, ExecutionStatus::Failed);
        assert_eq!(result.reason.as_deref(), Some("unknown tool 'unknown_action'"));
    }

    #[test]
    fn tool_error_fails_the_plan() {
        let tools = ToolRegistry::new().with_tool(
            "verify_order",
            |_: &StepInputs| -> Result<ToolOutput, ToolError> {
                Err(ToolError::InvalidInput {
                    tool: "verify_order".to_string(),
                    parameter: "order_id".to_string(),
                })
            },
        );
        let engine = engine(&[], tools);
        let result = engine.execute(
            &ActionPlan::new("verify", vec![step("verify_order")]),
            &mut WorldState::new(),
        );
        assert_eq!(result.status, ExecutionStatus::Failed);
        assert!(result.reason.unwrap().contains("order_id"));
    }

    #[test]
    fn fallback_failures_are_reported_and_do_not_stop_fallback() {
        let notices = Arc::new(AtomicUsize::new(0));
        let tools = ToolRegistry::new().with_tool("notify_customer", counting(notices.clone()));
        let engine = engine(&[INVENTORY_LAW], tools);
        let plan = ActionPlan::new("refund", vec![step("refund_order")])
            .with_fallback(vec![step("escalate"), step("notify_customer")]);

        let result = engine.execute(&plan, &mut world(json!({"inventory": 3})));
        assert_eq!(result.status, ExecutionStatus::Blocked);
        assert!(result.fallback_failed());

        let report = result.fallback.unwrap();
        assert_eq!(report.steps_run, 2);
        assert_eq!(
            report.failures,
            vec![FallbackFailure {
                index: 0,
                tool: "escalate".to_string(),
                reason: "unknown tool 'escalate'".to_string(),
            }]
        );
        assert_eq!(notices.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn fallback_is_not_legality_checked() {
        let refunds = Arc::new(AtomicUsize::new(0));
        let tools = ToolRegistry::new().with_tool("refund_order", counting(refunds.clone()));
        let engine = engine(&[INVENTORY_LAW], tools);
        let plan = ActionPlan::new("refund", vec![step("refund_order")])
            .with_fallback(vec![step("refund_order")]);
        let mut state = world(json!({"inventory": 3}));

        let result = engine.execute(&plan, &mut state);
        assert_eq!(result.status, ExecutionStatus::Blocked);
        assert_eq!(refunds.load(Ordering::SeqCst), 1);
        // Refund effect applies to action steps only.
        assert!(state.get("refund_done").is_none());
    }

    #[test]
    fn refund_flag_blocks_a_second_refund() {
        let engine = engine(
            &[r#"LAW { when refund_done == true block refund_order because "Already refunded" }"#],
            standard_tools(),
        );
        let plan = ActionPlan::new("refund", vec![step("refund_order")]);
        let mut state = WorldState::new();

        assert!(engine.execute(&plan, &mut state).is_success());
        let second = engine.execute(&plan, &mut state);
        assert_eq!(second.status, ExecutionStatus::Blocked);
        assert_eq!(second.reason.as_deref(), Some("Already refunded"));
    }

    #[test]
    fn custom_options_change_conventions() {
        let tools = ToolRegistry::new().with_tool(
            "issue_credit",
            |_: &StepInputs| -> Result<ToolOutput, ToolError> { Ok(status("ok")) },
        );
        let engine = engine(&[], tools).with_options(EngineOptions {
            refund_tool: "issue_credit".to_string(),
            refund_flag: "credited".to_string(),
            success_status: "ok".to_string(),
        });
        let mut state = WorldState::new();

        let result = engine.execute(&ActionPlan::new("credit", vec![step("issue_credit")]), &mut state);
        assert!(result.is_success());
        assert_eq!(state.get("credited"), Some(&json!(true)));
        assert!(state.get("refund_done").is_none());
    }

    #[test]
    fn execute_raw_normalizes_first() {
        let engine = engine(&[], standard_tools());
        let mut state = WorldState::new();
        let raw = json!({"plan": [{"action": "Refund the order", "order_id": 12}]});

        let result = engine.execute_raw(&raw, &mut state).unwrap();
        assert!(result.is_success());
        assert_eq!(result.steps[0].tool, "refund_order");
        assert_eq!(state.get("refund_done"), Some(&json!(true)));
    }

    #[test]
    fn execute_raw_surfaces_format_errors() {
        let engine = engine(&[], standard_tools());
        match engine.execute_raw(&json!({"plan": []}), &mut WorldState::new()) {
            Err(EngineError::Plan(_)) => {}
            other => panic!("expected Plan error, got {:?}", other),
        }
    }

    #[test]
    fn execute_text_accepts_fenced_json() {
        let engine = engine(&[], standard_tools());
        let text = "Here you go:\n```json\n{\"actions\": [{\"tool\": \"verify_order\", \"inputs\": {\"order_id\": 4}}]}\n```";

        let result = engine.execute_text(text, &mut WorldState::new()).unwrap();
        assert!(result.is_success());
        assert_eq!(result.steps[0].tool, "verify_order");
    }

    #[test]
    fn from_config_compiles_laws_and_options() {
        let config = KernelConfig::from_toml_str(&format!(
            "laws = [{:?}]\n[engine]\nrefund_flag = \"refunded\"\n",
            INVENTORY_LAW
        ))
        .unwrap();
        let engine = ExecutionEngine::from_config(&config, standard_tools()).unwrap();

        assert_eq!(engine.checker().book().len(), 1);
        assert_eq!(engine.options().refund_flag, "refunded");
        assert_eq!(engine.tools().len(), 3);

        let mut state = world(json!({"inventory": 0}));
        engine.execute(&ActionPlan::new("refund", vec![step("refund_order")]), &mut state);
        assert_eq!(state.get("refunded"), Some(&json!(true)));
    }

    #[test]
    fn laws_added_through_checker_mut_apply() {
        let mut engine = engine(&[], standard_tools());
        let plan = ActionPlan::new("refund", vec![step("refund_order")]);

        engine.checker_mut().add_law(compile_law(INVENTORY_LAW).unwrap());
        engine.tools_mut().register("notify_customer", succeed);

        let result = engine.execute(&plan, &mut world(json!({"inventory": 1})));
        assert_eq!(result.status, ExecutionStatus::Blocked);
        assert!(engine.tools().contains("notify_customer"));
    }

    #[test]
    fn execution_ids_are_unique() {
        let engine = engine(&[], standard_tools());
        let plan = ActionPlan::new("verify", vec![step("verify_order")]);
        let a = engine.execute(&plan, &mut WorldState::new());
        let b = engine.execute(&plan, &mut WorldState::new());
        assert_ne!(a.execution_id, b.execution_id);
    }
}
