use std::sync::Arc;
use std::time::{Duration, Instant};

use serde_json::{Map, Value};
use tracing::{debug, info, warn};
use uuid::Uuid;

use super::clock::{Clock, SystemClock};
use super::conditions::evaluate_condition;
use super::expressions::{EvaluationOptions, Evaluator, ExecutionContext};
use super::loader::WorkflowLoader;
use super::schedule::Schedule;
use super::store::WorkflowStore;
use super::types::{
    RunResult, StepReport, StepStatus, WorkflowDefinition, WorkflowStep, WorkflowSummary,
};
use crate::actions::ActionRegistry;
use crate::error::{Error, Result};
use crate::events::types::WorkflowEvent;
use crate::events::EventBus;

const CONDITION_NOT_MET: &str = "condition not met";

/// Runs stored workflows against a fixed set of actions.
///
/// The engine keeps no per-run state, so one instance can serve concurrent
/// runs from different threads.
#[derive(Clone)]
pub struct WorkflowEngine {
    actions: Arc<ActionRegistry>,
    store: Arc<dyn WorkflowStore>,
    clock: Arc<dyn Clock>,
    events: Option<EventBus>,
    expression_options: EvaluationOptions,
}

impl WorkflowEngine {
    pub fn new(actions: Arc<ActionRegistry>, store: Arc<dyn WorkflowStore>) -> Self {
        Self {
            actions,
            store,
            clock: Arc::new(SystemClock),
            events: None,
            expression_options: EvaluationOptions::default(),
        }
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn with_events(mut self, events: EventBus) -> Self {
        self.events = Some(events);
        self
    }

    pub fn with_expression_options(mut self, options: EvaluationOptions) -> Self {
        self.expression_options = options;
        self
    }

    pub fn actions(&self) -> &ActionRegistry {
        &self.actions
    }

    pub fn list(&self) -> Result<Vec<WorkflowSummary>> {
        Ok(self.store.load()?.summaries())
    }

    /// A stored body that no longer parses is a validation error naming it.
    pub fn get(&self, name: &str) -> Result<Option<WorkflowDefinition>> {
        self.store.load()?.definition(name)
    }

    /// Validates `body` and stores it verbatim under `name`, replacing any
    /// workflow already stored there. Nothing is written if validation fails.
    pub fn create_or_update(&self, name: &str, body: Value) -> Result<WorkflowDefinition> {
        let definition = WorkflowLoader::validate(name, &body, &self.actions)?;

        let mut document = self.store.load()?;
        let replaced = document.insert(name, body);
        self.store.save(&document)?;

        info!(
            workflow = name,
            steps = definition.steps.len(),
            replaced,
            "workflow saved"
        );
        Ok(definition)
    }

    pub fn delete(&self, name: &str) -> Result<bool> {
        let mut document = self.store.load()?;
        if !document.remove(name) {
            return Ok(false);
        }
        self.store.save(&document)?;
        info!(workflow = name, "workflow deleted");
        Ok(true)
    }

    /// Runs every step of `name` in order. The first failing action aborts
    /// the run; effects of earlier steps are kept.
    pub fn run(&self, name: &str, inputs: Map<String, Value>) -> Result<RunResult> {
        let definition = self
            .get(name)?
            .ok_or_else(|| Error::NotFound(format!("workflow '{name}' not found")))?;
        let input = resolve_inputs(&definition, inputs)?;

        let run_id = Uuid::new_v4().to_string();
        let started_at = Instant::now();
        info!(
            run_id = %run_id,
            workflow = name,
            steps = definition.steps.len(),
            "workflow run started"
        );
        self.publish(WorkflowEvent::RunStarted {
            run_id: run_id.clone(),
            workflow: name.to_owned(),
            steps: definition.steps.len(),
        });

        let mut context = ExecutionContext::new(input);
        let mut results = Vec::with_capacity(definition.steps.len());

        for (index, step) in definition.steps.iter().enumerate() {
            if let Some(reason) = self.skip_reason(&run_id, index, step, &context) {
                debug!(run_id = %run_id, step = index, action = %step.action, %reason, "step skipped");
                context.push_skipped();
                self.publish(WorkflowEvent::StepSkipped {
                    run_id: run_id.clone(),
                    step: index,
                    action: step.action.clone(),
                    reason: reason.clone(),
                });
                results.push(StepReport {
                    step: index,
                    action: step.action.clone(),
                    status: StepStatus::Skipped { reason },
                });
                continue;
            }

            if let Some(delay) = step.delay.filter(|seconds| *seconds > 0.0) {
                if let Ok(duration) = Duration::try_from_secs_f64(delay) {
                    debug!(run_id = %run_id, step = index, seconds = delay, "delaying step");
                    std::thread::sleep(duration);
                }
            }

            let output = match self.invoke_step(index, step, &context) {
                Ok(output) => output,
                Err(err) => {
                    warn!(run_id = %run_id, step = index, action = %step.action, error = %err, "workflow run aborted");
                    self.publish(WorkflowEvent::StepFailed {
                        run_id: run_id.clone(),
                        step: index,
                        action: step.action.clone(),
                        message: err.to_string(),
                    });
                    return Err(err);
                }
            };

            debug!(run_id = %run_id, step = index, action = %step.action, "step completed");
            context.push_outcome(output.clone());
            self.publish(WorkflowEvent::StepCompleted {
                run_id: run_id.clone(),
                step: index,
                action: step.action.clone(),
                output: output.clone(),
            });
            results.push(StepReport {
                step: index,
                action: step.action.clone(),
                status: StepStatus::Ok { output },
            });
        }

        let steps_executed = results.iter().filter(|report| report.is_ok()).count();
        let steps_skipped = results.iter().filter(|report| report.is_skipped()).count();
        let duration_ms = u64::try_from(started_at.elapsed().as_millis()).unwrap_or(u64::MAX);

        info!(
            run_id = %run_id,
            workflow = name,
            steps_executed,
            steps_skipped,
            duration_ms,
            "workflow run completed"
        );
        self.publish(WorkflowEvent::RunCompleted {
            run_id: run_id.clone(),
            workflow: name.to_owned(),
            steps_executed,
            steps_skipped,
            duration_ms,
        });

        Ok(RunResult {
            run_id,
            workflow: name.to_owned(),
            steps_executed,
            steps_skipped,
            results,
            duration_ms,
        })
    }

    /// The schedule gate runs first; the `if` condition only when the gate
    /// admits the step.
    fn skip_reason(
        &self,
        run_id: &str,
        index: usize,
        step: &WorkflowStep,
        context: &ExecutionContext,
    ) -> Option<String> {
        let now = self.clock.now();
        if let Some(reason) = Schedule::for_step(step).check(now) {
            return Some(reason);
        }

        let condition = step.condition.as_deref().filter(|text| !text.is_empty())?;
        let evaluator = self.evaluator(context);
        let admitted = evaluate_condition(condition, &evaluator).unwrap_or_else(|err| {
            warn!(run_id, step = index, condition, error = %err, "condition evaluation failed");
            false
        });
        (!admitted).then(|| CONDITION_NOT_MET.to_owned())
    }

    fn invoke_step(
        &self,
        index: usize,
        step: &WorkflowStep,
        context: &ExecutionContext,
    ) -> Result<Map<String, Value>> {
        let params = self.evaluator(context).substitute_map(&step.params);

        let action = self.actions.get(&step.action).ok_or_else(|| {
            Error::Validation(format!("Step {index}: Unknown action '{}'", step.action))
        })?;

        let output = action
            .invoke(&params)
            .map_err(|err| Error::StepExecution {
                step: index,
                action: step.action.clone(),
                message: err.to_string(),
            })?;
        Ok(normalize_output(output))
    }

    fn evaluator<'a>(&'a self, context: &'a ExecutionContext) -> Evaluator<'a> {
        Evaluator::new(context, self.clock.as_ref()).with_options(self.expression_options)
    }

    fn publish(&self, event: WorkflowEvent) {
        if let Some(events) = &self.events {
            events.publish(event);
        }
    }
}

/// Declared inputs first (supplied value, then default), then any extra
/// supplied inputs in the order given.
fn resolve_inputs(
    definition: &WorkflowDefinition,
    mut supplied: Map<String, Value>,
) -> Result<Map<String, Value>> {
    let mut resolved = Map::new();

    for declaration in &definition.inputs {
        if let Some(value) = supplied.remove(&declaration.name) {
            resolved.insert(declaration.name.clone(), value);
        } else if let Some(default) = &declaration.default {
            resolved.insert(declaration.name.clone(), default.clone());
        } else if declaration.required {
            return Err(Error::MissingInput(declaration.name.clone()));
        }
    }

    for (key, value) in supplied {
        resolved.entry(key).or_insert(value);
    }
    Ok(resolved)
}

fn normalize_output(output: Value) -> Map<String, Value> {
    let mut record = match output {
        Value::String(message) => {
            let mut record = Map::new();
            record.insert("message".to_owned(), Value::String(message));
            record
        }
        Value::Object(fields) => fields,
        other => {
            let mut record = Map::new();
            record.insert("result".to_owned(), other);
            record
        }
    };
    record.insert("success".to_owned(), Value::Bool(true));
    record
}
