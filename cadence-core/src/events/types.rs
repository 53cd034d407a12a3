use serde::Serialize;
use serde_json::{Map, Value};

/// Progress of a single run. Every event carries the run id so observers
/// can correlate them.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum WorkflowEvent {
    RunStarted {
        run_id: String,
        workflow: String,
        steps: usize,
    },
    StepSkipped {
        run_id: String,
        step: usize,
        action: String,
        reason: String,
    },
    StepCompleted {
        run_id: String,
        step: usize,
        action: String,
        output: Map<String, Value>,
    },
    StepFailed {
        run_id: String,
        step: usize,
        action: String,
        message: String,
    },
    RunCompleted {
        run_id: String,
        workflow: String,
        steps_executed: usize,
        steps_skipped: usize,
        duration_ms: u64,
    },
}

impl WorkflowEvent {
    pub fn run_id(&self) -> &str {
        match self {
            Self::RunStarted { run_id, .. }
            | Self::StepSkipped { run_id, .. }
            | Self::StepCompleted { run_id, .. }
            | Self::StepFailed { run_id, .. }
            | Self::RunCompleted { run_id, .. } => run_id,
        }
    }

    /// True for the last event a run publishes.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::RunCompleted { .. } | Self::StepFailed { .. })
    }
}
