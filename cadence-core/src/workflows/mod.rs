pub mod clock;
pub mod conditions;
pub mod executor;
pub mod expressions;
pub mod loader;
pub mod schedule;
pub mod store;
pub mod types;

pub use clock::{Clock, FixedClock, SystemClock};
pub use executor::WorkflowEngine;
pub use expressions::{EvaluationOptions, ExecutionContext};
pub use loader::WorkflowLoader;
pub use store::{MemoryStore, WorkflowStore, YamlFileStore};
pub use types::{
    InputDeclaration, RunResult, StepReport, StepStatus, WorkflowDefinition, WorkflowDocument,
    WorkflowStep, WorkflowSummary,
};
