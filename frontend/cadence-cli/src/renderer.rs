use crate::cli::OutputFormat;
use cadence_core::workflows::{RunResult, StepStatus, WorkflowDefinition, WorkflowSummary};
use cadence_core::WorkflowEvent;
use serde::Serialize;
use std::io::Write;

#[derive(Debug, Clone, Copy)]
pub struct Renderer {
    output_format: OutputFormat,
}

impl Renderer {
    pub fn new(output_format: OutputFormat) -> Self {
        Self { output_format }
    }

    pub fn output_format(&self) -> OutputFormat {
        self.output_format
    }

    pub fn render_event(&self, event: &WorkflowEvent) {
        match self.output_format {
            OutputFormat::Text => Self::render_event_text(event),
            OutputFormat::Json => Self::print_json_line(event),
        }
        std::io::stdout().flush().ok();
    }

    fn render_event_text(event: &WorkflowEvent) {
        match event {
            WorkflowEvent::RunStarted {
                run_id,
                workflow,
                steps,
            } => println!("[run {run_id}] {workflow}: {steps} steps"),
            WorkflowEvent::StepSkipped {
                step,
                action,
                reason,
                ..
            } => println!("[step {step}] {action} skipped: {reason}"),
            WorkflowEvent::StepCompleted { step, action, .. } => {
                println!("[step {step}] {action} ok")
            }
            WorkflowEvent::StepFailed {
                step,
                action,
                message,
                ..
            } => println!("[step {step}] {action} FAILED: {message}"),
            WorkflowEvent::RunCompleted { duration_ms, .. } => {
                println!("[run] finished in {duration_ms} ms")
            }
        }
    }

    pub fn render_summaries(&self, summaries: &[WorkflowSummary]) {
        if self.output_format == OutputFormat::Json {
            return Self::print_json(summaries);
        }
        if summaries.is_empty() {
            println!("No workflows.");
            return;
        }
        for summary in summaries {
            let inputs = summary
                .inputs
                .iter()
                .map(|input| {
                    if input.required {
                        format!("{}*", input.name)
                    } else {
                        input.name.clone()
                    }
                })
                .collect::<Vec<_>>()
                .join(", ");
            println!(
                "{}\t{} steps\t[{}]\t{}",
                summary.name, summary.steps_count, inputs, summary.description
            );
        }
    }

    pub fn render_definition(&self, definition: &WorkflowDefinition) {
        match self.output_format {
            OutputFormat::Json => Self::print_json(definition),
            OutputFormat::Text => match serde_yaml::to_string(definition) {
                Ok(yaml) => {
                    println!("# {}", definition.name);
                    print!("{yaml}");
                }
                Err(err) => eprintln!("failed rendering workflow: {err}"),
            },
        }
    }

    pub fn render_run(&self, result: &RunResult) {
        if self.output_format == OutputFormat::Json {
            return Self::print_json(result);
        }
        for report in &result.results {
            match &report.status {
                StepStatus::Ok { output } => println!(
                    "[{}] {} ok {}",
                    report.step,
                    report.action,
                    serde_json::to_string(output).unwrap_or_else(|_| "<invalid output>".to_owned())
                ),
                StepStatus::Skipped { reason } => {
                    println!("[{}] {} skipped: {reason}", report.step, report.action)
                }
            }
        }
        println!(
            "{}: {} executed, {} skipped in {} ms",
            result.workflow, result.steps_executed, result.steps_skipped, result.duration_ms
        );
    }

    pub fn render_names(&self, names: &[String]) {
        match self.output_format {
            OutputFormat::Json => Self::print_json(names),
            OutputFormat::Text => names.iter().for_each(|name| println!("{name}")),
        }
    }

    pub fn render_message(&self, message: &str) {
        match self.output_format {
            OutputFormat::Json => Self::print_json(&serde_json::json!({"message": message})),
            OutputFormat::Text => println!("{message}"),
        }
    }

    fn print_json<T: Serialize + ?Sized>(value: &T) {
        match serde_json::to_string_pretty(value) {
            Ok(text) => println!("{text}"),
            Err(err) => eprintln!("failed rendering json: {err}"),
        }
    }

    fn print_json_line<T: Serialize + ?Sized>(value: &T) {
        match serde_json::to_string(value) {
            Ok(text) => println!("{text}"),
            Err(err) => eprintln!("failed rendering json: {err}"),
        }
    }
}
