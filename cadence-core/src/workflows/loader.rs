use super::types::WorkflowDefinition;
use crate::actions::ActionRegistry;
use crate::error::{Error, Result};
use jsonschema::JSONSchema;
use serde_json::Value;
use std::path::Path;
use std::sync::OnceLock;

/// Checks raw definitions before they reach the store.
pub struct WorkflowLoader;

impl WorkflowLoader {
    fn workflow_schema() -> Result<&'static JSONSchema> {
        static SCHEMA: OnceLock<std::result::Result<JSONSchema, String>> = OnceLock::new();
        let compiled = SCHEMA.get_or_init(|| {
            let raw = include_str!("../../../docs/workflow.schema.json");
            let schema_value = serde_json::from_str::<Value>(raw)
                .map_err(|err| format!("invalid embedded workflow schema json: {err}"))?;
            JSONSchema::compile(&schema_value)
                .map_err(|err| format!("failed compiling embedded workflow schema: {err}"))
        });

        match compiled {
            Ok(schema) => Ok(schema),
            Err(err) => Err(Error::Config(err.clone())),
        }
    }

    /// Reads a definition file, YAML or JSON by extension.
    pub fn load_definition_file(path: &Path) -> Result<Value> {
        let raw = std::fs::read_to_string(path).map_err(|err| {
            Error::Config(format!(
                "failed reading workflow definition '{}': {err}",
                path.display()
            ))
        })?;
        Self::parse_definition_value(path, &raw)
    }

    pub fn parse_definition_value(path: &Path, raw: &str) -> Result<Value> {
        let ext = path
            .extension()
            .and_then(|value| value.to_str())
            .unwrap_or_default();

        if matches!(ext, "yaml" | "yml") {
            let yaml_value = serde_yaml::from_str::<serde_yaml::Value>(raw).map_err(|err| {
                Error::Config(format!(
                    "failed parsing workflow yaml '{}': {err}",
                    path.display()
                ))
            })?;
            serde_json::to_value(yaml_value).map_err(|err| {
                Error::Config(format!(
                    "failed converting workflow yaml '{}' to json: {err}",
                    path.display()
                ))
            })
        } else {
            serde_json::from_str::<Value>(raw).map_err(|err| {
                Error::Config(format!(
                    "failed parsing workflow json '{}': {err}",
                    path.display()
                ))
            })
        }
    }

    /// Validates a definition body and parses it. The structural checks run
    /// first so their messages stay stable, then the schema, then serde.
    pub fn validate(
        name: &str,
        value: &Value,
        actions: &ActionRegistry,
    ) -> Result<WorkflowDefinition> {
        let body = value.as_object().ok_or_else(|| {
            Error::Validation("Workflow definition must be a mapping".to_owned())
        })?;

        let steps = body
            .get("steps")
            .ok_or_else(|| Error::Validation("Workflow must have 'steps'".to_owned()))?;
        let steps = steps
            .as_array()
            .ok_or_else(|| Error::Validation("'steps' must be a list".to_owned()))?;

        for (index, step) in steps.iter().enumerate() {
            let action = step
                .get("action")
                .ok_or_else(|| Error::Validation(format!("Step {index} missing 'action'")))?;
            let known = action.as_str().is_some_and(|name| actions.contains(name));
            if !known {
                let shown = action
                    .as_str()
                    .map(str::to_owned)
                    .unwrap_or_else(|| action.to_string());
                return Err(Error::Validation(format!(
                    "Step {index}: Unknown action '{shown}'"
                )));
            }
        }

        Self::validate_against_schema(name, value)?;

        WorkflowDefinition::from_raw(name, value)
    }

    fn validate_against_schema(name: &str, value: &Value) -> Result<()> {
        let schema = Self::workflow_schema()?;
        if let Err(errors) = schema.validate(value) {
            let details = errors
                .map(|err| format!("{}: {}", err.instance_path, err))
                .collect::<Vec<_>>()
                .join("; ");
            return Err(Error::Validation(format!(
                "workflow '{name}' failed schema validation: {details}"
            )));
        }
        Ok(())
    }
}
