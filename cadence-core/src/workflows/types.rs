use indexmap::IndexMap;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

use crate::error::{Error, Result};

/// The persisted document: every workflow keyed by name, in file order.
///
/// Bodies stay raw until asked for, so one hand-broken entry cannot hide
/// the others. Keys the engine does not know are carried through a save.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct WorkflowDocument {
    #[serde(default, deserialize_with = "null_as_empty")]
    pub workflows: IndexMap<String, Value>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl WorkflowDocument {
    pub fn contains(&self, name: &str) -> bool {
        self.workflows.contains_key(name)
    }

    /// Parses the body stored under `name`. A body that does not parse is a
    /// validation error naming the workflow.
    pub fn definition(&self, name: &str) -> Result<Option<WorkflowDefinition>> {
        self.workflows
            .get(name)
            .map(|body| WorkflowDefinition::from_raw(name, body))
            .transpose()
    }

    /// Stores `body` under `name`; returns whether an entry was replaced.
    /// A replaced entry keeps its position.
    pub fn insert(&mut self, name: impl Into<String>, body: Value) -> bool {
        self.workflows.insert(name.into(), body).is_some()
    }

    pub fn remove(&mut self, name: &str) -> bool {
        self.workflows.shift_remove(name).is_some()
    }

    pub fn summaries(&self) -> Vec<WorkflowSummary> {
        self.workflows
            .iter()
            .map(|(name, body)| WorkflowSummary::from_raw(name, body))
            .collect()
    }
}

// `workflows:` with nothing under it is an empty mapping.
fn null_as_empty<'de, D>(deserializer: D) -> std::result::Result<IndexMap<String, Value>, D::Error>
where
    D: Deserializer<'de>,
{
    Option::<IndexMap<String, Value>>::deserialize(deserializer).map(Option::unwrap_or_default)
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct WorkflowDefinition {
    /// Filled from the document key; never written into the body.
    #[serde(skip)]
    pub name: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub description: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub inputs: Vec<InputDeclaration>,
    pub steps: Vec<WorkflowStep>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl WorkflowDefinition {
    pub fn from_raw(name: &str, body: &Value) -> Result<Self> {
        serde_json::from_value::<Self>(body.clone())
            .map(|definition| definition.with_name(name))
            .map_err(|err| Error::Validation(format!("workflow '{name}' is malformed: {err}")))
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(from = "RawInputDeclaration")]
pub struct InputDeclaration {
    pub name: String,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub required: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<Value>,
}

impl InputDeclaration {
    pub fn optional(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            required: false,
            default: None,
        }
    }
}

// `inputs: [city]` is shorthand for `inputs: [{name: city}]`.
#[derive(Deserialize)]
#[serde(untagged)]
enum RawInputDeclaration {
    Name(String),
    Full {
        name: String,
        #[serde(default)]
        required: bool,
        #[serde(default)]
        default: Option<Value>,
    },
}

impl From<RawInputDeclaration> for InputDeclaration {
    fn from(raw: RawInputDeclaration) -> Self {
        match raw {
            RawInputDeclaration::Name(name) => Self::optional(name),
            RawInputDeclaration::Full {
                name,
                required,
                default,
            } => Self {
                name,
                required,
                default,
            },
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct WorkflowStep {
    pub action: String,
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub params: Map<String, Value>,
    #[serde(
        rename = "if",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub condition: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub delay: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time_after: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time_before: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub days: Vec<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct WorkflowSummary {
    pub name: String,
    pub description: String,
    pub inputs: Vec<InputDeclaration>,
    pub steps_count: usize,
}

impl WorkflowSummary {
    /// Reads what it can from a raw body, so listing never fails on a
    /// malformed entry.
    pub fn from_raw(name: &str, body: &Value) -> Self {
        let description = body
            .get("description")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_owned();
        let inputs = body
            .get("inputs")
            .and_then(Value::as_array)
            .map(|items| {
                items
                    .iter()
                    .filter_map(|item| serde_json::from_value(item.clone()).ok())
                    .collect()
            })
            .unwrap_or_default();
        let steps_count = body
            .get("steps")
            .and_then(Value::as_array)
            .map_or(0, Vec::len);

        Self {
            name: name.to_owned(),
            description,
            inputs,
            steps_count,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RunResult {
    pub run_id: String,
    pub workflow: String,
    pub steps_executed: usize,
    pub steps_skipped: usize,
    pub results: Vec<StepReport>,
    pub duration_ms: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StepReport {
    pub step: usize,
    pub action: String,
    #[serde(flatten)]
    pub status: StepStatus,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum StepStatus {
    Ok { output: Map<String, Value> },
    Skipped { reason: String },
}

impl StepReport {
    pub fn is_ok(&self) -> bool {
        matches!(self.status, StepStatus::Ok { .. })
    }

    pub fn is_skipped(&self) -> bool {
        matches!(self.status, StepStatus::Skipped { .. })
    }

    pub fn output(&self) -> Option<&Map<String, Value>> {
        match &self.status {
            StepStatus::Ok { output } => Some(output),
            StepStatus::Skipped { .. } => None,
        }
    }

    pub fn skip_reason(&self) -> Option<&str> {
        match &self.status {
            StepStatus::Skipped { reason } => Some(reason),
            StepStatus::Ok { .. } => None,
        }
    }
}
