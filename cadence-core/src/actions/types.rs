use serde_json::{Map, Value};
use thiserror::Error;

pub type ActionParams = Map<String, Value>;

#[derive(Debug, Error)]
pub enum ActionError {
    #[error("missing required parameter '{0}'")]
    MissingParam(String),

    #[error("invalid parameter '{name}': {reason}")]
    InvalidParam { name: String, reason: String },

    #[error("{0}")]
    Execution(String),

    #[error("timed out after {0} seconds")]
    Timeout(u64),
}

/// A named capability a workflow step can invoke.
///
/// Implementations must tolerate missing optional parameters and report
/// failures through [`ActionError`] rather than panicking.
pub trait Action: Send + Sync {
    fn name(&self) -> &str;
    fn invoke(&self, params: &ActionParams) -> Result<Value, ActionError>;
}

/// Adapts a closure into an [`Action`].
pub struct FnAction<F> {
    name: String,
    func: F,
}

impl<F> FnAction<F>
where
    F: Fn(&ActionParams) -> Result<Value, ActionError> + Send + Sync,
{
    pub fn new(name: impl Into<String>, func: F) -> Self {
        Self {
            name: name.into(),
            func,
        }
    }
}

impl<F> Action for FnAction<F>
where
    F: Fn(&ActionParams) -> Result<Value, ActionError> + Send + Sync,
{
    fn name(&self) -> &str {
        &self.name
    }

    fn invoke(&self, params: &ActionParams) -> Result<Value, ActionError> {
        (self.func)(params)
    }
}

pub fn required_str<'a>(params: &'a ActionParams, name: &str) -> Result<&'a str, ActionError> {
    match params.get(name) {
        Some(Value::String(value)) => Ok(value),
        Some(Value::Null) | None => Err(ActionError::MissingParam(name.to_owned())),
        Some(other) => Err(ActionError::InvalidParam {
            name: name.to_owned(),
            reason: format!("expected string, got {other}"),
        }),
    }
}

pub fn optional_str<'a>(
    params: &'a ActionParams,
    name: &str,
) -> Result<Option<&'a str>, ActionError> {
    match params.get(name) {
        Some(Value::Null) | None => Ok(None),
        Some(_) => required_str(params, name).map(Some),
    }
}

pub fn optional_bool(params: &ActionParams, name: &str) -> Result<Option<bool>, ActionError> {
    match params.get(name) {
        Some(Value::Null) | None => Ok(None),
        Some(Value::Bool(value)) => Ok(Some(*value)),
        // Substituted templates always come back as strings.
        Some(Value::String(value)) => match value.trim().to_ascii_lowercase().as_str() {
            "true" => Ok(Some(true)),
            "false" => Ok(Some(false)),
            _ => Err(ActionError::InvalidParam {
                name: name.to_owned(),
                reason: format!("expected boolean, got '{value}'"),
            }),
        },
        Some(other) => Err(ActionError::InvalidParam {
            name: name.to_owned(),
            reason: format!("expected boolean, got {other}"),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn params(value: Value) -> ActionParams {
        value.as_object().cloned().expect("object params")
    }

    #[test]
    fn required_str_distinguishes_missing_from_wrong_type() {
        let params = params(json!({"title": "hi", "count": 3, "empty": null}));

        assert_eq!(required_str(&params, "title").expect("title"), "hi");
        assert!(matches!(
            required_str(&params, "absent"),
            Err(ActionError::MissingParam(name)) if name == "absent"
        ));
        assert!(matches!(
            required_str(&params, "empty"),
            Err(ActionError::MissingParam(_))
        ));
        assert!(matches!(
            required_str(&params, "count"),
            Err(ActionError::InvalidParam { .. })
        ));
    }

    #[test]
    fn optional_bool_accepts_templated_strings() {
        let params = params(json!({"a": true, "b": "False", "c": "maybe"}));

        assert_eq!(optional_bool(&params, "a").expect("a"), Some(true));
        assert_eq!(optional_bool(&params, "b").expect("b"), Some(false));
        assert_eq!(optional_bool(&params, "missing").expect("missing"), None);
        assert!(optional_bool(&params, "c").is_err());
    }

    #[test]
    fn fn_action_forwards_params() {
        let action = FnAction::new("echo", |params: &ActionParams| {
            Ok(params.get("text").cloned().unwrap_or(Value::Null))
        });

        assert_eq!(action.name(), "echo");
        let output = action
            .invoke(&params(json!({"text": "hello"})))
            .expect("invoke");
        assert_eq!(output, json!("hello"));
    }
}
