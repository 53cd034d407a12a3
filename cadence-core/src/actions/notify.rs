use serde_json::Value;
use tracing::info;

use crate::actions::types::{optional_str, required_str, Action, ActionError, ActionParams};

/// Prints a notification line and logs it.
#[derive(Debug, Clone, Default)]
pub struct NotifyAction;

impl Action for NotifyAction {
    fn name(&self) -> &str {
        "notify"
    }

    fn invoke(&self, params: &ActionParams) -> Result<Value, ActionError> {
        let title = optional_str(params, "title")?.unwrap_or("Cadence");
        let message = required_str(params, "message")?;

        info!(title, message, "notification");
        println!("[{title}] {message}");

        Ok(Value::String(format!("Notification sent: {title}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn requires_message() {
        let params = json!({"title": "Hi"}).as_object().cloned().expect("object");
        let error = NotifyAction.invoke(&params).expect_err("message is required");
        assert!(matches!(error, ActionError::MissingParam(name) if name == "message"));
    }

    #[test]
    fn defaults_title() {
        let params = json!({"message": "done"}).as_object().cloned().expect("object");
        let output = NotifyAction.invoke(&params).expect("notify");
        assert_eq!(output, json!("Notification sent: Cadence"));
    }
}
