use serde_json::Value;
use url::Url;

use crate::actions::types::{required_str, Action, ActionError, ActionParams};

/// Opens an http(s) URL with the platform's default handler.
#[derive(Debug, Clone, Default)]
pub struct OpenUrlAction;

fn opener(url: &str) -> (&'static str, Vec<&str>) {
    #[cfg(target_os = "macos")]
    let command = ("open", vec![url]);

    #[cfg(target_os = "windows")]
    let command = ("cmd", vec!["/C", "start", "", url]);

    #[cfg(not(any(target_os = "macos", target_os = "windows")))]
    let command = ("xdg-open", vec![url]);

    command
}

pub fn validate_url(raw: &str) -> Result<Url, ActionError> {
    let invalid = |reason: String| ActionError::InvalidParam {
        name: "url".to_owned(),
        reason,
    };

    let parsed =
        Url::parse(raw.trim()).map_err(|err| invalid(format!("invalid url '{raw}': {err}")))?;
    if !matches!(parsed.scheme(), "http" | "https") {
        return Err(invalid(format!("'{raw}' must use http or https")));
    }
    if parsed.host_str().map_or(true, str::is_empty) {
        return Err(invalid(format!("'{raw}' has no host")));
    }
    Ok(parsed)
}

impl Action for OpenUrlAction {
    fn name(&self) -> &str {
        "open-url"
    }

    fn invoke(&self, params: &ActionParams) -> Result<Value, ActionError> {
        let parsed = validate_url(required_str(params, "url")?)?;
        let url = parsed.as_str();

        let (program, args) = opener(url);
        let status = std::process::Command::new(program)
            .args(args)
            .status()
            .map_err(|err| ActionError::Execution(format!("failed to launch {program}: {err}")))?;

        if !status.success() {
            return Err(ActionError::Execution(format!(
                "{program} exited with {status} while opening {url}"
            )));
        }

        Ok(Value::String(format!("Opened {url}")))
    }
}
