use serde_json::{json, Value};
use tokio::process::Command;
use tokio::time::{timeout, Duration};
use tracing::debug;

use crate::actions::types::{required_str, Action, ActionError, ActionParams};

/// Runs a shell command and captures its output.
///
/// The engine is synchronous, so each invocation drives its own
/// current-thread runtime to get a bounded wait on the child process.
#[derive(Debug, Clone)]
pub struct ShellAction {
    timeout_seconds: u64,
}

impl ShellAction {
    pub fn new(timeout_seconds: u64) -> Self {
        Self { timeout_seconds }
    }

    async fn run(&self, command: &str) -> Result<Value, ActionError> {
        let shell = if cfg!(windows) { "cmd.exe" } else { "/bin/sh" };
        let shell_flag = if cfg!(windows) { "/C" } else { "-c" };

        let mut cmd = Command::new(shell);
        cmd.arg(shell_flag).arg(command).kill_on_drop(true);

        let output = timeout(Duration::from_secs(self.timeout_seconds), cmd.output())
            .await
            .map_err(|_| ActionError::Timeout(self.timeout_seconds))?
            .map_err(|err| ActionError::Execution(format!("failed to spawn command: {err}")))?;

        let stdout = String::from_utf8_lossy(&output.stdout).trim_end().to_owned();
        let stderr = String::from_utf8_lossy(&output.stderr).trim_end().to_owned();
        let exit_code = output.status.code().unwrap_or(-1);

        if !output.status.success() {
            let detail = if stderr.is_empty() { &stdout } else { &stderr };
            return Err(ActionError::Execution(format!(
                "command exited with status {exit_code}: {detail}"
            )));
        }

        Ok(json!({
            "stdout": stdout,
            "stderr": stderr,
            "exit_code": exit_code,
        }))
    }
}

impl Action for ShellAction {
    fn name(&self) -> &str {
        "shell"
    }

    fn invoke(&self, params: &ActionParams) -> Result<Value, ActionError> {
        let command = required_str(params, "command")?;
        if command.trim().is_empty() {
            return Err(ActionError::InvalidParam {
                name: "command".to_owned(),
                reason: "must not be empty".to_owned(),
            });
        }

        debug!(command, "running shell action");
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(|err| ActionError::Execution(format!("failed to create runtime: {err}")))?;
        runtime.block_on(self.run(command))
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use serde_json::json;

    fn params(command: &str) -> ActionParams {
        json!({ "command": command }).as_object().cloned().expect("object")
    }

    #[test]
    fn captures_stdout_and_exit_code() {
        let output = ShellAction::new(5)
            .invoke(&params("printf 'hello'"))
            .expect("command should succeed");
        assert_eq!(output["stdout"], json!("hello"));
        assert_eq!(output["exit_code"], json!(0));
    }

    #[test]
    fn non_zero_exit_is_an_error() {
        let error = ShellAction::new(5)
            .invoke(&params("echo boom >&2; exit 3"))
            .expect_err("command should fail");
        let message = error.to_string();
        assert!(message.contains("status 3"));
        assert!(message.contains("boom"));
    }

    #[test]
    fn slow_command_times_out() {
        let error = ShellAction::new(1)
            .invoke(&params("sleep 5"))
            .expect_err("command should time out");
        assert!(matches!(error, ActionError::Timeout(1)));
    }
}
