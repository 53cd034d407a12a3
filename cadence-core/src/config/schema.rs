use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
    pub workflows: WorkflowsConfig,
    pub logging: LoggingConfig,
    pub actions: ActionsConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct WorkflowsConfig {
    pub path: String,
    /// Copy `<stem>.example.yaml` into place when the workflows file is missing.
    pub seed_from_example: bool,
}

impl Default for WorkflowsConfig {
    fn default() -> Self {
        Self {
            path: "workflows.yaml".to_owned(),
            seed_from_example: true,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    pub format: LogFormat,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_owned(),
            format: LogFormat::Pretty,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ActionsConfig {
    pub timeout_seconds: u64,
    pub safe_directories: Vec<String>,
    pub shell_enabled: bool,
}

impl Default for ActionsConfig {
    fn default() -> Self {
        Self {
            timeout_seconds: 10,
            safe_directories: vec![
                "~/Desktop".to_owned(),
                "~/Documents".to_owned(),
                "~/Downloads".to_owned(),
            ],
            shell_enabled: true,
        }
    }
}
