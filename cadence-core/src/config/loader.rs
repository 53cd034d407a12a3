use std::path::Path;

use crate::config::schema::{Config, LogFormat};
use crate::error::{Error, Result};

pub const ENV_WORKFLOWS_PATH: &str = "CADENCE_WORKFLOWS_PATH";
pub const ENV_LOG_LEVEL: &str = "CADENCE_LOG_LEVEL";
pub const ENV_LOG_FORMAT: &str = "CADENCE_LOG_FORMAT";
pub const ENV_ACTION_TIMEOUT: &str = "CADENCE_ACTION_TIMEOUT";

/// Loads the config file when it exists, falls back to defaults otherwise,
/// then applies environment overrides.
pub fn load(path: Option<&Path>) -> Result<Config> {
    let config = match path {
        Some(path) if path.exists() => load_from_file(path)?,
        _ => Config::default(),
    };
    load_from_env(config)
}

pub fn load_from_file(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path).map_err(|err| {
        Error::Config(format!("failed to read config '{}': {err}", path.display()))
    })?;

    toml::from_str(&content).map_err(|err| {
        Error::Config(format!(
            "failed to parse config '{}': {err}",
            path.display()
        ))
    })
}

pub fn load_from_env(config: Config) -> Result<Config> {
    apply_overrides(config, |key| std::env::var(key).ok())
}

fn apply_overrides<F>(mut config: Config, lookup: F) -> Result<Config>
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(path) = lookup(ENV_WORKFLOWS_PATH) {
        config.workflows.path = path;
    }
    if let Some(level) = lookup(ENV_LOG_LEVEL) {
        config.logging.level = level;
    }
    if let Some(format) = lookup(ENV_LOG_FORMAT) {
        config.logging.format = match format.trim().to_ascii_lowercase().as_str() {
            "pretty" => LogFormat::Pretty,
            "json" => LogFormat::Json,
            other => {
                return Err(Error::Config(format!(
                    "{ENV_LOG_FORMAT} must be 'pretty' or 'json', got '{other}'"
                )))
            }
        };
    }
    if let Some(timeout) = lookup(ENV_ACTION_TIMEOUT) {
        config.actions.timeout_seconds = timeout.trim().parse().map_err(|err| {
            Error::Config(format!(
                "{ENV_ACTION_TIMEOUT} must be a whole number of seconds: {err}"
            ))
        })?;
    }
    Ok(config)
}
