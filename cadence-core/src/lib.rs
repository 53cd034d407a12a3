pub mod actions;
pub mod config;
pub mod error;
pub mod events;
pub mod logging;
pub mod workflows;

use std::path::Path;
use std::sync::Arc;

pub use actions::{Action, ActionError, ActionRegistry};
pub use config::Config;
pub use error::{Error, Result};
pub use events::{types::WorkflowEvent, EventBus};
pub use workflows::{RunResult, WorkflowEngine};

/// The assembled application: configuration, built-in actions, the YAML
/// store and an engine wired to an event bus.
pub struct Cadence {
    config: Config,
    engine: WorkflowEngine,
    events: EventBus,
}

impl Cadence {
    pub fn new(config: Config) -> Result<Self> {
        config::validate_config(&config)?;

        let mut registry = ActionRegistry::new();
        actions::register_builtin(&mut registry, &config.actions);

        let store = workflows::YamlFileStore::new(&config.workflows.path)
            .with_seed_from_example(config.workflows.seed_from_example);

        let events = EventBus::default();
        let engine = WorkflowEngine::new(Arc::new(registry), Arc::new(store))
            .with_events(events.clone());

        Ok(Self {
            config,
            engine,
            events,
        })
    }

    /// Loads the config file (missing means defaults), applies environment
    /// overrides, then builds the application.
    pub fn from_config_path(path: Option<&Path>) -> Result<Self> {
        let config = config::load(path)?;
        Self::new(config)
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn engine(&self) -> &WorkflowEngine {
        &self.engine
    }

    pub fn events(&self) -> &EventBus {
        &self.events
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_rejects_invalid_config() {
        let mut config = Config::default();
        config.actions.timeout_seconds = 0;
        assert!(matches!(Cadence::new(config), Err(Error::Config(_))));
    }

    #[test]
    fn new_wires_builtin_actions_and_store() {
        let dir = tempfile::tempdir().expect("tempdir");
        let mut config = Config::default();
        config.workflows.path = dir
            .path()
            .join("workflows.yaml")
            .to_string_lossy()
            .into_owned();

        let app = Cadence::new(config).expect("app");
        assert!(app.engine().actions().contains("notify"));
        assert!(app.engine().list().expect("list").is_empty());
    }
}
