pub mod browser;
pub mod filesystem;
pub mod notify;
pub mod registry;
pub mod shell;
pub mod types;

use std::sync::Arc;

use crate::config::schema::ActionsConfig;

pub use registry::ActionRegistry;
pub use types::{Action, ActionError, ActionParams, FnAction};

/// Registers the actions that ship with Cadence.
pub fn register_builtin(registry: &mut ActionRegistry, config: &ActionsConfig) {
    let dirs = Arc::new(filesystem::SafeDirectories::new(&config.safe_directories));

    registry.register_all([
        Arc::new(notify::NotifyAction) as Arc<dyn Action>,
        Arc::new(browser::OpenUrlAction),
        Arc::new(filesystem::ReadFileAction::new(dirs.clone())),
        Arc::new(filesystem::WriteFileAction::new(dirs)),
    ]);

    if config.shell_enabled {
        registry.register_all([
            Arc::new(shell::ShellAction::new(config.timeout_seconds)) as Arc<dyn Action>
        ]);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_set_respects_shell_toggle() {
        let mut registry = ActionRegistry::new();
        register_builtin(&mut registry, &ActionsConfig::default());
        assert_eq!(
            registry.names(),
            vec!["notify", "open-url", "read-file", "shell", "write-file"]
        );

        let mut registry = ActionRegistry::new();
        let config = ActionsConfig {
            shell_enabled: false,
            ..ActionsConfig::default()
        };
        register_builtin(&mut registry, &config);
        assert!(!registry.contains("shell"));
    }
}
