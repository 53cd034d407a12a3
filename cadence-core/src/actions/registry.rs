use std::collections::HashMap;
use std::sync::Arc;

use crate::actions::types::Action;

/// Name → action lookup. Filled at startup, then shared read-only behind an `Arc`.
#[derive(Default, Clone)]
pub struct ActionRegistry {
    actions: HashMap<String, Arc<dyn Action>>,
}

impl ActionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, name: impl Into<String>, action: Arc<dyn Action>) {
        self.actions.insert(name.into(), action);
    }

    pub fn register_all<I>(&mut self, actions: I)
    where
        I: IntoIterator<Item = Arc<dyn Action>>,
    {
        for action in actions {
            self.actions.insert(action.name().to_owned(), action);
        }
    }

    pub fn get(&self, name: &str) -> Option<Arc<dyn Action>> {
        self.actions.get(name).cloned()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.actions.contains_key(name)
    }

    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.actions.keys().cloned().collect();
        names.sort();
        names
    }

    pub fn len(&self) -> usize {
        self.actions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::ActionRegistry;
    use crate::actions::types::{Action, ActionParams, FnAction};
    use serde_json::{json, Value};
    use std::sync::Arc;

    fn constant(name: &str, value: Value) -> Arc<dyn Action> {
        Arc::new(FnAction::new(name, move |_: &ActionParams| Ok(value.clone())))
    }

    #[test]
    fn register_binds_explicit_name() {
        let mut registry = ActionRegistry::new();
        registry.register("open-app", constant("ignored", json!("opened")));

        assert!(registry.contains("open-app"));
        assert!(!registry.contains("ignored"));
        let action = registry.get("open-app").expect("registered");
        assert_eq!(action.invoke(&ActionParams::new()).expect("invoke"), json!("opened"));
    }

    #[test]
    fn register_all_uses_action_names_and_lists_sorted() {
        let mut registry = ActionRegistry::new();
        registry.register_all([
            constant("notify", json!(null)),
            constant("clipboard", json!(null)),
        ]);

        assert_eq!(registry.len(), 2);
        assert_eq!(registry.names(), vec!["clipboard", "notify"]);
    }

    #[test]
    fn later_registration_replaces_earlier() {
        let mut registry = ActionRegistry::new();
        registry.register("notify", constant("notify", json!(1)));
        registry.register("notify", constant("notify", json!(2)));

        let action = registry.get("notify").expect("registered");
        assert_eq!(action.invoke(&ActionParams::new()).expect("invoke"), json!(2));
    }
}
