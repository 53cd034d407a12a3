pub mod types;

use tokio::sync::broadcast;

use crate::events::types::WorkflowEvent;

/// Fan-out of run events. Publishing never fails and never blocks; with no
/// subscribers the event is dropped.
#[derive(Clone)]
pub struct EventBus {
    sender: broadcast::Sender<WorkflowEvent>,
}

impl EventBus {
    pub fn new(buffer_size: usize) -> Self {
        let (sender, _) = broadcast::channel(buffer_size.max(1));
        Self { sender }
    }

    pub fn publish(&self, event: WorkflowEvent) {
        let _ = self.sender.send(event);
    }

    pub fn subscribe(&self) -> broadcast::Receiver<WorkflowEvent> {
        self.sender.subscribe()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(128)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn started(run_id: &str) -> WorkflowEvent {
        WorkflowEvent::RunStarted {
            run_id: run_id.to_owned(),
            workflow: "demo".to_owned(),
            steps: 1,
        }
    }

    #[test]
    fn publish_without_subscribers_is_ignored() {
        let bus = EventBus::new(0);
        bus.publish(started("a"));
    }

    #[test]
    fn subscribers_receive_events_in_order() {
        let bus = EventBus::default();
        let mut receiver = bus.subscribe();

        bus.publish(started("a"));
        bus.publish(WorkflowEvent::RunCompleted {
            run_id: "a".to_owned(),
            workflow: "demo".to_owned(),
            steps_executed: 1,
            steps_skipped: 0,
            duration_ms: 3,
        });

        let first = receiver.try_recv().expect("first event");
        assert_eq!(first, started("a"));
        assert!(!first.is_terminal());

        let second = receiver.try_recv().expect("second event");
        assert_eq!(second.run_id(), "a");
        assert!(second.is_terminal());
    }
}
