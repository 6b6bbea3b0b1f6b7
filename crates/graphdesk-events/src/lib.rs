use crossbeam_channel::{Receiver, Sender, unbounded};
use graphdesk_core::{EdgeId, NodeId};
use serde::{Deserialize, Serialize};

/// Gestures reported by the rendering sink.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum GraphEvent {
    NodeSelected(NodeId),
    EdgeSelected(EdgeId),
    /// The user dragged a new connection between two nodes.
    EdgeDrawRequested { from: NodeId, to: NodeId },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobState {
    Queued,
    Running,
    Cancelling,
    Completed,
    Failed,
    Cancelled,
}

impl JobState {
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Failed | Self::Cancelled)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum EditKind {
    NodeCreated(NodeId),
    NodeRenamed(NodeId),
    NodeDeleted(NodeId),
    RelationCreated(EdgeId),
    RelationDeleted(EdgeId),
    MasteryRecorded { focus: NodeId, unlocked: usize },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Event {
    // Notifications
    StatusUpdate {
        message: String,
    },
    ShowError {
        message: String,
    },

    // Graph state
    GraphReplaced {
        nodes: usize,
        edges: usize,
        revision: u64,
    },
    GraphExtended {
        center: NodeId,
        added_nodes: usize,
        added_edges: usize,
        revision: u64,
    },
    NoFurtherNeighbors {
        center: NodeId,
    },
    EditApplied {
        edit: EditKind,
        revision: u64,
    },
    /// A response arrived after a newer one had already been applied.
    StaleResponseDiscarded {
        ticket: u64,
        latest_applied: u64,
    },

    // Interaction
    SelectionChanged {
        node: Option<NodeId>,
        edge: Option<EdgeId>,
    },
    RelationDraftReady {
        from: NodeId,
        to: NodeId,
    },

    // Ingestion jobs
    JobUpdated {
        job_id: String,
        state: JobState,
        message: Option<String>,
    },
    JobsSettled {
        completed: usize,
        failed: usize,
        cancelled: usize,
    },
}

#[derive(Clone)]
pub struct EventBus {
    tx: Sender<Event>,
    rx: Receiver<Event>,
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

impl EventBus {
    pub fn new() -> Self {
        let (tx, rx) = unbounded();
        Self { tx, rx }
    }

    pub fn sender(&self) -> Sender<Event> {
        self.tx.clone()
    }

    pub fn receiver(&self) -> Receiver<Event> {
        self.rx.clone()
    }

    pub fn publish(&self, event: Event) {
        let _ = self.tx.send(event);
    }

    /// Dispatch all pending events to a listener.
    pub fn dispatch_to<L: EventListener>(&self, listener: &mut L) {
        while let Ok(event) = self.rx.try_recv() {
            listener.handle_event(&event);
        }
    }

    /// Pending events, oldest first.
    pub fn drain(&self) -> Vec<Event> {
        self.rx.try_iter().collect()
    }
}

/// Trait for components that respond to events.
pub trait EventListener {
    fn handle_event(&mut self, event: &Event);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_bus_publish_receive() {
        let bus = EventBus::new();
        let sender = bus.sender();
        let receiver = bus.receiver();

        sender
            .send(Event::NoFurtherNeighbors {
                center: NodeId::from("4:db:1"),
            })
            .unwrap();

        match receiver.recv().unwrap() {
            Event::NoFurtherNeighbors { center } => assert_eq!(center.as_str(), "4:db:1"),
            other => panic!("Expected NoFurtherNeighbors, got {other:?}"),
        }
    }

    #[derive(Default)]
    struct Collector {
        statuses: Vec<String>,
        errors: usize,
    }

    impl EventListener for Collector {
        fn handle_event(&mut self, event: &Event) {
            match event {
                Event::StatusUpdate { message } => self.statuses.push(message.clone()),
                Event::ShowError { .. } => self.errors += 1,
                _ => {}
            }
        }
    }

    #[test]
    fn test_dispatch_to_listener() {
        let bus = EventBus::new();
        bus.publish(Event::StatusUpdate {
            message: "loading".into(),
        });
        bus.publish(Event::ShowError {
            message: "timeout".into(),
        });
        bus.publish(Event::StatusUpdate {
            message: "ready".into(),
        });

        let mut collector = Collector::default();
        bus.dispatch_to(&mut collector);
        assert_eq!(collector.statuses, vec!["loading", "ready"]);
        assert_eq!(collector.errors, 1);
        assert!(bus.drain().is_empty());
    }

    #[test]
    fn test_job_state_terminal() {
        assert!(!JobState::Queued.is_terminal());
        assert!(!JobState::Cancelling.is_terminal());
        assert!(JobState::Failed.is_terminal());
        let state: JobState = serde_json::from_str("\"cancelled\"").unwrap();
        assert_eq!(state, JobState::Cancelled);
    }

    #[test]
    fn test_graph_event_serde() {
        let event = GraphEvent::EdgeDrawRequested {
            from: NodeId::from("a"),
            to: NodeId::from("b"),
        };
        let json = serde_json::to_string(&event).unwrap();
        assert_eq!(json, r#"{"EdgeDrawRequested":{"from":"a","to":"b"}}"#);
        assert_eq!(serde_json::from_str::<GraphEvent>(&json).unwrap(), event);
    }
}
