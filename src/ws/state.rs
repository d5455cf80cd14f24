use super::document::DocumentStore;
use super::peers::Peers;
use super::registry::SessionRegistry;

/// Everything the hub task owns. Only ever touched from that task.
#[derive(Debug, Default)]
pub struct CollabState {
    pub registry: SessionRegistry,
    pub document: DocumentStore,
    pub peers: Peers,
}

impl CollabState {
    pub fn new() -> Self {
        Self::default()
    }
}
