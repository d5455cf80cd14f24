use tokio::sync::{mpsc, oneshot};
use tracing::{error, info, warn};

use crate::models::{ConnId, HubError, ReceivedMessage, Session};
use super::lifecycle;
use super::peers::Outbox;
use super::router;
use super::state::CollabState;

/// Work item for the hub task
#[derive(Debug)]
pub enum HubCommand {
    Join {
        conn_id: ConnId,
        outbox: Outbox,
        reply: oneshot::Sender<Result<Session, HubError>>,
    },
    Event {
        conn_id: ConnId,
        message: ReceivedMessage,
    },
    Leave {
        conn_id: ConnId,
    },
    Stats {
        reply: oneshot::Sender<HubStats>,
    },
}

/// Counters exposed on the diagnostics endpoint
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HubStats {
    pub connections: usize,
    pub sessions: usize,
    pub joins_total: u64,
    pub document_bytes: usize,
}

/// Cheap, cloneable entry point to the hub task.
///
/// The hub owns the registry, the document and the peer table; every read and
/// write goes through this channel and is processed one command at a time.
#[derive(Debug, Clone)]
pub struct HubHandle {
    tx: mpsc::UnboundedSender<HubCommand>,
}

impl HubHandle {
    /// Spawn the hub task on the current runtime.
    pub fn spawn() -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        tokio::spawn(run(CollabState::new(), rx));
        Self { tx }
    }

    pub async fn join(&self, conn_id: ConnId, outbox: Outbox) -> Result<Session, HubError> {
        let (reply, rx) = oneshot::channel();
        self.tx
            .send(HubCommand::Join { conn_id, outbox, reply })
            .map_err(|_| HubError::HubClosed)?;
        rx.await.map_err(|_| HubError::HubClosed)?
    }

    /// Queue an inbound event. Does not wait for it to be applied.
    pub fn dispatch(&self, conn_id: ConnId, message: ReceivedMessage) {
        if self.tx.send(HubCommand::Event { conn_id, message }).is_err() {
            warn!("Hub is gone, dropping event from {}", conn_id);
        }
    }

    pub fn leave(&self, conn_id: ConnId) {
        if self.tx.send(HubCommand::Leave { conn_id }).is_err() {
            warn!("Hub is gone, dropping leave for {}", conn_id);
        }
    }

    pub async fn stats(&self) -> Result<HubStats, HubError> {
        let (reply, rx) = oneshot::channel();
        self.tx
            .send(HubCommand::Stats { reply })
            .map_err(|_| HubError::HubClosed)?;
        rx.await.map_err(|_| HubError::HubClosed)
    }
}

async fn run(mut state: CollabState, mut rx: mpsc::UnboundedReceiver<HubCommand>) {
    info!("Collaboration hub started");
    while let Some(cmd) = rx.recv().await {
        handle_command(&mut state, cmd);
    }
    info!("Collaboration hub stopped");
}

fn handle_command(state: &mut CollabState, cmd: HubCommand) {
    match cmd {
        HubCommand::Join { conn_id, outbox, reply } => {
            let result = lifecycle::join(state, conn_id, outbox);
            if let Err(e) = &result {
                error!("Join rejected for {}: {}", conn_id, e);
            }
            let joined = result.is_ok();
            // Connection gave up waiting; it will never send its own leave.
            if reply.send(result).is_err() && joined {
                lifecycle::leave(state, conn_id);
            }
        }
        HubCommand::Event { conn_id, message } => {
            router::route_message(state, conn_id, message);
        }
        HubCommand::Leave { conn_id } => {
            lifecycle::leave(state, conn_id);
        }
        HubCommand::Stats { reply } => {
            let _ = reply.send(HubStats {
                connections: state.peers.len(),
                sessions: state.registry.len(),
                joins_total: state.registry.joins_total(),
                document_bytes: state.document.len(),
            });
        }
    }

    let evicted = lifecycle::evict_stalled(state);
    if evicted > 0 {
        warn!("Dropped {} slow connections, {} sessions live", evicted, state.registry.len());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{SendMessage, TextChangeMessage};
    use crate::ws::peers::{mailbox, Inbox, OUTBOX_CAPACITY};
    use std::time::Duration;
    use tokio::time::timeout;
    use uuid::Uuid;

    async fn recv(rx: &mut Inbox) -> SendMessage {
        let msg = timeout(Duration::from_secs(2), rx.recv())
            .await
            .expect("timed out waiting for hub")
            .expect("outbox closed");
        (*msg).clone()
    }

    #[tokio::test]
    async fn join_event_leave_through_handle() {
        let hub = HubHandle::spawn();
        let (a, b) = (Uuid::new_v4(), Uuid::new_v4());
        let (tx_a, mut rx_a) = mailbox(OUTBOX_CAPACITY);
        let (tx_b, mut rx_b) = mailbox(OUTBOX_CAPACITY);

        let first = hub.join(a, tx_a).await.unwrap();
        assert_eq!(first.display_name, "User 1");
        hub.join(b, tx_b).await.unwrap();

        hub.dispatch(b, ReceivedMessage::TextChange(TextChangeMessage { content: "hello".into() }));
        hub.leave(b);

        let stats = hub.stats().await.unwrap();
        assert_eq!(stats.sessions, 1);
        assert_eq!(stats.connections, 1);
        assert_eq!(stats.joins_total, 2);
        assert_eq!(stats.document_bytes, 5);

        // a: document-content, user-joined, users-update x2, text-change, users-update, user-left
        let mut seen = Vec::new();
        for _ in 0..7 {
            seen.push(recv(&mut rx_a).await);
        }
        assert!(matches!(seen[4], SendMessage::TextChange(ref t) if t.origin_id == b));
        assert_eq!(seen[6], SendMessage::UserLeft(b));

        // b never sees its own edit
        let mut b_events = Vec::new();
        while let Some(msg) = rx_b.try_recv() {
            b_events.push((*msg).clone());
        }
        assert!(b_events.iter().all(|m| !matches!(m, SendMessage::TextChange(_))));
    }

    #[tokio::test]
    async fn duplicate_join_is_reported() {
        let hub = HubHandle::spawn();
        let a = Uuid::new_v4();
        let (tx, _rx) = mailbox(OUTBOX_CAPACITY);
        let (tx_dup, _rx_dup) = mailbox(OUTBOX_CAPACITY);

        hub.join(a, tx).await.unwrap();
        assert_eq!(hub.join(a, tx_dup).await, Err(HubError::DuplicateSession(a)));
        assert_eq!(hub.stats().await.unwrap().sessions, 1);
    }

    #[test]
    fn abandoned_join_is_rolled_back() {
        let mut state = CollabState::new();
        let (tx, _rx) = mailbox(OUTBOX_CAPACITY);
        let (reply, reply_rx) = oneshot::channel();
        drop(reply_rx);

        handle_command(&mut state, HubCommand::Join { conn_id: Uuid::new_v4(), outbox: tx, reply });

        assert!(state.registry.is_empty());
        assert!(state.peers.is_empty());
    }

    #[tokio::test]
    async fn reader_that_stops_draining_is_dropped() {
        let hub = HubHandle::spawn();
        let (writer, idle) = (Uuid::new_v4(), Uuid::new_v4());
        let (tx_writer, _rx_writer) = mailbox(OUTBOX_CAPACITY);
        let (tx_idle, rx_idle) = mailbox(8);
        let eviction = rx_idle.eviction();

        hub.join(writer, tx_writer).await.unwrap();
        hub.join(idle, tx_idle).await.unwrap();
        for n in 0..32 {
            hub.dispatch(writer, ReceivedMessage::TextChange(TextChangeMessage { content: "x".repeat(n) }));
        }

        let stats = hub.stats().await.unwrap();
        assert_eq!(stats.sessions, 1);
        assert_eq!(stats.connections, 1);
        assert_eq!(stats.document_bytes, 31);
        timeout(Duration::from_secs(1), eviction.notified())
            .await
            .expect("idle connection was not told to close");
    }
}
