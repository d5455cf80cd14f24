use indexmap::IndexMap;
use std::sync::Arc;
use tokio::sync::{mpsc, Notify};
use tokio::sync::mpsc::error::TrySendError;
use tracing::{debug, warn};

use crate::models::{ConnId, SendMessage};

/// Messages a connection may have queued before it counts as a slow consumer
pub const OUTBOX_CAPACITY: usize = 256;

/// Sending side of one connection's mailbox, held by the hub and the connection's reader
#[derive(Debug, Clone)]
pub struct Outbox {
    tx: mpsc::Sender<Arc<SendMessage>>,
    evicted: Arc<Notify>,
}

/// Receiving side, drained by the connection's writer task
#[derive(Debug)]
pub struct Inbox {
    rx: mpsc::Receiver<Arc<SendMessage>>,
    evicted: Arc<Notify>,
}

/// Create a bounded mailbox pair
pub fn mailbox(capacity: usize) -> (Outbox, Inbox) {
    let (tx, rx) = mpsc::channel(capacity);
    let evicted = Arc::new(Notify::new());
    (
        Outbox { tx, evicted: Arc::clone(&evicted) },
        Inbox { rx, evicted },
    )
}

/// Why a message did not reach a mailbox
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Undelivered {
    /// The connection stopped reading and its queue is full
    Full,
    /// The writer task is gone
    Closed,
}

impl Outbox {
    /// Queue without waiting.
    pub fn offer(&self, msg: Arc<SendMessage>) -> Result<(), Undelivered> {
        self.tx.try_send(msg).map_err(|e| match e {
            TrySendError::Full(_) => Undelivered::Full,
            TrySendError::Closed(_) => Undelivered::Closed,
        })
    }

    /// Tell the connection it has been dropped by the hub
    fn evict(&self) {
        self.evicted.notify_one();
    }
}

impl Inbox {
    pub async fn recv(&mut self) -> Option<Arc<SendMessage>> {
        self.rx.recv().await
    }

    pub fn try_recv(&mut self) -> Option<Arc<SendMessage>> {
        self.rx.try_recv().ok()
    }

    /// Signal fired once the hub drops this connection as a slow consumer
    pub fn eviction(&self) -> Arc<Notify> {
        Arc::clone(&self.evicted)
    }
}

/// Connection id to mailbox table used for fan-out.
///
/// Sends never wait. A mailbox that is full gets detached and its connection told to
/// close; the ids land in `evicted` until the hub runs their leave sequence.
#[derive(Debug, Default)]
pub struct Peers {
    outboxes: IndexMap<ConnId, Outbox>,
    evicted: Vec<ConnId>,
}

impl Peers {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn attach(&mut self, id: ConnId, outbox: Outbox) {
        self.outboxes.insert(id, outbox);
    }

    pub fn detach(&mut self, id: &ConnId) -> bool {
        self.outboxes.shift_remove(id).is_some()
    }

    pub fn len(&self) -> usize {
        self.outboxes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.outboxes.is_empty()
    }

    pub fn send_to(&mut self, id: &ConnId, msg: SendMessage) -> bool {
        let msg = Arc::new(msg);
        let outcome = match self.outboxes.get(id) {
            Some(outbox) => outbox.offer(msg),
            None => return false,
        };
        self.settle([(*id, outcome)]) == 1
    }

    /// Send to every attached connection. Returns how many accepted it.
    pub fn broadcast(&mut self, msg: SendMessage) -> usize {
        let msg = Arc::new(msg);
        let outcomes: Vec<_> = self
            .outboxes
            .iter()
            .map(|(id, outbox)| (*id, outbox.offer(Arc::clone(&msg))))
            .collect();
        self.settle(outcomes)
    }

    /// Send to every attached connection except `origin`.
    pub fn broadcast_except(&mut self, origin: &ConnId, msg: SendMessage) -> usize {
        let msg = Arc::new(msg);
        let outcomes: Vec<_> = self
            .outboxes
            .iter()
            .filter(|(id, _)| *id != origin)
            .map(|(id, outbox)| (*id, outbox.offer(Arc::clone(&msg))))
            .collect();
        self.settle(outcomes)
    }

    /// Connections dropped as slow consumers since the last call
    pub fn take_evicted(&mut self) -> Vec<ConnId> {
        std::mem::take(&mut self.evicted)
    }

    fn settle<I>(&mut self, outcomes: I) -> usize
    where
        I: IntoIterator<Item = (ConnId, Result<(), Undelivered>)>,
    {
        let mut delivered = 0;
        for (id, outcome) in outcomes {
            match outcome {
                Ok(()) => delivered += 1,
                Err(Undelivered::Closed) => {
                    debug!("Outbox for connection {} is closed, skipping", id);
                }
                Err(Undelivered::Full) => {
                    warn!("Connection {} is not reading, dropping it", id);
                    if let Some(outbox) = self.outboxes.shift_remove(&id) {
                        outbox.evict();
                        self.evicted.push(id);
                    }
                }
            }
        }
        delivered
    }
}
