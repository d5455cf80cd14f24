use std::sync::Arc;
use chrono::Utc;
use tracing::{debug, warn};

use crate::models::{ConnId, PongMessage, SendMessage};
use crate::ws::peers::Outbox;

/// Handle a ping by queuing a pong for the same connection only
pub fn handle_ping_message(conn_id: ConnId, outbox: &Outbox) {
    debug!("Ping message received from {}", conn_id);

    let pong = SendMessage::Pong(PongMessage { date: Utc::now().to_rfc3339() });
    if let Err(e) = outbox.offer(Arc::new(pong)) {
        warn!("Dropping Pong message for {}: {:?}", conn_id, e);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ws::peers::{mailbox, OUTBOX_CAPACITY};
    use uuid::Uuid;

    #[test]
    fn replies_with_rfc3339_date() {
        let (tx, mut rx) = mailbox(OUTBOX_CAPACITY);
        handle_ping_message(Uuid::new_v4(), &tx);

        match rx.try_recv().unwrap().as_ref() {
            SendMessage::Pong(pong) => {
                assert!(chrono::DateTime::parse_from_rfc3339(&pong.date).is_ok());
            }
            other => panic!("unexpected event: {:?}", other),
        }
    }

    #[test]
    fn full_mailbox_drops_the_pong() {
        let (tx, mut rx) = mailbox(1);
        handle_ping_message(Uuid::new_v4(), &tx);
        handle_ping_message(Uuid::new_v4(), &tx);

        assert!(rx.try_recv().is_some());
        assert!(rx.try_recv().is_none());
    }
}
