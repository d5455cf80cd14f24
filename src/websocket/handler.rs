use std::borrow::Cow;
use std::sync::Arc;
use axum::{
    extract::{
        State,
        ws::{close_code, CloseFrame, Message, WebSocket, WebSocketUpgrade},
    },
    response::Response,
};
use futures_util::{Sink, SinkExt, StreamExt};
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::AppState;
use crate::models::{ConnId, HubError, ReceivedMessage};
use crate::websocket::msg_ping_handler::handle_ping_message;
use crate::ws::HubHandle;
use crate::ws::peers::{mailbox, Outbox, OUTBOX_CAPACITY};

/// WebSocket handler
pub async fn websocket_handler(
    ws: WebSocketUpgrade,
    State(app_state): State<Arc<AppState>>,
) -> Response {
    debug!("New WebSocket connection attempt");
    ws.on_upgrade(move |socket| handle_socket(socket, app_state))
}

/// Handle WebSocket connection
async fn handle_socket(socket: WebSocket, app_state: Arc<AppState>) {
    let conn_id = Uuid::new_v4();
    info!("WebSocket connection established with connection_id: {}", conn_id);

    let (mut sender, mut receiver) = socket.split();
    let (outbox, mut inbox) = mailbox(OUTBOX_CAPACITY);
    let evicted = inbox.eviction();
    let hub = app_state.hub.clone();

    if !join_or_close(&hub, conn_id, outbox.clone(), &mut sender).await {
        return;
    }
    debug!("Connection {} is active", conn_id);

    // Drain the outbox onto the socket
    let mut send_task = tokio::spawn(async move {
        while let Some(msg) = inbox.recv().await {
            let text = match serde_json::to_string(msg.as_ref()) {
                Ok(text) => text,
                Err(e) => {
                    error!("Failed to serialize outbound message for {}: {}", conn_id, e);
                    continue;
                }
            };
            if sender.send(Message::Text(text)).await.is_err() {
                break;
            }
        }
    });

    // Read client events and hand them to the hub
    let reader_hub = hub.clone();
    let mut recv_task = tokio::spawn(async move {
        while let Some(frame) = receiver.next().await {
            let text = match frame {
                Ok(Message::Text(text)) => text,
                Ok(Message::Close(_)) => break,
                Ok(_) => continue,
                Err(e) => {
                    debug!("WebSocket read error for {}: {}", conn_id, e);
                    break;
                }
            };

            match serde_json::from_str::<ReceivedMessage>(&text) {
                Ok(ReceivedMessage::Ping) => handle_ping_message(conn_id, &outbox),
                Ok(message) => reader_hub.dispatch(conn_id, message),
                Err(e) => warn!("Failed to parse message from {}: {}", conn_id, e),
            }
        }
    });

    // Wait for either task to finish, or for the hub to drop us, and stop the rest.
    // Aborting the writer also releases a send stuck on a client that stopped reading.
    tokio::select! {
        _ = (&mut send_task) => recv_task.abort(),
        _ = (&mut recv_task) => send_task.abort(),
        _ = evicted.notified() => {
            warn!("Closing slow connection {}", conn_id);
            send_task.abort();
            recv_task.abort();
        }
    };

    hub.leave(conn_id);
    info!("WebSocket connection terminated: {}", conn_id);
}

/// Register the connection with the hub. On rejection a close frame is sent and
/// `false` returned; the caller must not send a leave for it.
async fn join_or_close<S>(hub: &HubHandle, conn_id: ConnId, outbox: Outbox, sender: &mut S) -> bool
where
    S: Sink<Message> + Unpin,
{
    let Err(e) = hub.join(conn_id, outbox).await else {
        return true;
    };

    error!("Closing connection {}: {}", conn_id, e);
    let close = Message::Close(Some(CloseFrame {
        code: close_code_for(&e),
        reason: Cow::Owned(e.to_string()),
    }));
    if sender.send(close).await.is_err() {
        debug!("Close frame for {} could not be sent", conn_id);
    }
    false
}

fn close_code_for(e: &HubError) -> u16 {
    match e {
        HubError::DuplicateSession(_) => close_code::POLICY,
        HubError::HubClosed => close_code::ERROR,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn duplicate_id_gets_policy_close_frame() {
        let hub = HubHandle::spawn();
        let id = Uuid::new_v4();
        let (first, _rx_first) = mailbox(OUTBOX_CAPACITY);
        let (second, mut rx_second) = mailbox(OUTBOX_CAPACITY);
        let mut first_sent: Vec<Message> = Vec::new();
        let mut second_sent: Vec<Message> = Vec::new();

        assert!(join_or_close(&hub, id, first, &mut first_sent).await);
        assert!(first_sent.is_empty());

        assert!(!join_or_close(&hub, id, second, &mut second_sent).await);
        match second_sent.as_slice() {
            [Message::Close(Some(frame))] => {
                assert_eq!(frame.code, close_code::POLICY);
                assert!(frame.reason.contains(&id.to_string()));
            }
            other => panic!("unexpected frames: {:?}", other),
        }
        assert!(rx_second.try_recv().is_none());

        // The first connection keeps its session
        let stats = hub.stats().await.unwrap();
        assert_eq!(stats.sessions, 1);
        assert_eq!(stats.connections, 1);
    }

    #[test]
    fn close_codes_match_the_failure() {
        assert_eq!(close_code_for(&HubError::DuplicateSession(Uuid::new_v4())), close_code::POLICY);
        assert_eq!(close_code_for(&HubError::HubClosed), close_code::ERROR);
    }
}
