use chrono::Utc;
use tracing::debug;

use crate::models::{
    ConnId, CursorChangeMessage, CursorUpdateBroadcast, ReceivedMessage, SendMessage,
    TextChangeBroadcast, TextChangeMessage,
};
use super::state::CollabState;

/// Apply one inbound event and fan it out to the other connections.
///
/// Returns the number of connections the resulting event was queued for.
pub fn route_message(state: &mut CollabState, origin: ConnId, msg: ReceivedMessage) -> usize {
    match msg {
        ReceivedMessage::TextChange(edit) => handle_text_change(state, origin, edit),
        ReceivedMessage::CursorChange(cursor) => handle_cursor_change(state, origin, cursor),
        // Answered by the connection itself
        ReceivedMessage::Ping => 0,
    }
}

/// Replace the document and forward the full content to everyone but the sender.
pub fn handle_text_change(state: &mut CollabState, origin: ConnId, edit: TextChangeMessage) -> usize {
    if !state.registry.contains(&origin) {
        debug!("Dropping text-change from unregistered connection {}", origin);
        return 0;
    }

    state.document.write(edit.content.clone());
    let sent = state.peers.broadcast_except(
        &origin,
        SendMessage::TextChange(TextChangeBroadcast {
            content: edit.content,
            origin_id: origin,
            server_timestamp: Utc::now().timestamp_millis(),
        }),
    );
    debug!(
        "text-change from {} applied ({} bytes), forwarded to {} peers",
        origin,
        state.document.len(),
        sent
    );
    sent
}

/// Record the sender's cursor and forward it, with the updated session, to everyone else.
pub fn handle_cursor_change(state: &mut CollabState, origin: ConnId, cursor: CursorChangeMessage) -> usize {
    let Some(session) = state.registry.update_cursor(&origin, cursor.offset) else {
        debug!("Dropping cursor-change from unregistered connection {}", origin);
        return 0;
    };

    let update = CursorUpdateBroadcast {
        origin_id: origin,
        offset: cursor.offset,
        session: session.clone(),
    };
    state.peers.broadcast_except(&origin, SendMessage::CursorUpdate(update))
}
