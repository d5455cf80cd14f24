use tracing::{debug, info};

use crate::models::{ConnId, HubError, SendMessage, Session};
use super::peers::Outbox;
use super::state::CollabState;

/// Join sequence for a new connection.
///
/// The new connection alone gets the current document and its own session, then
/// every connection (the new one included) gets the full presence list.
pub fn join(state: &mut CollabState, id: ConnId, outbox: Outbox) -> Result<Session, HubError> {
    let session = state.registry.create(id)?;
    state.peers.attach(id, outbox);

    state
        .peers
        .send_to(&id, SendMessage::DocumentContent(state.document.read().to_string()));
    state.peers.send_to(&id, SendMessage::UserJoined(session.clone()));
    state
        .peers
        .broadcast(SendMessage::UsersUpdate(state.registry.list_all()));

    info!(
        "{} joined as {} ({}), {} sessions live",
        id,
        session.display_name,
        session.color,
        state.registry.len()
    );
    Ok(session)
}

/// Leave sequence. Unknown ids are ignored.
pub fn leave(state: &mut CollabState, id: ConnId) -> Option<Session> {
    state.peers.detach(&id);
    let Some(session) = state.registry.remove(&id) else {
        debug!("Leave for unregistered connection {}", id);
        return None;
    };

    state
        .peers
        .broadcast(SendMessage::UsersUpdate(state.registry.list_all()));
    state.peers.broadcast(SendMessage::UserLeft(id));

    info!(
        "{} ({}) left, {} sessions live",
        id,
        session.display_name,
        state.registry.len()
    );
    Some(session)
}

/// Run the leave sequence for every connection dropped as a slow consumer.
///
/// Leaving broadcasts too, which can push further peers over their limit, so this
/// repeats until nobody new has been dropped.
pub fn evict_stalled(state: &mut CollabState) -> usize {
    let mut evicted = 0;
    loop {
        let stalled = state.peers.take_evicted();
        if stalled.is_empty() {
            return evicted;
        }
        for id in stalled {
            if leave(state, id).is_some() {
                evicted += 1;
            }
        }
    }
}
