use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Identifier of one WebSocket connection, doubling as the session id
pub type ConnId = Uuid;

/// A connected participant as seen by every client
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    pub id: ConnId,
    pub display_name: String,
    pub color: String,
    pub cursor_offset: i64,
}
