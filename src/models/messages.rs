use serde::{Deserialize, Serialize};
use crate::models::{ConnId, Session};

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct TextChangeMessage {
    pub content: String,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct CursorChangeMessage {
    pub offset: i64,
}

/// Edit forwarded to every connection except the one that made it
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct TextChangeBroadcast {
    pub content: String,
    pub origin_id: ConnId,
    /// Milliseconds since the Unix epoch, taken when the server applied the edit
    pub server_timestamp: i64,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct CursorUpdateBroadcast {
    pub origin_id: ConnId,
    pub offset: i64,
    pub session: Session,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct PongMessage {
    pub date: String,
}

/// Events a client may send. Wire shape: `{"event": "...", "data": ...}`.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(tag = "event", content = "data", rename_all = "kebab-case")]
pub enum ReceivedMessage {
    TextChange(TextChangeMessage),
    CursorChange(CursorChangeMessage),
    Ping,
}

/// Events the server emits
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(tag = "event", content = "data", rename_all = "kebab-case")]
pub enum SendMessage {
    DocumentContent(String),
    UserJoined(Session),
    UsersUpdate(Vec<Session>),
    TextChange(TextChangeBroadcast),
    CursorUpdate(CursorUpdateBroadcast),
    UserLeft(ConnId),
    Pong(PongMessage),
}
