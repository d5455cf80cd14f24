use serde::{Deserialize, Serialize};
use thiserror::Error;
use utoipa::ToSchema;

use crate::models::ConnId;

/// Response for an error
#[derive(Serialize, Deserialize, ToSchema)]
pub struct ErrorResponse {
    pub code: u16,
    pub status: String,
    pub error: String,
}

/// Failures surfaced by the collaboration hub
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum HubError {
    /// The transport handed out a connection id that is still registered
    #[error("session {0} is already registered")]
    DuplicateSession(ConnId),
    #[error("collaboration hub is not running")]
    HubClosed,
}
