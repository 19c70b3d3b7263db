use serde::Deserialize;

use crate::db::models::ControlCommand;

/// Minimal `{status, message}` acknowledgement returned by write endpoints.
#[derive(Debug, Deserialize)]
pub struct Ack {
    pub status: String,
    #[serde(default)]
    pub message: Option<String>,
}

/// Response envelope of `GET /api/device-command`.
#[derive(Debug, Deserialize)]
pub struct PendingCommandsResponse {
    pub status: String,
    pub commands: Vec<ControlCommand>,
}
