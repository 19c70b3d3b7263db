pub mod fallback;
pub mod models;

use std::time::Duration;

use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;
use thiserror::Error;
use tracing::debug;

use crate::api::dto::{
    ControlSettingsUpdate, CurrentDataResponse, SensorStats, SeriesPoint,
};
use crate::db::models::{Alert, ControlSettings, SensorKind, SensorReading};

use self::models::{Ack, PendingCommandsResponse};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Failure of one API fetch. Display strings are shown directly in the
/// dashboard; there is no retry beyond the next scheduled tick.
#[derive(Debug, Error)]
pub enum ClientError {
    #[error("Network error: Unable to connect to server")]
    Connectivity(#[source] reqwest::Error),

    /// The server responded with a non-success status.
    #[error("{message}")]
    Api { status: StatusCode, message: String },

    #[error("Failed to decode response: {0}")]
    Decode(#[source] reqwest::Error),

    #[error(transparent)]
    Http(reqwest::Error),
}

impl ClientError {
    /// True when the failure looks like the server is unreachable: the
    /// dashboard substitutes fallback data in that case.
    pub fn is_connectivity(&self) -> bool {
        matches!(self, ClientError::Connectivity(_))
    }

    fn from_send(e: reqwest::Error) -> Self {
        if e.is_connect() || e.is_timeout() {
            ClientError::Connectivity(e)
        } else {
            ClientError::Http(e)
        }
    }
}

/// Pull a human-readable message out of an error response body, falling
/// back to the bare status code.
fn extract_error_message(status: StatusCode, body: &[u8]) -> String {
    if let Ok(v) = serde_json::from_slice::<serde_json::Value>(body) {
        for key in ["error", "message"] {
            if let Some(msg) = v.get(key).and_then(|m| m.as_str()) {
                return msg.to_owned();
            }
        }
    }
    format!("HTTP {}", status.as_u16())
}

// ---------------------------------------------------------------------------
// Client
// ---------------------------------------------------------------------------

/// Typed client for the greenhouse backend API.
#[derive(Debug, Clone)]
pub struct GreenhouseClient {
    http: Client,
    base_url: String,
}

impl GreenhouseClient {
    pub fn new(base_url: impl Into<String>) -> anyhow::Result<Self> {
        let http = Client::builder().timeout(REQUEST_TIMEOUT).build()?;
        let mut base_url = base_url.into();
        while base_url.ends_with('/') {
            base_url.pop();
        }
        Ok(Self { http, base_url })
    }

    /// Current sensor data and device status.
    pub async fn current_data(&self) -> Result<CurrentDataResponse, ClientError> {
        self.get_json("/api/current-data", &[]).await
    }

    /// Full historical readings over the window.
    pub async fn historical_readings(
        &self,
        hours: i64,
        limit: i64,
    ) -> Result<Vec<SensorReading>, ClientError> {
        self.get_json(
            "/api/historical-data",
            &[("hours", hours.to_string()), ("limit", limit.to_string())],
        )
        .await
    }

    /// `{timestamp, value}` points for a single sensor series.
    pub async fn sensor_series(
        &self,
        kind: SensorKind,
        hours: i64,
        limit: i64,
    ) -> Result<Vec<SeriesPoint>, ClientError> {
        self.get_json(
            "/api/historical-data",
            &[
                ("hours", hours.to_string()),
                ("limit", limit.to_string()),
                ("sensor", kind.column().to_owned()),
            ],
        )
        .await
    }

    /// Aggregate statistics per sensor series.
    pub async fn sensor_stats(
        &self,
        hours: i64,
    ) -> Result<std::collections::BTreeMap<SensorKind, SensorStats>, ClientError> {
        self.get_json("/api/sensor-stats", &[("hours", hours.to_string())])
            .await
    }

    pub async fn control_settings(&self) -> Result<Option<ControlSettings>, ClientError> {
        self.get_json("/api/controls", &[]).await
    }

    pub async fn update_controls(
        &self,
        update: &ControlSettingsUpdate,
    ) -> Result<(), ClientError> {
        let _: Ack = self.post_json("/api/controls", update).await?;
        Ok(())
    }

    /// Recent alerts, newest first.
    pub async fn alerts(&self, limit: i64) -> Result<Vec<Alert>, ClientError> {
        self.get_json("/api/alerts", &[("limit", limit.to_string())])
            .await
    }

    /// Queue a command for the device.
    pub async fn send_device_command(
        &self,
        command: &str,
        value: Option<serde_json::Value>,
    ) -> Result<(), ClientError> {
        let body = serde_json::json!({ "command": command, "value": value });
        let _: Ack = self.post_json("/api/device-command", &body).await?;
        Ok(())
    }

    /// Commands queued for the device; draining them marks them executed.
    pub async fn pending_commands(&self) -> Result<Vec<crate::db::models::ControlCommand>, ClientError> {
        let resp: PendingCommandsResponse = self.get_json("/api/device-command", &[]).await?;
        Ok(resp.commands)
    }

    /// True when the backend and its database are reachable.
    pub async fn health(&self) -> bool {
        self.get_json::<serde_json::Value>("/api/health", &[])
            .await
            .is_ok()
    }

    // -----------------------------------------------------------------------
    // Plumbing
    // -----------------------------------------------------------------------

    async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<T, ClientError> {
        let url = format!("{}{}", self.base_url, path);
        debug!(url = %url, "GET");

        let resp = self
            .http
            .get(&url)
            .query(query)
            .send()
            .await
            .map_err(ClientError::from_send)?;

        Self::decode(resp).await
    }

    async fn post_json<B: Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, ClientError> {
        let url = format!("{}{}", self.base_url, path);
        debug!(url = %url, "POST");

        let resp = self
            .http
            .post(&url)
            .json(body)
            .send()
            .await
            .map_err(ClientError::from_send)?;

        Self::decode(resp).await
    }

    async fn decode<T: DeserializeOwned>(resp: reqwest::Response) -> Result<T, ClientError> {
        let status = resp.status();
        if !status.is_success() {
            let body = resp.bytes().await.unwrap_or_default();
            return Err(ClientError::Api {
                status,
                message: extract_error_message(status, &body),
            });
        }

        resp.json::<T>().await.map_err(ClientError::Decode)
    }
}
