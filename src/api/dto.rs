use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::errors::FieldErrors;
use crate::db::models::{DeviceStatus, SensorReading};

// ---------------------------------------------------------------------------
// Ingest
// ---------------------------------------------------------------------------

/// Request body for `POST /api/sensor-data`.
///
/// Every field is optional at the serde level so that a missing required
/// field produces a 422 field-error map instead of a bare decode failure.
#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct SensorDataPayload {
    pub temperature: Option<f64>,
    pub humidity: Option<f64>,
    pub ph: Option<f64>,
    pub tds: Option<f64>,
    pub light_intensity: Option<f64>,
    pub co2: Option<f64>,
    pub soil_moisture: Option<f64>,
    pub water_level: Option<f64>,
    pub battery_level: Option<f64>,
    pub solar_power: Option<f64>,
}

impl SensorDataPayload {
    const REQUIRED: [&'static str; 6] = [
        "temperature",
        "humidity",
        "ph",
        "tds",
        "light_intensity",
        "co2",
    ];

    fn field(&self, name: &str) -> Option<f64> {
        match name {
            "temperature" => self.temperature,
            "humidity" => self.humidity,
            "ph" => self.ph,
            "tds" => self.tds,
            "light_intensity" => self.light_intensity,
            "co2" => self.co2,
            "soil_moisture" => self.soil_moisture,
            "water_level" => self.water_level,
            "battery_level" => self.battery_level,
            "solar_power" => self.solar_power,
            _ => None,
        }
    }

    /// Validate the payload: required fields must be present, and every
    /// present field must be a finite number.
    pub fn validate(&self) -> Result<(), FieldErrors> {
        let mut errors = FieldErrors::new();

        for name in Self::REQUIRED {
            if self.field(name).is_none() {
                errors
                    .entry(name.to_owned())
                    .or_default()
                    .push(format!("Missing required field: {name}"));
            }
        }

        let all = [
            "temperature",
            "humidity",
            "ph",
            "tds",
            "light_intensity",
            "co2",
            "soil_moisture",
            "water_level",
            "battery_level",
            "solar_power",
        ];
        for name in all {
            if let Some(v) = self.field(name) {
                if !v.is_finite() {
                    errors
                        .entry(name.to_owned())
                        .or_default()
                        .push(format!("Field must be a finite number: {name}"));
                }
            }
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}

// ---------------------------------------------------------------------------
// Current data
// ---------------------------------------------------------------------------

/// Response for `GET /api/current-data`.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct CurrentDataResponse {
    pub sensor_data: Option<SensorReading>,
    pub device_status: Option<DeviceStatus>,
    pub timestamp: DateTime<Utc>,
}

// ---------------------------------------------------------------------------
// Historical data
// ---------------------------------------------------------------------------

/// One point of a single-series history query.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow, ToSchema)]
pub struct SeriesPoint {
    pub timestamp: DateTime<Utc>,
    pub value: f64,
}

/// `GET /api/historical-data` returns full rows, or bare `{timestamp, value}`
/// points when a `sensor` filter is given.
#[derive(Debug, Serialize, ToSchema)]
#[serde(untagged)]
pub enum HistoricalDataResponse {
    Series(Vec<SeriesPoint>),
    Full(Vec<SensorReading>),
}

// ---------------------------------------------------------------------------
// Statistics
// ---------------------------------------------------------------------------

/// Aggregate statistics for one sensor series over the queried window.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct SensorStats {
    pub avg: f64,
    pub min: f64,
    pub max: f64,
    pub data_points: i64,
}

// ---------------------------------------------------------------------------
// Controls
// ---------------------------------------------------------------------------

/// Partial update for `POST /api/controls`; absent fields keep their
/// current values.
#[derive(Debug, Default, Serialize, Deserialize, ToSchema)]
pub struct ControlSettingsUpdate {
    pub pump_auto: Option<bool>,
    pub fan_auto: Option<bool>,
    pub curtain_auto: Option<bool>,
    pub pump_status: Option<bool>,
    pub fan_status: Option<bool>,
    pub curtain_status: Option<bool>,
    pub temp_threshold_min: Option<f64>,
    pub temp_threshold_max: Option<f64>,
    pub humidity_threshold_min: Option<f64>,
    pub humidity_threshold_max: Option<f64>,
    pub ph_threshold_min: Option<f64>,
    pub ph_threshold_max: Option<f64>,
}

// ---------------------------------------------------------------------------
// Device commands
// ---------------------------------------------------------------------------

/// Request body for `POST /api/device-command`.
#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct DeviceCommandRequest {
    pub command: Option<String>,
    #[schema(value_type = Object)]
    pub value: Option<serde_json::Value>,
}

impl DeviceCommandRequest {
    pub fn validate(&self) -> Result<&str, FieldErrors> {
        match self.command.as_deref().filter(|c| !c.is_empty()) {
            Some(command) => Ok(command),
            None => {
                let mut errors = FieldErrors::new();
                errors
                    .entry("command".to_owned())
                    .or_default()
                    .push("Missing required field: command".to_owned());
                Err(errors)
            }
        }
    }
}
