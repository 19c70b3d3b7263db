use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;

/// The pollable sensor series. Doubles as the whitelist for the `sensor`
/// query parameter; the column name is always taken from [`Self::column`],
/// never from raw user input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum SensorKind {
    Temperature,
    Humidity,
    Ph,
    Tds,
    LightIntensity,
    Co2,
    SoilMoisture,
    WaterLevel,
}

impl SensorKind {
    pub const ALL: [SensorKind; 8] = [
        SensorKind::Temperature,
        SensorKind::Humidity,
        SensorKind::Ph,
        SensorKind::Tds,
        SensorKind::LightIntensity,
        SensorKind::Co2,
        SensorKind::SoilMoisture,
        SensorKind::WaterLevel,
    ];

    /// Column of `sensor_readings` holding this series.
    pub fn column(&self) -> &'static str {
        match self {
            SensorKind::Temperature => "temperature",
            SensorKind::Humidity => "humidity",
            SensorKind::Ph => "ph",
            SensorKind::Tds => "tds",
            SensorKind::LightIntensity => "light_intensity",
            SensorKind::Co2 => "co2",
            SensorKind::SoilMoisture => "soil_moisture",
            SensorKind::WaterLevel => "water_level",
        }
    }
}

impl fmt::Display for SensorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.column())
    }
}

impl FromStr for SensorKind {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> anyhow::Result<Self> {
        SensorKind::ALL
            .into_iter()
            .find(|k| k.column() == s)
            .ok_or_else(|| anyhow::anyhow!("unknown sensor: {s:?}"))
    }
}

/// One wide reading row as reported by the ESP32. Immutable once received.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize, ToSchema)]
pub struct SensorReading {
    pub id: i64,
    #[serde(rename = "timestamp")]
    pub recorded_at: DateTime<Utc>,
    pub temperature: f64,
    pub humidity: f64,
    pub ph: f64,
    pub tds: f64,
    pub light_intensity: f64,
    pub co2: f64,
    pub soil_moisture: Option<f64>,
    pub water_level: Option<f64>,
}

impl SensorReading {
    /// Scalar value of one series within this row.
    pub fn value(&self, kind: SensorKind) -> Option<f64> {
        match kind {
            SensorKind::Temperature => Some(self.temperature),
            SensorKind::Humidity => Some(self.humidity),
            SensorKind::Ph => Some(self.ph),
            SensorKind::Tds => Some(self.tds),
            SensorKind::LightIntensity => Some(self.light_intensity),
            SensorKind::Co2 => Some(self.co2),
            SensorKind::SoilMoisture => self.soil_moisture,
            SensorKind::WaterLevel => self.water_level,
        }
    }
}

/// Latest actuator automation flags, states and threshold bands.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize, ToSchema)]
pub struct ControlSettings {
    pub id: i64,
    pub pump_auto: bool,
    pub fan_auto: bool,
    pub curtain_auto: bool,
    pub pump_status: bool,
    pub fan_status: bool,
    pub curtain_status: bool,
    pub temp_threshold_min: f64,
    pub temp_threshold_max: f64,
    pub humidity_threshold_min: f64,
    pub humidity_threshold_max: f64,
    pub ph_threshold_min: f64,
    pub ph_threshold_max: f64,
    pub updated_at: DateTime<Utc>,
}

/// Mirrors the `alert_severity` Postgres enum.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "alert_severity", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum AlertSeverity {
    Info,
    Warning,
    Critical,
}

#[derive(Debug, Clone, FromRow, Serialize, Deserialize, ToSchema)]
pub struct Alert {
    pub id: i64,
    #[serde(rename = "timestamp")]
    pub recorded_at: DateTime<Utc>,
    pub alert_type: String,
    pub message: String,
    pub severity: AlertSeverity,
}

/// Singleton connectivity/power row for the ESP32.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize, ToSchema)]
pub struct DeviceStatus {
    pub id: i64,
    pub esp32_connected: bool,
    pub last_heartbeat: Option<DateTime<Utc>>,
    pub battery_level: f64,
    pub solar_power: f64,
    pub updated_at: DateTime<Utc>,
}

/// A queued actuator command awaiting pickup by the device.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize, ToSchema)]
pub struct ControlCommand {
    pub id: i64,
    pub command: String,
    #[schema(value_type = Object)]
    pub value: Option<serde_json::Value>,
    pub issued_at: DateTime<Utc>,
    pub executed: bool,
    pub executed_at: Option<DateTime<Utc>>,
}
