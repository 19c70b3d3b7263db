pub mod service;

pub use service::DashboardService;

use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use tokio::sync::RwLock;

use crate::db::models::{Alert, ControlSettings, DeviceStatus, SensorKind, SensorReading};
use crate::metrics::{Status, ThresholdBand, TrendSummary};

/// Where the current overview came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DataSource {
    Live,
    /// Static substitute used while the server is unreachable.
    Fallback,
}

/// Latest reading plus the statuses derived from it.
#[derive(Debug, Clone)]
pub struct Overview {
    pub sensor_data: SensorReading,
    pub device_status: Option<DeviceStatus>,
    pub statuses: BTreeMap<SensorKind, Status>,
    pub source: DataSource,
    pub fetched_at: DateTime<Utc>,
}

/// Everything the dashboard screens render, refreshed piecemeal by the
/// polling loops. Derived fields are recomputed on every fetch.
#[derive(Debug, Clone, Default)]
pub struct Snapshot {
    pub overview: Option<Overview>,
    pub trends: BTreeMap<SensorKind, TrendSummary>,
    pub alerts: Vec<Alert>,
    pub controls: Option<ControlSettings>,
    pub last_error: Option<String>,
}

/// Shared dashboard state. Wrapped in `Arc` so it can be cheaply cloned
/// across the polling loops; `tokio::sync::RwLock` keeps readers concurrent.
/// Writes are last-write-wins; overlapping ticks are not coordinated.
#[derive(Clone, Default)]
pub struct DashboardState {
    inner: Arc<RwLock<Snapshot>>,
}

impl DashboardState {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn snapshot(&self) -> Snapshot {
        self.inner.read().await.clone()
    }

    pub async fn set_overview(&self, overview: Overview) {
        self.inner.write().await.overview = Some(overview);
    }

    pub async fn set_trends(&self, trends: BTreeMap<SensorKind, TrendSummary>) {
        self.inner.write().await.trends = trends;
    }

    pub async fn set_alerts(&self, alerts: Vec<Alert>) {
        self.inner.write().await.alerts = alerts;
    }

    pub async fn set_controls(&self, controls: ControlSettings) {
        self.inner.write().await.controls = Some(controls);
    }

    pub async fn set_error(&self, message: Option<String>) {
        self.inner.write().await.last_error = message;
    }

    /// Threshold bands from the last fetched control settings. Sensors
    /// without a configured band classify as normal.
    pub async fn threshold_bands(&self) -> BTreeMap<SensorKind, ThresholdBand> {
        let guard = self.inner.read().await;
        match &guard.controls {
            Some(settings) => bands_from_settings(settings),
            None => BTreeMap::new(),
        }
    }
}

pub(crate) fn bands_from_settings(
    settings: &ControlSettings,
) -> BTreeMap<SensorKind, ThresholdBand> {
    BTreeMap::from([
        (
            SensorKind::Temperature,
            ThresholdBand::new(settings.temp_threshold_min, settings.temp_threshold_max),
        ),
        (
            SensorKind::Humidity,
            ThresholdBand::new(
                settings.humidity_threshold_min,
                settings.humidity_threshold_max,
            ),
        ),
        (
            SensorKind::Ph,
            ThresholdBand::new(settings.ph_threshold_min, settings.ph_threshold_max),
        ),
    ])
}
