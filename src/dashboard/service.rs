use std::collections::BTreeMap;

use chrono::Utc;
use tokio::time;
use tracing::{error, info, warn};

use crate::api::dto::CurrentDataResponse;
use crate::client::{fallback, GreenhouseClient};
use crate::config::PollIntervals;
use crate::db::models::SensorKind;
use crate::metrics::{classify, trend_summary, TrendSummary};

use super::{DashboardState, DataSource, Overview};

/// Window used for trend analysis: the last 6 hours, at most 50 points.
const TREND_HOURS: i64 = 6;
const TREND_LIMIT: i64 = 50;

const ALERTS_LIMIT: i64 = 50;

/// Drives the dashboard polling loops: each concern refreshes on its own
/// fixed interval and writes into the shared [`DashboardState`]. In-flight
/// fetches are not coordinated with the next tick; the snapshot is simply
/// last-write-wins.
pub struct DashboardService {
    client: GreenhouseClient,
    state: DashboardState,
    intervals: PollIntervals,
}

impl DashboardService {
    pub fn new(client: GreenhouseClient, state: DashboardState, intervals: PollIntervals) -> Self {
        Self {
            client,
            state,
            intervals,
        }
    }

    /// Runs all polling loops indefinitely. Spawn this via `tokio::spawn`.
    pub async fn run(self) {
        info!(
            overview_secs = self.intervals.overview.as_secs(),
            controls_secs = self.intervals.controls.as_secs(),
            trends_secs = self.intervals.trends.as_secs(),
            alerts_secs = self.intervals.alerts.as_secs(),
            "Dashboard polling loops started"
        );

        let overview_loop = async {
            let mut ticker = time::interval(self.intervals.overview);
            loop {
                ticker.tick().await;
                self.refresh_overview().await;
            }
        };
        let controls_loop = async {
            let mut ticker = time::interval(self.intervals.controls);
            loop {
                ticker.tick().await;
                self.refresh_controls().await;
            }
        };
        let trends_loop = async {
            let mut ticker = time::interval(self.intervals.trends);
            loop {
                ticker.tick().await;
                self.refresh_trends().await;
            }
        };
        let alerts_loop = async {
            let mut ticker = time::interval(self.intervals.alerts);
            loop {
                ticker.tick().await;
                self.refresh_alerts().await;
            }
        };

        tokio::join!(overview_loop, controls_loop, trends_loop, alerts_loop);
    }

    /// Fetch current data and derive per-sensor statuses. A connectivity
    /// failure substitutes the static fallback dataset; any other failure
    /// keeps the previous overview and surfaces the error message.
    pub async fn refresh_overview(&self) {
        match self.client.current_data().await {
            Ok(current) => {
                self.apply_overview(current, DataSource::Live).await;
                self.state.set_error(None).await;
            }
            Err(e) if e.is_connectivity() => {
                warn!(error = %e, "Server unreachable; using fallback data");
                self.apply_overview(fallback::current_data(), DataSource::Fallback)
                    .await;
                self.state
                    .set_error(Some("Using fallback data - Server not available".to_owned()))
                    .await;
            }
            Err(e) => {
                error!(error = %e, "Failed to fetch current data");
                self.state.set_error(Some(e.to_string())).await;
            }
        }
    }

    async fn apply_overview(&self, current: CurrentDataResponse, source: DataSource) {
        let Some(reading) = current.sensor_data else {
            // Nothing reported yet; keep whatever overview we had.
            return;
        };

        let bands = self.state.threshold_bands().await;
        let mut statuses = BTreeMap::new();
        for kind in SensorKind::ALL {
            if let Some(value) = reading.value(kind) {
                statuses.insert(kind, classify(value, bands.get(&kind)));
            }
        }

        self.state
            .set_overview(Overview {
                sensor_data: reading,
                device_status: current.device_status,
                statuses,
                source,
                fetched_at: Utc::now(),
            })
            .await;
    }

    /// Recompute the trend summary of every series over the recent window.
    /// Series that fail to fetch keep their previous summary.
    pub async fn refresh_trends(&self) {
        let mut trends: BTreeMap<SensorKind, TrendSummary> =
            self.state.snapshot().await.trends;

        for kind in SensorKind::ALL {
            match self
                .client
                .sensor_series(kind, TREND_HOURS, TREND_LIMIT)
                .await
            {
                Ok(points) => {
                    let values: Vec<f64> = points.iter().map(|p| p.value).collect();
                    trends.insert(kind, trend_summary(&values));
                }
                Err(e) => {
                    error!(sensor = %kind, error = %e, "Failed to fetch trend series");
                    self.state.set_error(Some(e.to_string())).await;
                }
            }
        }

        self.state.set_trends(trends).await;
    }

    pub async fn refresh_controls(&self) {
        match self.client.control_settings().await {
            Ok(Some(settings)) => self.state.set_controls(settings).await,
            Ok(None) => warn!("Server has no control settings row yet"),
            Err(e) if e.is_connectivity() => {
                warn!(error = %e, "Server unreachable; using fallback control settings");
                self.state.set_controls(fallback::control_settings()).await;
                self.state
                    .set_error(Some("Using fallback data - Server not available".to_owned()))
                    .await;
            }
            Err(e) => {
                error!(error = %e, "Failed to fetch control settings");
                self.state.set_error(Some(e.to_string())).await;
            }
        }
    }

    pub async fn refresh_alerts(&self) {
        match self.client.alerts(ALERTS_LIMIT).await {
            Ok(alerts) => self.state.set_alerts(alerts).await,
            Err(e) if e.is_connectivity() => {
                warn!(error = %e, "Server unreachable; using fallback alerts");
                self.state.set_alerts(fallback::alerts()).await;
            }
            Err(e) => {
                error!(error = %e, "Failed to fetch alerts");
                self.state.set_error(Some(e.to_string())).await;
            }
        }
    }
}
