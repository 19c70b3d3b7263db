//! Headless dashboard poller: fetches the greenhouse API on fixed
//! intervals, derives statuses and trends, and logs each snapshot.
//!
//! Usage:
//!   SERVER_URL=http://192.168.1.100:5000 cargo run --bin dashboard

use anyhow::Result;
use tokio::{signal, time};
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use terraponix_service::{
    client::GreenhouseClient,
    config::DashboardConfig,
    dashboard::{DashboardService, DashboardState, DataSource},
};

#[tokio::main]
async fn main() -> Result<()> {
    let _ = dotenvy::dotenv();

    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(EnvFilter::from_default_env())
        .init();

    let config = DashboardConfig::from_env()?;
    info!(server_url = %config.server_url, "Dashboard starting");

    let client = GreenhouseClient::new(&config.server_url)?;
    let state = DashboardState::new();

    let service = DashboardService::new(client, state.clone(), config.intervals);
    tokio::spawn(service.run());

    // Log a snapshot summary on the overview cadence until interrupted.
    let mut ticker = time::interval(config.intervals.overview);
    loop {
        tokio::select! {
            _ = ticker.tick() => log_snapshot(&state).await,
            _ = signal::ctrl_c() => break,
        }
    }

    info!("Dashboard stopped");
    Ok(())
}

async fn log_snapshot(state: &DashboardState) {
    let snap = state.snapshot().await;

    match &snap.overview {
        Some(overview) => {
            let r = &overview.sensor_data;
            info!(
                source = ?overview.source,
                temperature = r.temperature,
                humidity = r.humidity,
                ph = r.ph,
                tds = r.tds,
                light_intensity = r.light_intensity,
                co2 = r.co2,
                statuses = ?overview.statuses,
                "Overview"
            );
            if overview.source == DataSource::Fallback {
                info!("Showing fallback data while the server is unreachable");
            }
        }
        None => info!("No overview fetched yet"),
    }

    for (kind, trend) in &snap.trends {
        info!(
            sensor = %kind,
            direction = ?trend.direction,
            percent_change = trend.percent_change,
            average = trend.average,
            "Trend"
        );
    }

    if !snap.alerts.is_empty() {
        info!(count = snap.alerts.len(), latest = %snap.alerts[0].message, "Alerts");
    }

    if let Some(error) = &snap.last_error {
        info!(error = %error, "Last fetch error");
    }
}
