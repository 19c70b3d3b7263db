use std::time::Duration;

use sqlx::PgPool;
use tokio::time;
use tracing::{error, info};

/// Background watchdog that flips `device_status.esp32_connected` off once
/// the heartbeat goes stale. Ingest flips it back on.
pub struct ConnectivityService {
    pool: PgPool,
    interval: Duration,
    stale_after: Duration,
}

impl ConnectivityService {
    pub fn new(pool: PgPool, interval_secs: u64, stale_secs: u64) -> Self {
        Self {
            pool,
            interval: Duration::from_secs(interval_secs),
            stale_after: Duration::from_secs(stale_secs),
        }
    }

    /// Runs the watchdog loop indefinitely.
    /// Spawn this via `tokio::spawn`.
    pub async fn run(self) {
        info!(
            interval_secs = self.interval.as_secs(),
            stale_secs = self.stale_after.as_secs(),
            "Connectivity watchdog started"
        );
        let mut ticker = time::interval(self.interval);

        loop {
            ticker.tick().await;
            if let Err(e) = self.run_once().await {
                error!(error = %e, "Connectivity check failed");
            }
        }
    }

    async fn run_once(&self) -> anyhow::Result<()> {
        let result = sqlx::query(
            r#"
            UPDATE device_status SET
                esp32_connected = (last_heartbeat IS NOT NULL
                                   AND last_heartbeat >= now() - $1::interval),
                updated_at = now()
            WHERE esp32_connected IS DISTINCT FROM
                  (last_heartbeat IS NOT NULL
                   AND last_heartbeat >= now() - $1::interval)
            "#,
        )
        .bind(format!("{} seconds", self.stale_after.as_secs()))
        .execute(&self.pool)
        .await?;

        if result.rows_affected() > 0 {
            info!(
                rows = result.rows_affected(),
                "Device connectivity state changed"
            );
        }

        Ok(())
    }
}
