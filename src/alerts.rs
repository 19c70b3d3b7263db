//! Threshold alerting on ingest: classify the new reading against the
//! configured bands and log an alert row per out-of-band value.

use anyhow::Result;
use sqlx::PgPool;
use tracing::info;

use crate::db::models::{AlertSeverity, ControlSettings, SensorReading};
use crate::metrics::{classify, Status, ThresholdBand};

/// Check `reading` against the latest control settings and insert one alert
/// per out-of-band value. Returns quietly when no settings row exists yet.
pub async fn check_thresholds(pool: &PgPool, reading: &SensorReading) -> Result<()> {
    let Some(settings) = sqlx::query_as::<_, ControlSettings>(
        "SELECT * FROM control_settings ORDER BY id DESC LIMIT 1",
    )
    .fetch_optional(pool)
    .await?
    else {
        return Ok(());
    };

    for alert in threshold_alerts(reading, &settings) {
        sqlx::query("INSERT INTO alerts (alert_type, message, severity) VALUES ($1, $2, $3)")
            .bind(&alert.alert_type)
            .bind(&alert.message)
            .bind(alert.severity)
            .execute(pool)
            .await?;

        info!(
            alert_type = %alert.alert_type,
            severity = ?alert.severity,
            "Threshold alert raised"
        );
    }

    Ok(())
}

#[derive(Debug, PartialEq)]
pub struct ThresholdAlert {
    pub alert_type: String,
    pub message: String,
    pub severity: AlertSeverity,
}

/// Evaluate the monitored values against their bands. Severity comes
/// straight from the classifier: warning for a band violation, critical
/// once the value passes 0.8×min / 1.2×max.
pub fn threshold_alerts(reading: &SensorReading, settings: &ControlSettings) -> Vec<ThresholdAlert> {
    let checks = [
        (
            "TEMPERATURE",
            reading.temperature,
            ThresholdBand::new(settings.temp_threshold_min, settings.temp_threshold_max),
            "°C",
        ),
        (
            "HUMIDITY",
            reading.humidity,
            ThresholdBand::new(
                settings.humidity_threshold_min,
                settings.humidity_threshold_max,
            ),
            "%",
        ),
        (
            "PH",
            reading.ph,
            ThresholdBand::new(settings.ph_threshold_min, settings.ph_threshold_max),
            "",
        ),
    ];

    let mut alerts = Vec::new();
    for (alert_type, value, band, unit) in checks {
        let severity = match classify(value, Some(&band)) {
            Status::Normal => continue,
            Status::Warning => AlertSeverity::Warning,
            Status::Critical => AlertSeverity::Critical,
        };

        let direction = if value < band.min { "too low" } else { "too high" };
        alerts.push(ThresholdAlert {
            alert_type: alert_type.to_owned(),
            message: format!("{} {direction}: {value}{unit}", titlecase(alert_type)),
            severity,
        });
    }
    alerts
}

fn titlecase(s: &str) -> String {
    let lower = s.to_lowercase();
    let mut chars = lower.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
        None => lower,
    }
}
