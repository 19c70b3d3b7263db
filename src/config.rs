use std::time::Duration;

use anyhow::{Context, Result};

// ---------------------------------------------------------------------------
// Server config
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub server_host: String,
    pub server_port: u16,
    /// Heartbeat age after which the ESP32 is marked disconnected.
    pub heartbeat_stale_secs: u64,
    /// Connectivity watchdog interval in seconds.
    pub connectivity_interval_secs: u64,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Ok(Self {
            database_url: required("DATABASE_URL")?,
            server_host: optional("SERVER_HOST", "0.0.0.0"),
            server_port: optional("SERVER_PORT", "5000")
                .parse()
                .context("SERVER_PORT must be a valid port number")?,
            heartbeat_stale_secs: parse_secs("HEARTBEAT_STALE_SECS", "300")?,
            connectivity_interval_secs: parse_secs("CONNECTIVITY_INTERVAL_SECS", "60")?,
        })
    }
}

// ---------------------------------------------------------------------------
// Dashboard config
// ---------------------------------------------------------------------------

/// Refresh cadence for each dashboard concern. Screens poll anywhere from
/// 5 s (controls) to 120 s (alerts).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollIntervals {
    pub overview: Duration,
    pub controls: Duration,
    pub trends: Duration,
    pub alerts: Duration,
}

impl Default for PollIntervals {
    fn default() -> Self {
        Self {
            overview: Duration::from_secs(30),
            controls: Duration::from_secs(5),
            trends: Duration::from_secs(60),
            alerts: Duration::from_secs(120),
        }
    }
}

#[derive(Debug, Clone)]
pub struct DashboardConfig {
    /// Base URL of the backend, e.g. `http://192.168.1.100:5000`.
    pub server_url: String,
    pub intervals: PollIntervals,
}

impl DashboardConfig {
    pub fn from_env() -> Result<Self> {
        Ok(Self {
            server_url: required("SERVER_URL")?,
            intervals: PollIntervals {
                overview: Duration::from_secs(parse_secs("OVERVIEW_INTERVAL_SECS", "30")?),
                controls: Duration::from_secs(parse_secs("CONTROLS_INTERVAL_SECS", "5")?),
                trends: Duration::from_secs(parse_secs("TRENDS_INTERVAL_SECS", "60")?),
                alerts: Duration::from_secs(parse_secs("ALERTS_INTERVAL_SECS", "120")?),
            },
        })
    }
}

// ---------------------------------------------------------------------------
// Env helpers
// ---------------------------------------------------------------------------

fn parse_secs(key: &str, default: &str) -> Result<u64> {
    let raw = optional(key, default);
    parse_positive_secs(key, &raw)
}

/// Parse a strictly positive seconds value; zero would make a
/// `tokio::time::interval` tick as fast as it can.
fn parse_positive_secs(key: &str, raw: &str) -> Result<u64> {
    let secs: u64 = raw
        .parse()
        .with_context(|| format!("{key} must be a positive integer, got: {raw:?}"))?;
    anyhow::ensure!(secs > 0, "{key} must be greater than zero");
    Ok(secs)
}

fn required(key: &str) -> Result<String> {
    std::env::var(key).with_context(|| format!("missing required env var: {key}"))
}

fn optional(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_owned())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_positive_secs_accepts_plain_integers() {
        assert_eq!(parse_positive_secs("X", "30").unwrap(), 30);
        assert_eq!(parse_positive_secs("X", "1").unwrap(), 1);
    }

    #[test]
    fn parse_positive_secs_rejects_zero() {
        let err = parse_positive_secs("POLL", "0").unwrap_err();
        assert!(err.to_string().contains("greater than zero"));
    }

    #[test]
    fn parse_positive_secs_rejects_garbage() {
        let err = parse_positive_secs("POLL", "5s").unwrap_err();
        assert!(err.to_string().contains("positive integer"));
    }

    #[test]
    fn default_intervals_span_five_to_hundred_twenty_seconds() {
        let i = PollIntervals::default();
        assert_eq!(i.controls, Duration::from_secs(5));
        assert_eq!(i.overview, Duration::from_secs(30));
        assert_eq!(i.trends, Duration::from_secs(60));
        assert_eq!(i.alerts, Duration::from_secs(120));
    }
}
