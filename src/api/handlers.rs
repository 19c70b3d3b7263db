use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use chrono::{DateTime, Duration, Utc};
use serde::Deserialize;
use serde_json::json;
use sqlx::PgPool;
use tracing::{info, warn};
use utoipa::OpenApi;

use super::{
    dto::{
        ControlSettingsUpdate, CurrentDataResponse, DeviceCommandRequest, HistoricalDataResponse,
        SensorDataPayload, SensorStats, SeriesPoint,
    },
    errors::{AppError, FieldErrors},
};
use crate::alerts;
use crate::db::models::{
    Alert, AlertSeverity, ControlCommand, ControlSettings, DeviceStatus, SensorKind, SensorReading,
};
use crate::metrics::{Status, ThresholdBand, TrendDirection, TrendSummary};

// ---------------------------------------------------------------------------
// Query parameters
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
pub struct HistoryParams {
    pub hours: Option<i64>,
    pub limit: Option<i64>,
    pub sensor: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct StatsParams {
    pub hours: Option<i64>,
}

#[derive(Debug, Deserialize)]
pub struct AlertsParams {
    pub limit: Option<i64>,
}

/// `Duration::hours` panics on out-of-range values; look-back windows are
/// clamped to a year before one is constructed.
const MAX_WINDOW_HOURS: i64 = 24 * 365;

fn window_start(hours: Option<i64>) -> DateTime<Utc> {
    Utc::now() - Duration::hours(hours.unwrap_or(24).clamp(0, MAX_WINDOW_HOURS))
}

// ---------------------------------------------------------------------------
// Ingest
// ---------------------------------------------------------------------------

/// Receive one sensor report from the ESP32: validate, insert, refresh the
/// device heartbeat and run the threshold alert check.
#[utoipa::path(
    post,
    path = "/api/sensor-data",
    request_body = SensorDataPayload,
    responses(
        (status = 200, description = "Reading stored"),
        (status = 422, description = "Validation failed, with per-field error map"),
        (status = 500, description = "Internal server error"),
    ),
    tag = "sensors"
)]
pub async fn receive_sensor_data(
    State(pool): State<PgPool>,
    Json(payload): Json<SensorDataPayload>,
) -> Result<Json<serde_json::Value>, AppError> {
    payload.validate().map_err(AppError::validation)?;

    let reading = sqlx::query_as::<_, SensorReading>(
        r#"
        INSERT INTO sensor_readings
            (temperature, humidity, ph, tds, light_intensity, co2, soil_moisture, water_level)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
        RETURNING *
        "#,
    )
    .bind(payload.temperature)
    .bind(payload.humidity)
    .bind(payload.ph)
    .bind(payload.tds)
    .bind(payload.light_intensity)
    .bind(payload.co2)
    .bind(payload.soil_moisture)
    .bind(payload.water_level)
    .fetch_one(&pool)
    .await?;

    sqlx::query(
        r#"
        UPDATE device_status SET
            esp32_connected = TRUE,
            last_heartbeat = now(),
            battery_level = COALESCE($1, battery_level),
            solar_power = COALESCE($2, solar_power),
            updated_at = now()
        WHERE id = (SELECT min(id) FROM device_status)
        "#,
    )
    .bind(payload.battery_level)
    .bind(payload.solar_power)
    .execute(&pool)
    .await?;

    // Alerting rides along with ingest but must never fail it.
    if let Err(e) = alerts::check_thresholds(&pool, &reading).await {
        warn!(error = %e, "Threshold alert check failed");
    }

    info!(reading_id = reading.id, "Sensor reading stored");
    Ok(Json(json!({
        "status": "success",
        "message": "Data received successfully"
    })))
}

// ---------------------------------------------------------------------------
// Current data
// ---------------------------------------------------------------------------

/// Latest sensor reading plus the device connectivity row.
#[utoipa::path(
    get,
    path = "/api/current-data",
    responses(
        (status = 200, description = "Current sensor data and device status", body = CurrentDataResponse),
        (status = 500, description = "Internal server error"),
    ),
    tag = "sensors"
)]
pub async fn get_current_data(
    State(pool): State<PgPool>,
) -> Result<Json<CurrentDataResponse>, AppError> {
    let sensor_data = sqlx::query_as::<_, SensorReading>(
        "SELECT * FROM sensor_readings ORDER BY recorded_at DESC LIMIT 1",
    )
    .fetch_optional(&pool)
    .await?;

    let device_status = sqlx::query_as::<_, DeviceStatus>(
        "SELECT * FROM device_status ORDER BY id ASC LIMIT 1",
    )
    .fetch_optional(&pool)
    .await?;

    Ok(Json(CurrentDataResponse {
        sensor_data,
        device_status,
        timestamp: Utc::now(),
    }))
}

// ---------------------------------------------------------------------------
// Historical data
// ---------------------------------------------------------------------------

/// Time-series readings for charts. `?sensor=` narrows the response to
/// `{timestamp, value}` points for one series; otherwise full rows are
/// returned. Ascending by time; defaults `hours=24`, `limit=100`.
#[utoipa::path(
    get,
    path = "/api/historical-data",
    params(
        ("hours" = Option<i64>, Query, description = "Look-back window in hours (default 24)"),
        ("limit" = Option<i64>, Query, description = "Maximum rows (default 100)"),
        ("sensor" = Option<String>, Query, description = "Restrict to one sensor series"),
    ),
    responses(
        (status = 200, description = "Readings in ascending time order", body = HistoricalDataResponse),
        (status = 422, description = "Unknown sensor name"),
        (status = 500, description = "Internal server error"),
    ),
    tag = "sensors"
)]
pub async fn get_historical_data(
    State(pool): State<PgPool>,
    Query(params): Query<HistoryParams>,
) -> Result<Json<HistoricalDataResponse>, AppError> {
    let limit = params.limit.unwrap_or(100).max(0);
    let since = window_start(params.hours);

    let kind = match params.sensor.as_deref() {
        Some(raw) => Some(parse_sensor_kind(raw)?),
        None => None,
    };

    let response = match kind {
        Some(kind) => {
            // Column name comes from the SensorKind whitelist, never from
            // the raw query string.
            let col = kind.column();
            let sql = format!(
                r#"
                SELECT recorded_at AS "timestamp", {col} AS value
                FROM sensor_readings
                WHERE recorded_at >= $1 AND {col} IS NOT NULL
                ORDER BY recorded_at ASC
                LIMIT $2
                "#
            );
            let points = sqlx::query_as::<_, SeriesPoint>(&sql)
                .bind(since)
                .bind(limit)
                .fetch_all(&pool)
                .await?;
            HistoricalDataResponse::Series(points)
        }
        None => {
            let rows = sqlx::query_as::<_, SensorReading>(
                r#"
                SELECT * FROM sensor_readings
                WHERE recorded_at >= $1
                ORDER BY recorded_at ASC
                LIMIT $2
                "#,
            )
            .bind(since)
            .bind(limit)
            .fetch_all(&pool)
            .await?;
            HistoricalDataResponse::Full(rows)
        }
    };

    Ok(Json(response))
}

fn parse_sensor_kind(raw: &str) -> Result<SensorKind, AppError> {
    raw.parse::<SensorKind>().map_err(|_| {
        let mut errors = FieldErrors::new();
        errors
            .entry("sensor".to_owned())
            .or_default()
            .push(format!("Unknown sensor: {raw}"));
        AppError::validation(errors)
    })
}

// ---------------------------------------------------------------------------
// Statistics
// ---------------------------------------------------------------------------

/// Per-series `{avg, min, max, data_points}` over the queried window.
/// Series with no data report zeroes.
#[utoipa::path(
    get,
    path = "/api/sensor-stats",
    params(
        ("hours" = Option<i64>, Query, description = "Look-back window in hours (default 24)"),
    ),
    responses(
        (status = 200, description = "Statistics keyed by sensor name", body = Object),
        (status = 500, description = "Internal server error"),
    ),
    tag = "sensors"
)]
pub async fn get_sensor_stats(
    State(pool): State<PgPool>,
    Query(params): Query<StatsParams>,
) -> Result<Json<std::collections::BTreeMap<SensorKind, SensorStats>>, AppError> {
    let since = window_start(params.hours);

    let mut stats = std::collections::BTreeMap::new();
    for kind in SensorKind::ALL {
        let col = kind.column();
        let sql = format!(
            r#"
            SELECT COALESCE(AVG({col}), 0)::double precision,
                   COALESCE(MIN({col}), 0)::double precision,
                   COALESCE(MAX({col}), 0)::double precision,
                   COUNT({col})
            FROM sensor_readings
            WHERE recorded_at >= $1 AND {col} IS NOT NULL
            "#
        );
        let (avg, min, max, data_points) = sqlx::query_as::<_, (f64, f64, f64, i64)>(&sql)
            .bind(since)
            .fetch_one(&pool)
            .await?;

        stats.insert(
            kind,
            SensorStats {
                avg,
                min,
                max,
                data_points,
            },
        );
    }

    Ok(Json(stats))
}

// ---------------------------------------------------------------------------
// Controls
// ---------------------------------------------------------------------------

/// Current control settings (latest row).
#[utoipa::path(
    get,
    path = "/api/controls",
    responses(
        (status = 200, description = "Current control settings", body = ControlSettings),
        (status = 500, description = "Internal server error"),
    ),
    tag = "controls"
)]
pub async fn get_controls(
    State(pool): State<PgPool>,
) -> Result<Json<Option<ControlSettings>>, AppError> {
    let settings = sqlx::query_as::<_, ControlSettings>(
        "SELECT * FROM control_settings ORDER BY id DESC LIMIT 1",
    )
    .fetch_optional(&pool)
    .await?;

    Ok(Json(settings))
}

/// Partial update of the control settings; absent fields keep their
/// current values.
#[utoipa::path(
    post,
    path = "/api/controls",
    request_body = ControlSettingsUpdate,
    responses(
        (status = 200, description = "Settings updated"),
        (status = 500, description = "Internal server error"),
    ),
    tag = "controls"
)]
pub async fn update_controls(
    State(pool): State<PgPool>,
    Json(update): Json<ControlSettingsUpdate>,
) -> Result<Json<serde_json::Value>, AppError> {
    sqlx::query(
        r#"
        UPDATE control_settings SET
            pump_auto = COALESCE($1, pump_auto),
            fan_auto = COALESCE($2, fan_auto),
            curtain_auto = COALESCE($3, curtain_auto),
            pump_status = COALESCE($4, pump_status),
            fan_status = COALESCE($5, fan_status),
            curtain_status = COALESCE($6, curtain_status),
            temp_threshold_min = COALESCE($7, temp_threshold_min),
            temp_threshold_max = COALESCE($8, temp_threshold_max),
            humidity_threshold_min = COALESCE($9, humidity_threshold_min),
            humidity_threshold_max = COALESCE($10, humidity_threshold_max),
            ph_threshold_min = COALESCE($11, ph_threshold_min),
            ph_threshold_max = COALESCE($12, ph_threshold_max),
            updated_at = now()
        WHERE id = (SELECT max(id) FROM control_settings)
        "#,
    )
    .bind(update.pump_auto)
    .bind(update.fan_auto)
    .bind(update.curtain_auto)
    .bind(update.pump_status)
    .bind(update.fan_status)
    .bind(update.curtain_status)
    .bind(update.temp_threshold_min)
    .bind(update.temp_threshold_max)
    .bind(update.humidity_threshold_min)
    .bind(update.humidity_threshold_max)
    .bind(update.ph_threshold_min)
    .bind(update.ph_threshold_max)
    .execute(&pool)
    .await?;

    info!("Control settings updated");
    Ok(Json(json!({
        "status": "success",
        "message": "Controls updated successfully"
    })))
}

// ---------------------------------------------------------------------------
// Alerts
// ---------------------------------------------------------------------------

/// Recent alerts, newest first. Default limit 50.
#[utoipa::path(
    get,
    path = "/api/alerts",
    params(
        ("limit" = Option<i64>, Query, description = "Maximum rows (default 50)"),
    ),
    responses(
        (status = 200, description = "Alerts ordered newest first", body = Vec<Alert>),
        (status = 500, description = "Internal server error"),
    ),
    tag = "alerts"
)]
pub async fn get_alerts(
    State(pool): State<PgPool>,
    Query(params): Query<AlertsParams>,
) -> Result<Json<Vec<Alert>>, AppError> {
    let limit = params.limit.unwrap_or(50).max(0);

    let alerts = sqlx::query_as::<_, Alert>(
        "SELECT * FROM alerts ORDER BY recorded_at DESC LIMIT $1",
    )
    .bind(limit)
    .fetch_all(&pool)
    .await?;

    Ok(Json(alerts))
}

// ---------------------------------------------------------------------------
// Device commands
// ---------------------------------------------------------------------------

/// Queue a command for the ESP32 to pick up on its next poll.
#[utoipa::path(
    post,
    path = "/api/device-command",
    request_body = DeviceCommandRequest,
    responses(
        (status = 200, description = "Command queued", body = Object),
        (status = 422, description = "Missing command"),
        (status = 500, description = "Internal server error"),
    ),
    tag = "controls"
)]
pub async fn send_device_command(
    State(pool): State<PgPool>,
    Json(request): Json<DeviceCommandRequest>,
) -> Result<Json<serde_json::Value>, AppError> {
    let command = request.validate().map_err(AppError::validation)?.to_owned();

    let queued = sqlx::query_as::<_, ControlCommand>(
        r#"
        INSERT INTO control_commands (command, value)
        VALUES ($1, $2)
        RETURNING *
        "#,
    )
    .bind(&command)
    .bind(&request.value)
    .fetch_one(&pool)
    .await?;

    info!(command = %command, "Device command queued");
    Ok(Json(json!({
        "status": "success",
        "message": format!("Command {command} queued successfully"),
        "command": queued,
    })))
}

/// Drain pending commands: return them oldest first and mark them executed.
/// A single UPDATE .. RETURNING does both, so a command is either returned
/// by exactly one drain or still pending for the next one.
#[utoipa::path(
    get,
    path = "/api/device-command",
    responses(
        (status = 200, description = "Pending commands, oldest first", body = Object),
        (status = 500, description = "Internal server error"),
    ),
    tag = "controls"
)]
pub async fn pending_device_commands(
    State(pool): State<PgPool>,
) -> Result<Json<serde_json::Value>, AppError> {
    let commands = sqlx::query_as::<_, ControlCommand>(
        r#"
        WITH drained AS (
            UPDATE control_commands
            SET executed = TRUE, executed_at = now()
            WHERE NOT executed
            RETURNING *
        )
        SELECT * FROM drained
        ORDER BY issued_at ASC
        "#,
    )
    .fetch_all(&pool)
    .await?;

    Ok(Json(json!({
        "status": "success",
        "commands": commands,
    })))
}

// ---------------------------------------------------------------------------
// Health check
// ---------------------------------------------------------------------------

/// Health check: verifies the database connection.
#[utoipa::path(
    get,
    path = "/api/health",
    responses(
        (status = 200, description = "Service and database are healthy"),
        (status = 500, description = "Database unreachable"),
    ),
    tag = "system"
)]
pub async fn health(State(pool): State<PgPool>) -> impl IntoResponse {
    match sqlx::query_scalar::<_, i32>("SELECT 1").fetch_one(&pool).await {
        Ok(_) => (
            StatusCode::OK,
            Json(json!({
                "status": "healthy",
                "database": "connected",
                "timestamp": Utc::now(),
                "version": env!("CARGO_PKG_VERSION"),
            })),
        ),
        Err(e) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({
                "status": "unhealthy",
                "database": "disconnected",
                "error": e.to_string(),
                "timestamp": Utc::now(),
            })),
        ),
    }
}

// ---------------------------------------------------------------------------
// OpenAPI spec
// ---------------------------------------------------------------------------

#[derive(OpenApi)]
#[openapi(
    paths(
        receive_sensor_data,
        get_current_data,
        get_historical_data,
        get_sensor_stats,
        get_controls,
        update_controls,
        get_alerts,
        send_device_command,
        pending_device_commands,
        health,
    ),
    components(schemas(
        SensorDataPayload,
        SensorReading,
        SensorKind,
        CurrentDataResponse,
        SeriesPoint,
        SensorStats,
        ControlSettings,
        ControlSettingsUpdate,
        Alert,
        AlertSeverity,
        DeviceStatus,
        DeviceCommandRequest,
        ControlCommand,
        Status,
        ThresholdBand,
        TrendDirection,
        TrendSummary,
    )),
    tags(
        (name = "sensors", description = "Sensor ingest and query endpoints"),
        (name = "controls", description = "Control settings and device commands"),
        (name = "alerts", description = "Threshold alert log"),
        (name = "system", description = "System endpoints"),
    ),
    info(
        title = "Terraponix Greenhouse API",
        version = "0.1.0",
        description = "REST API for greenhouse sensor data, controls and alerts"
    )
)]
pub struct ApiDoc;

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use axum::http::StatusCode;
    use axum_test::TestServer;
    use chrono::{Duration, Utc};
    use serde_json::{json, Value};
    use sqlx::PgPool;

    use super::window_start;
    use crate::api::router;
    use crate::db;

    /// Pool that never connects; only routes that fail or return before
    /// touching the database are exercised here.
    fn offline_pool() -> PgPool {
        db::connect_lazy("postgres://postgres@127.0.0.1:1/terraponix_test").unwrap()
    }

    fn test_server() -> TestServer {
        TestServer::new(router(offline_pool())).unwrap()
    }

    #[tokio::test]
    async fn sensor_data_with_missing_fields_returns_422() {
        let server = test_server();
        let resp = server
            .post("/api/sensor-data")
            .json(&json!({ "temperature": 25.5, "humidity": 60.0 }))
            .await;
        resp.assert_status(StatusCode::UNPROCESSABLE_ENTITY);

        let body: Value = resp.json();
        assert_eq!(body["status"], "error");
        assert!(body["errors"]["ph"].is_array());
        assert!(body["errors"]["co2"].is_array());
        assert!(body["errors"].get("temperature").is_none());
    }

    #[tokio::test]
    async fn sensor_data_with_nan_returns_422() {
        // JSON has no NaN literal; a string in a numeric field is the
        // closest wire-level equivalent and must also be rejected.
        let server = test_server();
        let resp = server
            .post("/api/sensor-data")
            .json(&json!({
                "temperature": 25.5, "humidity": 60.0, "ph": 6.0,
                "tds": 800.0, "light_intensity": 70.0, "co2": "high"
            }))
            .await;
        assert!(resp.status_code().is_client_error());
    }

    #[tokio::test]
    async fn historical_data_with_unknown_sensor_returns_422() {
        let server = test_server();
        let resp = server
            .get("/api/historical-data")
            .add_query_param("sensor", "voltage")
            .await;
        resp.assert_status(StatusCode::UNPROCESSABLE_ENTITY);

        let body: Value = resp.json();
        assert!(body["errors"]["sensor"][0]
            .as_str()
            .unwrap()
            .contains("Unknown sensor"));
    }

    #[tokio::test]
    async fn device_command_without_command_returns_422() {
        let server = test_server();
        let resp = server
            .post("/api/device-command")
            .json(&json!({ "value": true }))
            .await;
        resp.assert_status(StatusCode::UNPROCESSABLE_ENTITY);

        let body: Value = resp.json();
        assert!(body["errors"]["command"].is_array());
    }

    #[tokio::test]
    async fn health_reports_unhealthy_when_database_is_down() {
        let server = test_server();
        let resp = server.get("/api/health").await;
        resp.assert_status(StatusCode::INTERNAL_SERVER_ERROR);

        let body: Value = resp.json();
        assert_eq!(body["status"], "unhealthy");
        assert_eq!(body["database"], "disconnected");
    }

    #[tokio::test]
    async fn openapi_spec_is_served() {
        let server = test_server();
        let resp = server.get("/api-docs/openapi.json").await;
        resp.assert_status_ok();

        let body: Value = resp.json();
        assert_eq!(body["info"]["title"], "Terraponix Greenhouse API");
        assert!(body["paths"]["/api/sensor-data"].is_object());
        assert!(body["paths"]["/api/device-command"].is_object());
    }

    #[test]
    fn window_start_clamps_out_of_range_hours() {
        let year_ago = Utc::now() - Duration::days(365);
        let earliest = window_start(Some(i64::MAX));
        assert!((earliest - year_ago).num_hours().abs() < 2);

        let negative = window_start(Some(-5));
        assert!((Utc::now() - negative).num_hours() < 1);
    }

    // -----------------------------------------------------------------------
    // Database-backed tests (need a running Postgres at test time)
    // -----------------------------------------------------------------------

    fn live_server(pool: PgPool) -> TestServer {
        TestServer::new(router(pool)).unwrap()
    }

    fn esp32_report(temperature: f64) -> Value {
        json!({
            "temperature": temperature, "humidity": 60.0, "ph": 6.0,
            "tds": 800.0, "light_intensity": 70.0, "co2": 450.0
        })
    }

    async fn insert_command(pool: &PgPool, command: &str, offset_secs: f64) {
        sqlx::query(
            "INSERT INTO control_commands (command, issued_at) \
             VALUES ($1, now() + make_interval(secs => $2))",
        )
        .bind(command)
        .bind(offset_secs)
        .execute(pool)
        .await
        .unwrap();
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn ingest_stores_reading_and_updates_heartbeat(pool: PgPool) {
        let server = live_server(pool);
        let resp = server
            .post("/api/sensor-data")
            .json(&json!({
                "temperature": 25.5, "humidity": 60.0, "ph": 6.0,
                "tds": 800.0, "light_intensity": 70.0, "co2": 450.0,
                "battery_level": 88.0
            }))
            .await;
        resp.assert_status_ok();

        let body: Value = server.get("/api/current-data").await.json();
        assert_eq!(body["sensor_data"]["temperature"], 25.5);
        assert_eq!(body["device_status"]["esp32_connected"], true);
        assert_eq!(body["device_status"]["battery_level"], 88.0);
        assert!(body["device_status"]["last_heartbeat"].is_string());
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn out_of_band_reading_records_critical_alert(pool: PgPool) {
        let server = live_server(pool);
        // 40 exceeds 1.2x the seeded 30.0 maximum.
        let resp = server.post("/api/sensor-data").json(&esp32_report(40.0)).await;
        resp.assert_status_ok();

        let alerts: Vec<Value> = server.get("/api/alerts").await.json();
        assert_eq!(alerts.len(), 1);
        assert_eq!(alerts[0]["alert_type"], "TEMPERATURE");
        assert_eq!(alerts[0]["severity"], "critical");
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn ingest_succeeds_when_alert_insert_fails(pool: PgPool) {
        sqlx::query("DROP TABLE alerts").execute(&pool).await.unwrap();

        let server = live_server(pool);
        let resp = server.post("/api/sensor-data").json(&esp32_report(40.0)).await;
        resp.assert_status_ok();

        let body: Value = server.get("/api/current-data").await.json();
        assert_eq!(body["sensor_data"]["temperature"], 40.0);
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn historical_data_with_huge_hours_is_clamped(pool: PgPool) {
        let server = live_server(pool);
        let resp = server
            .get("/api/historical-data")
            .add_query_param("hours", i64::MAX)
            .await;
        resp.assert_status_ok();

        let resp = server
            .get("/api/sensor-stats")
            .add_query_param("hours", i64::MAX)
            .await;
        resp.assert_status_ok();
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn sensor_stats_aggregates_over_the_window(pool: PgPool) {
        let server = live_server(pool);
        for temperature in [20.0, 25.0, 30.0] {
            let resp = server
                .post("/api/sensor-data")
                .json(&esp32_report(temperature))
                .await;
            resp.assert_status_ok();
        }

        let body: Value = server.get("/api/sensor-stats").await.json();
        assert_eq!(body["temperature"]["avg"], 25.0);
        assert_eq!(body["temperature"]["min"], 20.0);
        assert_eq!(body["temperature"]["max"], 30.0);
        assert_eq!(body["temperature"]["data_points"], 3);
        assert_eq!(body["soil_moisture"]["data_points"], 0);
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn controls_update_leaves_absent_fields_unchanged(pool: PgPool) {
        let server = live_server(pool);
        let resp = server
            .post("/api/controls")
            .json(&json!({ "pump_auto": false, "temp_threshold_max": 32.5 }))
            .await;
        resp.assert_status_ok();

        let body: Value = server.get("/api/controls").await.json();
        assert_eq!(body["pump_auto"], false);
        assert_eq!(body["temp_threshold_max"], 32.5);
        assert_eq!(body["fan_auto"], true);
        assert_eq!(body["temp_threshold_min"], 20.0);
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn device_command_drain_is_ordered_and_one_shot(pool: PgPool) {
        insert_command(&pool, "pump_on", 0.0).await;
        insert_command(&pool, "fan_on", 1.0).await;
        insert_command(&pool, "curtain_open", 2.0).await;

        let server = live_server(pool.clone());
        let body: Value = server.get("/api/device-command").await.json();
        let commands = body["commands"].as_array().unwrap();
        assert_eq!(commands.len(), 3);
        assert_eq!(commands[0]["command"], "pump_on");
        assert_eq!(commands[2]["command"], "curtain_open");
        assert!(commands.iter().all(|c| c["executed"] == true));

        // A drained command is never delivered twice.
        let body: Value = server.get("/api/device-command").await.json();
        assert_eq!(body["commands"].as_array().unwrap().len(), 0);

        // A command queued afterwards is delivered by the next drain, so
        // draining marks exactly the commands it returns.
        insert_command(&pool, "pump_off", 3.0).await;
        let body: Value = server.get("/api/device-command").await.json();
        let commands = body["commands"].as_array().unwrap();
        assert_eq!(commands.len(), 1);
        assert_eq!(commands[0]["command"], "pump_off");
    }
}
