pub mod dto;
pub mod errors;
pub mod handlers;

use axum::{
    routing::{get, post},
    Router,
};
use sqlx::PgPool;
use utoipa::OpenApi;
use utoipa_axum::router::OpenApiRouter;

use handlers::ApiDoc;

pub fn router(pool: PgPool) -> Router {
    let (router, api) = OpenApiRouter::with_openapi(ApiDoc::openapi())
        .route("/api/sensor-data", post(handlers::receive_sensor_data))
        .route("/api/current-data", get(handlers::get_current_data))
        .route("/api/historical-data", get(handlers::get_historical_data))
        .route("/api/sensor-stats", get(handlers::get_sensor_stats))
        .route(
            "/api/controls",
            get(handlers::get_controls).post(handlers::update_controls),
        )
        .route("/api/alerts", get(handlers::get_alerts))
        .route(
            "/api/device-command",
            get(handlers::pending_device_commands).post(handlers::send_device_command),
        )
        .route("/api/health", get(handlers::health))
        .with_state(pool)
        .split_for_parts();

    router.route(
        "/api-docs/openapi.json",
        get(move || async move { axum::Json(api) }),
    )
}
