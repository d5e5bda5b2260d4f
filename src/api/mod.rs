//! Pitwall REST API
//!
//! HTTP API layer for Pitwall, built with Axum. All dataset endpoints are
//! read-only `GET`s answering JSON, with CORS open to every origin.
//!
//! # Endpoints
//!
//! ## Dataset
//! - `GET /api/races` - All races, newest first
//! - `GET /api/drivers?race_id&session` - Driver codes in a session
//! - `GET /api/laps?race_id&session&drivers` - Laps by driver
//! - `GET /api/telemetry?race_id&session&drivers&lap_number` - Telemetry by driver
//! - `GET /api/summary?race_id&session&drivers` - Lap statistics by driver
//!
//! ## Health
//! - `GET /health/live` - Liveness probe
//! - `GET /health/ready` - Readiness probe
//! - `GET /health` - Full health status
//!
//! # Example
//!
//! ```rust,ignore
//! use pitwall::api::{serve, AppState};
//! use pitwall::config::ApiConfig;
//! use pitwall::store::{SqliteConfig, SqliteStore};
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let store = SqliteStore::open(&SqliteConfig::new("racing_data.db"))?;
//!     let config = ApiConfig::default();
//!
//!     let state = AppState::from_store(Arc::new(store), config.clone());
//!     serve(state, &config).await?;
//!
//!     Ok(())
//! }
//! ```

pub mod dto;
pub mod error;
pub mod routes;
pub mod state;

pub use error::{ApiError, ApiResult};
pub use state::AppState;

use axum::{
    http::{header, Method},
    routing::get,
    Router,
};
use std::sync::Arc;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use crate::config::ApiConfig;

/// Build the API router with all routes and middleware
pub fn build_router(state: AppState) -> Router {
    let api_routes = Router::new()
        .route("/races", get(routes::races::list_races))
        .route("/drivers", get(routes::drivers::list_drivers))
        .route("/laps", get(routes::laps::get_laps))
        .route("/telemetry", get(routes::telemetry::get_telemetry))
        .route("/summary", get(routes::summary::get_summary));

    let health_routes = Router::new()
        .route("/live", get(routes::health::liveness))
        .route("/ready", get(routes::health::readiness))
        .route("/", get(routes::health::full_health));

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION]);

    // Create shared state
    let shared_state = Arc::new(state);

    Router::new()
        .nest("/api", api_routes)
        .nest("/health", health_routes)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(shared_state)
}

/// Start the API server
pub async fn serve(state: AppState, config: &ApiConfig) -> Result<(), ApiError> {
    let router = build_router(state);

    let addr = config.addr();
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    tracing::info!("Pitwall API listening on {}", addr);

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|e| ApiError::Internal(format!("Server error: {}", e)))?;

    tracing::info!("Pitwall API shut down gracefully");
    Ok(())
}

/// Wait for shutdown signal
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutdown signal received, starting graceful shutdown");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::schema::create_tables;
    use crate::store::{
        Driver, DriverSummary, LapRecord, Race, SqliteStore, Statement, StoreResult,
        TelemetrySample, TelemetryStore,
    };
    use async_trait::async_trait;
    use axum::{
        body::Body,
        http::{Request, StatusCode},
        response::Response,
    };
    use rusqlite::Connection;
    use serde_json::{json, Value};
    use std::time::Duration;
    use tower::util::ServiceExt;

    /// Panics if a handler lets a request through to the store
    struct UnreachableStore;

    #[async_trait]
    impl TelemetryStore for UnreachableStore {
        async fn races(&self, _stmt: Statement) -> StoreResult<Vec<Race>> {
            unreachable!("races queried")
        }
        async fn drivers(&self, _stmt: Statement) -> StoreResult<Vec<Driver>> {
            unreachable!("drivers queried")
        }
        async fn laps(&self, _stmt: Statement) -> StoreResult<Vec<LapRecord>> {
            unreachable!("laps queried")
        }
        async fn telemetry(&self, _stmt: Statement) -> StoreResult<Vec<TelemetrySample>> {
            unreachable!("telemetry queried")
        }
        async fn summaries(&self, _stmt: Statement) -> StoreResult<Vec<DriverSummary>> {
            unreachable!("summaries queried")
        }
        async fn ping(&self) -> StoreResult<()> {
            unreachable!("ping")
        }
    }

    fn sqlite_app(seed: &str) -> Router {
        let conn = Connection::open_in_memory().unwrap();
        create_tables(&conn).unwrap();
        conn.execute_batch(seed).unwrap();
        let store = SqliteStore::from_connection(conn, Duration::from_secs(5));
        build_router(AppState::from_store(Arc::new(store), ApiConfig::default()))
    }

    fn create_test_app() -> Router {
        sqlite_app(
            "INSERT INTO races VALUES ('2024_spa', 'Belgian Grand Prix', 'Spa-Francorchamps', '2024-07-28');
             INSERT INTO lap_times VALUES ('2024_spa', 'VER', 'R', 1, 10.5);
             INSERT INTO lap_times VALUES ('2024_spa', 'VER', 'R', 2, -1);
             INSERT INTO lap_times VALUES ('2024_spa', 'VER', 'R', 3, 12.0);
             INSERT INTO tires VALUES ('2024_spa', 'VER', 'R', 1, 'SOFT');
             INSERT INTO telemetry VALUES ('2024_spa', 'VER', 'R', 1, 0.5, 301.2, 11800, 8, 100);
             INSERT INTO telemetry VALUES ('2024_spa', 'VER', 'R', 1, 0.1, 299.0, 11750, 8, 100);",
        )
    }

    fn unreachable_app() -> Router {
        build_router(AppState::from_store(
            Arc::new(UnreachableStore),
            ApiConfig::default(),
        ))
    }

    /// Store with no tables: every query fails
    fn broken_app() -> Router {
        let conn = Connection::open_in_memory().unwrap();
        let store = SqliteStore::from_connection(conn, Duration::from_secs(5));
        build_router(AppState::from_store(Arc::new(store), ApiConfig::default()))
    }

    async fn get(app: Router, uri: &str) -> Response {
        app.oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap()
    }

    async fn json_body(response: Response) -> Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_health_live() {
        let response = get(create_test_app(), "/health/live").await;
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_health_ready() {
        let response = get(create_test_app(), "/health/ready").await;
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_health_full() {
        let response = get(create_test_app(), "/health").await;
        assert_eq!(response.status(), StatusCode::OK);

        let body = json_body(response).await;
        assert_eq!(body["status"], "healthy");
        assert_eq!(body["database"], "ok");
    }

    #[tokio::test]
    async fn test_races_empty_is_array() {
        let response = get(sqlite_app(""), "/api/races").await;
        assert_eq!(response.status(), StatusCode::OK);

        let body = json_body(response).await;
        assert_eq!(body, json!([]));
    }

    #[tokio::test]
    async fn test_races() {
        let response = get(create_test_app(), "/api/races").await;
        assert_eq!(response.status(), StatusCode::OK);

        let body = json_body(response).await;
        assert_eq!(body[0]["race_id"], "2024_spa");
        assert_eq!(body[0]["circuit"], "Spa-Francorchamps");
    }

    #[tokio::test]
    async fn test_drivers() {
        let response = get(create_test_app(), "/api/drivers?race_id=2024_spa&session=R").await;
        assert_eq!(response.status(), StatusCode::OK);

        let body = json_body(response).await;
        assert_eq!(body, json!(["VER"]));
    }

    #[tokio::test]
    async fn test_drivers_requires_race_id() {
        let response = get(unreachable_app(), "/api/drivers?session=R").await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let body = json_body(response).await;
        assert_eq!(body, json!({ "error": "race_id is required" }));
    }

    #[tokio::test]
    async fn test_missing_session_rejected_before_store() {
        let app = unreachable_app();
        for uri in [
            "/api/drivers?race_id=2024_spa",
            "/api/laps?race_id=2024_spa&drivers=VER",
            "/api/telemetry?race_id=2024_spa&drivers=VER&lap_number=1",
            "/api/summary?race_id=2024_spa&drivers=VER&session=%20",
        ] {
            let response = get(app.clone(), uri).await;
            assert_eq!(response.status(), StatusCode::BAD_REQUEST, "{}", uri);

            let body = json_body(response).await;
            assert_eq!(body["error"], "session is required", "{}", uri);
        }
    }

    #[tokio::test]
    async fn test_laps_requires_drivers() {
        let response = get(unreachable_app(), "/api/laps?race_id=2024_spa&session=R").await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let response = get(
            unreachable_app(),
            "/api/laps?race_id=2024_spa&session=R&drivers=",
        )
        .await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_laps_omit_drivers_without_rows() {
        let response = get(
            create_test_app(),
            "/api/laps?race_id=2024_spa&session=R&drivers=VER,XXX",
        )
        .await;
        assert_eq!(response.status(), StatusCode::OK);

        let body = json_body(response).await;
        let map = body.as_object().unwrap();
        assert_eq!(map.keys().collect::<Vec<_>>(), vec!["VER"]);
        assert_eq!(map["VER"].as_array().unwrap().len(), 3);
        assert_eq!(map["VER"][0]["compound"], "SOFT");
        assert_eq!(map["VER"][1]["compound"], "");
    }

    #[tokio::test]
    async fn test_laps_drivers_with_spaces() {
        let response = get(
            create_test_app(),
            "/api/laps?race_id=2024_spa&session=R&drivers=XXX,%20VER",
        )
        .await;
        assert_eq!(response.status(), StatusCode::OK);

        let body = json_body(response).await;
        assert!(body.get("VER").is_some());
    }

    #[tokio::test]
    async fn test_telemetry_lap_number_missing_vs_invalid() {
        let response = get(
            unreachable_app(),
            "/api/telemetry?race_id=2024_spa&session=R&drivers=VER",
        )
        .await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let missing = json_body(response).await;
        assert_eq!(missing["error"], "lap_number is required");

        let response = get(
            unreachable_app(),
            "/api/telemetry?race_id=2024_spa&session=R&drivers=VER&lap_number=abc",
        )
        .await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let invalid = json_body(response).await;
        assert_eq!(invalid["error"], "lap_number must be an integer, got 'abc'");

        assert_ne!(missing, invalid);
    }

    #[tokio::test]
    async fn test_telemetry() {
        let response = get(
            create_test_app(),
            "/api/telemetry?race_id=2024_spa&session=R&drivers=VER&lap_number=1",
        )
        .await;
        assert_eq!(response.status(), StatusCode::OK);

        let body = json_body(response).await;
        assert_eq!(body["VER"][0]["timestamp_seconds"], 0.1);
        assert_eq!(body["VER"][1]["timestamp_seconds"], 0.5);
        assert_eq!(body["VER"][1]["gear"], 8);
    }

    #[tokio::test]
    async fn test_summary() {
        let response = get(
            create_test_app(),
            "/api/summary?race_id=2024_spa&session=R&drivers=VER",
        )
        .await;
        assert_eq!(response.status(), StatusCode::OK);

        let body = json_body(response).await;
        assert_eq!(body["VER"]["laps_completed"], 2);
        assert_eq!(body["VER"]["fastest_lap_time"], 10.5);
        assert_eq!(body["VER"]["average_lap_time"], 11.25);
    }

    #[tokio::test]
    async fn test_store_error_is_generic_500() {
        let response = get(broken_app(), "/api/races").await;
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let body = json_body(response).await;
        assert_eq!(body, json!({ "error": "Internal server error" }));
    }

    #[tokio::test]
    async fn test_store_error_is_generic_500_on_every_endpoint() {
        for uri in [
            "/api/drivers?race_id=2024_spa&session=R",
            "/api/laps?race_id=2024_spa&session=R&drivers=VER",
            "/api/telemetry?race_id=2024_spa&session=R&drivers=VER&lap_number=1",
            "/api/summary?race_id=2024_spa&session=R&drivers=VER",
        ] {
            let response = get(broken_app(), uri).await;
            assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR, "{}", uri);

            let body = json_body(response).await;
            assert_eq!(body, json!({ "error": "Internal server error" }), "{}", uri);
        }
    }

    #[tokio::test]
    async fn test_readiness_fails_without_database() {
        struct DownStore;

        #[async_trait]
        impl TelemetryStore for DownStore {
            async fn races(&self, _stmt: Statement) -> StoreResult<Vec<Race>> {
                Ok(Vec::new())
            }
            async fn drivers(&self, _stmt: Statement) -> StoreResult<Vec<Driver>> {
                Ok(Vec::new())
            }
            async fn laps(&self, _stmt: Statement) -> StoreResult<Vec<LapRecord>> {
                Ok(Vec::new())
            }
            async fn telemetry(&self, _stmt: Statement) -> StoreResult<Vec<TelemetrySample>> {
                Ok(Vec::new())
            }
            async fn summaries(&self, _stmt: Statement) -> StoreResult<Vec<DriverSummary>> {
                Ok(Vec::new())
            }
            async fn ping(&self) -> StoreResult<()> {
                Err(crate::store::StoreError::Connection("refused".to_string()))
            }
        }

        let app = build_router(AppState::from_store(Arc::new(DownStore), ApiConfig::default()));
        let response = get(app, "/health/ready").await;
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    }

    #[tokio::test]
    async fn test_cors_allows_any_origin() {
        let response = create_test_app()
            .oneshot(
                Request::builder()
                    .uri("/api/races")
                    .header("Origin", "http://localhost:5173")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(
            response
                .headers()
                .get("access-control-allow-origin")
                .unwrap(),
            "*"
        );
    }
}
