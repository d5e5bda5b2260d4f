//! Telemetry Routes
//!
//! - GET /api/telemetry?race_id=..&session=..&drivers=VER,HAM&lap_number=5

use axum::{
    extract::{rejection::QueryRejection, Query, State},
    Json,
};
use std::sync::Arc;

use crate::api::error::ApiResult;
use crate::api::routes::request_params;
use crate::api::state::AppState;
use crate::query::{RequestParams, TelemetryByDriver};

/// GET /api/telemetry
///
/// Samples for a single lap, ordered by timestamp within each driver.
pub async fn get_telemetry(
    State(state): State<Arc<AppState>>,
    query: Result<Query<RequestParams>, QueryRejection>,
) -> ApiResult<Json<TelemetryByDriver>> {
    let params = request_params(query)?;
    let telemetry = state.service.telemetry(&params).await?;
    Ok(Json(telemetry))
}
