//! Driver Routes
//!
//! - GET /api/drivers?race_id=..&session=.. - Driver codes present in a session

use axum::{
    extract::{rejection::QueryRejection, Query, State},
    Json,
};
use std::sync::Arc;

use crate::api::error::ApiResult;
use crate::api::routes::request_params;
use crate::api::state::AppState;
use crate::query::RequestParams;

/// GET /api/drivers
///
/// Distinct driver codes with telemetry in the race session, in the store's
/// natural order.
pub async fn list_drivers(
    State(state): State<Arc<AppState>>,
    query: Result<Query<RequestParams>, QueryRejection>,
) -> ApiResult<Json<Vec<String>>> {
    let params = request_params(query)?;
    let drivers = state.service.drivers(&params).await?;
    Ok(Json(drivers))
}
