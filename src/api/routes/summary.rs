//! Summary Routes
//!
//! - GET /api/summary?race_id=..&session=..&drivers=VER,HAM - Per-driver lap statistics

use axum::{
    extract::{rejection::QueryRejection, Query, State},
    Json,
};
use std::sync::Arc;

use crate::api::error::ApiResult;
use crate::api::routes::request_params;
use crate::api::state::AppState;
use crate::query::{RequestParams, SummaryByDriver};

/// GET /api/summary
///
/// Laps with a non-positive time are left out of every aggregate.
pub async fn get_summary(
    State(state): State<Arc<AppState>>,
    query: Result<Query<RequestParams>, QueryRejection>,
) -> ApiResult<Json<SummaryByDriver>> {
    let params = request_params(query)?;
    let summary = state.service.summary(&params).await?;
    Ok(Json(summary))
}
