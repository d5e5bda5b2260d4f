//! Lap Routes
//!
//! - GET /api/laps?race_id=..&session=..&drivers=VER,HAM - Laps with tire compounds

use axum::{
    extract::{rejection::QueryRejection, Query, State},
    Json,
};
use std::sync::Arc;

use crate::api::error::ApiResult;
use crate::api::routes::request_params;
use crate::api::state::AppState;
use crate::query::{LapsByDriver, RequestParams};

/// GET /api/laps
pub async fn get_laps(
    State(state): State<Arc<AppState>>,
    query: Result<Query<RequestParams>, QueryRejection>,
) -> ApiResult<Json<LapsByDriver>> {
    let params = request_params(query)?;
    let laps = state.service.laps(&params).await?;
    Ok(Json(laps))
}
