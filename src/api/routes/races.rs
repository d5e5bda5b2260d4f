//! Race Routes
//!
//! - GET /api/races - All races, newest first

use axum::{extract::State, Json};
use std::sync::Arc;

use crate::api::error::ApiResult;
use crate::api::state::AppState;
use crate::store::Race;

/// GET /api/races
///
/// Returns `[]` when no races are loaded.
pub async fn list_races(State(state): State<Arc<AppState>>) -> ApiResult<Json<Vec<Race>>> {
    let races = state.service.races().await?;
    Ok(Json(races))
}
