//! API Routes
//!
//! Route handlers organized by functionality.

pub mod drivers;
pub mod health;
pub mod laps;
pub mod races;
pub mod summary;
pub mod telemetry;

use axum::extract::{rejection::QueryRejection, Query};

use crate::api::error::{ApiError, ApiResult};
use crate::query::RequestParams;

/// Unwrap query-string parameters, turning a malformed query string into a
/// validation error with the usual JSON body.
pub(crate) fn request_params(
    query: Result<Query<RequestParams>, QueryRejection>,
) -> ApiResult<RequestParams> {
    query
        .map(|Query(params)| params)
        .map_err(|rejection| ApiError::Validation(rejection.body_text()))
}
