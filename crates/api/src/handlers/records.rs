//! Handlers for the `/records` resource.

use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use surveyor_db::models::record::{CreateRecord, Record};
use surveyor_db::repositories::RecordRepo;

use crate::error::AppResult;
use crate::response::DataResponse;
use crate::state::AppState;

/// POST /api/v1/records
///
/// Create an unlinked record. It is attached to a response the first time
/// one of that response's answers references it.
pub async fn create(
    State(state): State<AppState>,
    Json(input): Json<CreateRecord>,
) -> AppResult<(StatusCode, Json<DataResponse<Record>>)> {
    let record = RecordRepo::create(&state.pool, &input).await?;
    tracing::debug!(record_id = record.id, "Record created");
    Ok((StatusCode::CREATED, Json(DataResponse { data: record })))
}
