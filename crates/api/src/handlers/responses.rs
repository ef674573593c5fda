//! Handlers for the `/responses` resource.
//!
//! Responses are created under their survey
//! (`/surveys/{survey_id}/responses`) and addressed directly afterwards
//! (`/responses/{id}`).

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response as HttpResponse};
use axum::Json;
use serde::Serialize;
use surveyor_core::error::CoreError;
use surveyor_core::pagination;
use surveyor_core::params::{
    CreateResponseParams, MarkStatusRequest, MergeStatusRequest, UpdateAnswersParams,
    UpdateResponseParams,
};
use surveyor_core::types::{DbId, Timestamp};
use surveyor_db::coordinator::{ResponseCoordinator, SaveOutcome};
use surveyor_db::models::answer::Answer;
use surveyor_db::models::response::{Response, ResponsePayload};
use surveyor_db::repositories::ResponseRepo;

use crate::error::{AppError, AppResult};
use crate::middleware::auth::{AuthUser, Identity};
use crate::query::ListResponsesParams;
use crate::response::DataResponse;
use crate::state::AppState;

/// Map a coordinated save to HTTP: `Saved` -> `success`, `NoChanges` -> 204,
/// `Rejected` -> 400 with the violations.
fn outcome_response<T: Serialize>(
    outcome: SaveOutcome<T>,
    success: StatusCode,
) -> AppResult<HttpResponse> {
    match outcome {
        SaveOutcome::Saved(data) => Ok((success, Json(DataResponse { data })).into_response()),
        SaveOutcome::NoChanges => Ok(StatusCode::NO_CONTENT.into_response()),
        SaveOutcome::Rejected(errors) => Err(AppError::Rejected(errors)),
    }
}

/// POST /api/v1/surveys/{survey_id}/responses
pub async fn create(
    State(state): State<AppState>,
    Path(survey_id): Path<DbId>,
    identity: Identity,
    Json(params): Json<CreateResponseParams>,
) -> AppResult<HttpResponse> {
    let outcome = ResponseCoordinator::create_valid_response_from_params(
        &state.pool,
        state.clock.as_ref(),
        survey_id,
        &identity.respondent(),
        params,
    )
    .await?;
    outcome_response(outcome, StatusCode::CREATED)
}

/// GET /api/v1/surveys/{survey_id}/responses
///
/// Earliest `updated_at` first, paged.
pub async fn list_by_survey(
    State(state): State<AppState>,
    Path(survey_id): Path<DbId>,
    _user: AuthUser,
    Query(params): Query<ListResponsesParams>,
) -> AppResult<Json<DataResponse<Vec<Response>>>> {
    let limit = pagination::page_size(params.page_size);
    let offset = pagination::page_offset(params.page, limit);
    let responses =
        ResponseRepo::list_for_survey(&state.pool, survey_id, &params.filter(), limit, offset)
            .await?;
    Ok(Json(DataResponse { data: responses }))
}

/// GET /api/v1/responses/{id}
///
/// The sync payload: the response with sorted answers, choices and photos.
pub async fn get_by_id(
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<Json<DataResponse<ResponsePayload>>> {
    let payload = ResponseCoordinator::payload(&state.pool, id).await?;
    Ok(Json(DataResponse { data: payload }))
}

/// PUT /api/v1/responses/{id}
///
/// 200 with the response, 204 when nothing was submitted, 400 when rejected.
pub async fn update(
    State(state): State<AppState>,
    Path(id): Path<DbId>,
    Json(params): Json<UpdateResponseParams>,
) -> AppResult<HttpResponse> {
    let outcome = ResponseCoordinator::update_valid_response_from_params(
        &state.pool,
        state.clock.as_ref(),
        id,
        params,
    )
    .await?;
    outcome_response(outcome, StatusCode::OK)
}

/// DELETE /api/v1/responses/{id}
pub async fn delete(
    State(state): State<AppState>,
    Path(id): Path<DbId>,
    _user: AuthUser,
) -> AppResult<StatusCode> {
    ResponseCoordinator::delete(&state.pool, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// GET /api/v1/responses/{id}/answers
pub async fn sorted_answers(
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<Json<DataResponse<Vec<Answer>>>> {
    let answers = ResponseCoordinator::sorted_answers(&state.pool, id).await?;
    Ok(Json(DataResponse { data: answers }))
}

/// PUT /api/v1/responses/{id}/answers
///
/// Stored answers not mentioned in the body are cleared.
pub async fn update_answers(
    State(state): State<AppState>,
    Path(id): Path<DbId>,
    Json(params): Json<UpdateAnswersParams>,
) -> AppResult<HttpResponse> {
    let outcome =
        ResponseCoordinator::update_answers(&state.pool, state.clock.as_ref(), id, params.answers)
            .await?;
    outcome_response(outcome, StatusCode::OK)
}

#[derive(Debug, Serialize)]
pub struct BlankAnswersCreated {
    pub created: u64,
}

/// POST /api/v1/responses/{id}/blank-answers
pub async fn create_blank_answers(
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<Json<DataResponse<BlankAnswersCreated>>> {
    let created =
        ResponseCoordinator::create_blank_answers(&state.pool, state.clock.as_ref(), id).await?;
    Ok(Json(DataResponse {
        data: BlankAnswersCreated { created },
    }))
}

/// PUT /api/v1/responses/{id}/status
pub async fn mark_status(
    State(state): State<AppState>,
    Path(id): Path<DbId>,
    Json(input): Json<MarkStatusRequest>,
) -> AppResult<HttpResponse> {
    let outcome =
        ResponseCoordinator::mark_status(&state.pool, state.clock.as_ref(), id, input.status)
            .await?;
    outcome_response(outcome, StatusCode::OK)
}

/// POST /api/v1/responses/{id}/status/merge
///
/// 204 when the update is not newer than the response.
pub async fn merge_status(
    State(state): State<AppState>,
    Path(id): Path<DbId>,
    Json(input): Json<MergeStatusRequest>,
) -> AppResult<HttpResponse> {
    let outcome =
        ResponseCoordinator::merge_status(&state.pool, state.clock.as_ref(), id, input).await?;
    outcome_response(outcome, StatusCode::OK)
}

#[derive(Debug, Serialize)]
pub struct LastUpdate {
    pub last_update: Timestamp,
}

/// GET /api/v1/responses/{id}/last-update
///
/// Latest change to the response or any of its answers.
pub async fn last_update(
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<Json<DataResponse<LastUpdate>>> {
    let last_update = ResponseRepo::last_update(&state.pool, id)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound {
            entity: "Response",
            id,
        }))?;
    Ok(Json(DataResponse {
        data: LastUpdate { last_update },
    }))
}
