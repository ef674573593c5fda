//! Route definitions for responses.

use axum::routing::{get, post, put};
use axum::Router;

use crate::handlers::responses;
use crate::state::AppState;

/// Routes mounted at `/surveys/{survey_id}/responses`.
///
/// ```text
/// GET    /    -> list_by_survey (?page=&page_size=&completed=&created_from=&created_to=)
/// POST   /    -> create
/// ```
pub fn survey_router() -> Router<AppState> {
    Router::new().route("/", get(responses::list_by_survey).post(responses::create))
}

/// Routes mounted at `/responses`.
///
/// ```text
/// GET    /{id}                 -> get_by_id (sync payload)
/// PUT    /{id}                 -> update
/// DELETE /{id}                 -> delete
/// GET    /{id}/answers         -> sorted_answers
/// PUT    /{id}/answers         -> update_answers
/// POST   /{id}/blank-answers   -> create_blank_answers
/// GET    /{id}/last-update     -> last_update
/// PUT    /{id}/status          -> mark_status
/// POST   /{id}/status/merge    -> merge_status
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route(
            "/{id}",
            get(responses::get_by_id)
                .put(responses::update)
                .delete(responses::delete),
        )
        .route(
            "/{id}/answers",
            get(responses::sorted_answers).put(responses::update_answers),
        )
        .route("/{id}/blank-answers", post(responses::create_blank_answers))
        .route("/{id}/last-update", get(responses::last_update))
        .route("/{id}/status", put(responses::mark_status))
        .route("/{id}/status/merge", post(responses::merge_status))
}
