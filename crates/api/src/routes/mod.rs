pub mod health;
pub mod records;
pub mod responses;

use axum::Router;

use crate::state::AppState;

/// Build the `/api/v1` route tree.
///
/// ```text
/// /surveys/{survey_id}/responses            list, create
///
/// /responses/{id}                           sync payload, update, delete
/// /responses/{id}/answers                   sorted answers, replace answers
/// /responses/{id}/blank-answers             pre-populate empty answers
/// /responses/{id}/last-update               latest change timestamp
/// /responses/{id}/status                    mark status
/// /responses/{id}/status/merge              timestamped status merge
///
/// /records                                  create
/// ```
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .nest("/surveys/{survey_id}/responses", responses::survey_router())
        .nest("/responses", responses::router())
        .nest("/records", records::router())
}
