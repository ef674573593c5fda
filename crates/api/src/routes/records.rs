//! Route definitions for the `/records` resource.

use axum::routing::post;
use axum::Router;

use crate::handlers::records;
use crate::state::AppState;

/// Routes mounted at `/records`.
///
/// ```text
/// POST   /    -> create
/// ```
pub fn router() -> Router<AppState> {
    Router::new().route("/", post(records::create))
}
