//! Query parameter types for API handlers.

use serde::Deserialize;
use surveyor_core::types::Timestamp;
use surveyor_db::models::response::ResponseFilter;

/// `GET /surveys/{survey_id}/responses` query string.
///
/// `page` is 1-based; `page_size` is clamped to `1..=50` and defaults to 50.
#[derive(Debug, Default, Deserialize)]
pub struct ListResponsesParams {
    pub page: Option<i64>,
    pub page_size: Option<i64>,
    #[serde(default)]
    pub completed: bool,
    pub created_from: Option<Timestamp>,
    pub created_to: Option<Timestamp>,
}

impl ListResponsesParams {
    pub fn filter(&self) -> ResponseFilter {
        ResponseFilter {
            completed: self.completed,
            created_from: self.created_from,
            created_to: self.created_to,
        }
    }
}
