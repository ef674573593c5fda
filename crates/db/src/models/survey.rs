//! Survey models.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use surveyor_core::types::{DbId, Timestamp};

/// A row from the `surveys` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Survey {
    pub id: DbId,
    pub name: String,
    pub description: Option<String>,
    /// Public surveys accept anonymous responses.
    pub is_public: bool,
    pub organization_id: Option<DbId>,
    pub published_at: Option<Timestamp>,
    pub expires_at: Option<Timestamp>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// DTO for creating a survey.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CreateSurvey {
    pub name: String,
    pub description: Option<String>,
    pub is_public: Option<bool>,
    pub organization_id: Option<DbId>,
}
