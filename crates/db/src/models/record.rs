//! Record models.
//!
//! A record is created on its own (one instance of a repeated category, or
//! a media slot) and linked to a response the first time an answer of that
//! response references it.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use surveyor_core::types::{DbId, Timestamp};

/// A row from the `records` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Record {
    pub id: DbId,
    pub response_id: Option<DbId>,
    pub category_id: Option<DbId>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// DTO for creating a record.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CreateRecord {
    pub category_id: Option<DbId>,
}
