//! Answer and choice models.

use base64::Engine as _;
use serde::Serialize;
use sqlx::FromRow;
use surveyor_core::projector::Answered;
use surveyor_core::reconcile::ExistingAnswer;
use surveyor_core::types::{DbId, Timestamp};

/// A row from the `answers` table.
#[derive(Debug, Clone, PartialEq, FromRow, Serialize)]
pub struct Answer {
    pub id: DbId,
    pub response_id: DbId,
    pub question_id: DbId,
    pub record_id: Option<DbId>,
    pub content: Option<String>,
    /// Raw photo bytes. Serialized separately as base64.
    #[serde(skip_serializing)]
    pub photo: Option<Vec<u8>>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl Answer {
    pub fn to_existing(&self) -> ExistingAnswer {
        ExistingAnswer {
            id: self.id,
            question_id: self.question_id,
            record_id: self.record_id,
            updated_at: self.updated_at,
        }
    }

    pub fn photo_in_base64(&self) -> Option<String> {
        self.photo
            .as_deref()
            .map(|bytes| base64::engine::general_purpose::STANDARD.encode(bytes))
    }
}

impl Answered for Answer {
    fn answer_id(&self) -> DbId {
        self.id
    }

    fn question_id(&self) -> DbId {
        self.question_id
    }
}

/// Values written to an answer row by the coordinator.
#[derive(Debug, Clone, Default)]
pub struct AnswerWrite {
    pub question_id: DbId,
    pub record_id: Option<DbId>,
    pub content: Option<String>,
    pub photo: Option<Vec<u8>>,
    /// `None` keeps the current selection.
    pub option_ids: Option<Vec<DbId>>,
}

/// A row from the `choices` table: one selected option of an answer.
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize)]
pub struct Choice {
    pub id: DbId,
    pub answer_id: DbId,
    pub option_id: DbId,
    pub created_at: Timestamp,
}
