//! Question, category and option models, plus their conversion into the
//! tree nodes used by `surveyor_core`.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use surveyor_core::error::CoreError;
use surveyor_core::question::{QuestionKind, QuestionNode};
use surveyor_core::tree::{CategoryNode, OptionNode, ParentRef};
use surveyor_core::types::{DbId, Timestamp};

/// A row from the `questions` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Question {
    pub id: DbId,
    pub survey_id: DbId,
    pub category_id: Option<DbId>,
    pub parent_option_id: Option<DbId>,
    pub content: String,
    pub question_type: String,
    pub order_number: i32,
    pub mandatory: bool,
    pub finalized: bool,
    pub max_length: Option<i32>,
    pub min_value: Option<i32>,
    pub max_value: Option<i32>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl Question {
    pub fn kind(&self) -> Result<QuestionKind, CoreError> {
        self.question_type.parse()
    }

    pub fn to_node(&self) -> Result<QuestionNode, CoreError> {
        Ok(QuestionNode {
            id: self.id,
            survey_id: self.survey_id,
            parent: ParentRef::from_columns(self.category_id, self.parent_option_id),
            order_number: self.order_number,
            kind: self.kind()?,
            mandatory: self.mandatory,
            max_length: self.max_length,
            min_value: self.min_value,
            max_value: self.max_value,
        })
    }
}

/// DTO for creating a question.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateQuestion {
    pub survey_id: DbId,
    pub category_id: Option<DbId>,
    pub parent_option_id: Option<DbId>,
    pub content: String,
    pub question_type: QuestionKind,
    pub order_number: i32,
    pub mandatory: bool,
    pub finalized: bool,
    pub max_length: Option<i32>,
    pub min_value: Option<i32>,
    pub max_value: Option<i32>,
}

impl CreateQuestion {
    /// A finalized, optional, unconstrained question at the survey root.
    pub fn new(survey_id: DbId, content: &str, question_type: QuestionKind, order_number: i32) -> Self {
        Self {
            survey_id,
            category_id: None,
            parent_option_id: None,
            content: content.to_string(),
            question_type,
            order_number,
            mandatory: false,
            finalized: true,
            max_length: None,
            min_value: None,
            max_value: None,
        }
    }
}

/// A row from the `categories` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Category {
    pub id: DbId,
    pub survey_id: DbId,
    pub category_id: Option<DbId>,
    pub parent_option_id: Option<DbId>,
    pub content: String,
    pub order_number: i32,
    pub is_multi_record: bool,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl Category {
    pub fn to_node(&self) -> CategoryNode {
        CategoryNode {
            id: self.id,
            survey_id: self.survey_id,
            parent: ParentRef::from_columns(self.category_id, self.parent_option_id),
            order_number: self.order_number,
        }
    }
}

/// DTO for creating a category.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CreateCategory {
    pub survey_id: DbId,
    pub category_id: Option<DbId>,
    pub parent_option_id: Option<DbId>,
    pub content: String,
    pub order_number: i32,
    pub is_multi_record: bool,
}

/// A row from the `options` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct QuestionOption {
    pub id: DbId,
    pub question_id: DbId,
    pub content: String,
    pub order_number: i32,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl QuestionOption {
    pub fn to_node(&self) -> OptionNode {
        OptionNode {
            id: self.id,
            question_id: self.question_id,
            order_number: self.order_number,
        }
    }
}

/// DTO for creating an option.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateOption {
    pub question_id: DbId,
    pub content: String,
    pub order_number: i32,
}
