//! Repository for the survey authoring tables: `questions`, `categories`
//! and `options`.
//!
//! Authoring is outside the response lifecycle; these functions exist to
//! seed surveys and to load the question tree.

use sqlx::PgExecutor;
use surveyor_core::types::DbId;

use crate::models::question::{
    Category, CreateCategory, CreateOption, CreateQuestion, Question, QuestionOption,
};

const QUESTION_COLUMNS: &str = "id, survey_id, category_id, parent_option_id, content, \
    question_type, order_number, mandatory, finalized, max_length, min_value, max_value, \
    created_at, updated_at";

const CATEGORY_COLUMNS: &str = "id, survey_id, category_id, parent_option_id, content, \
    order_number, is_multi_record, created_at, updated_at";

const OPTION_COLUMNS: &str = "id, question_id, content, order_number, created_at, updated_at";

pub struct QuestionRepo;

impl QuestionRepo {
    // ── Questions ────────────────────────────────────────────────────

    pub async fn create_question(
        executor: impl PgExecutor<'_>,
        input: &CreateQuestion,
    ) -> Result<Question, sqlx::Error> {
        let query = format!(
            "INSERT INTO questions
                (survey_id, category_id, parent_option_id, content, question_type,
                 order_number, mandatory, finalized, max_length, min_value, max_value)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
             RETURNING {QUESTION_COLUMNS}"
        );
        sqlx::query_as::<_, Question>(&query)
            .bind(input.survey_id)
            .bind(input.category_id)
            .bind(input.parent_option_id)
            .bind(&input.content)
            .bind(input.question_type.as_str())
            .bind(input.order_number)
            .bind(input.mandatory)
            .bind(input.finalized)
            .bind(input.max_length)
            .bind(input.min_value)
            .bind(input.max_value)
            .fetch_one(executor)
            .await
    }

    pub async fn find_question(
        executor: impl PgExecutor<'_>,
        id: DbId,
    ) -> Result<Option<Question>, sqlx::Error> {
        let query = format!("SELECT {QUESTION_COLUMNS} FROM questions WHERE id = $1");
        sqlx::query_as::<_, Question>(&query)
            .bind(id)
            .fetch_optional(executor)
            .await
    }

    pub async fn list_questions(
        executor: impl PgExecutor<'_>,
        survey_id: DbId,
    ) -> Result<Vec<Question>, sqlx::Error> {
        let query = format!(
            "SELECT {QUESTION_COLUMNS} FROM questions
             WHERE survey_id = $1
             ORDER BY order_number, id"
        );
        sqlx::query_as::<_, Question>(&query)
            .bind(survey_id)
            .fetch_all(executor)
            .await
    }

    // ── Categories ───────────────────────────────────────────────────

    pub async fn create_category(
        executor: impl PgExecutor<'_>,
        input: &CreateCategory,
    ) -> Result<Category, sqlx::Error> {
        let query = format!(
            "INSERT INTO categories
                (survey_id, category_id, parent_option_id, content, order_number, is_multi_record)
             VALUES ($1, $2, $3, $4, $5, $6)
             RETURNING {CATEGORY_COLUMNS}"
        );
        sqlx::query_as::<_, Category>(&query)
            .bind(input.survey_id)
            .bind(input.category_id)
            .bind(input.parent_option_id)
            .bind(&input.content)
            .bind(input.order_number)
            .bind(input.is_multi_record)
            .fetch_one(executor)
            .await
    }

    pub async fn list_categories(
        executor: impl PgExecutor<'_>,
        survey_id: DbId,
    ) -> Result<Vec<Category>, sqlx::Error> {
        let query = format!(
            "SELECT {CATEGORY_COLUMNS} FROM categories
             WHERE survey_id = $1
             ORDER BY order_number, id"
        );
        sqlx::query_as::<_, Category>(&query)
            .bind(survey_id)
            .fetch_all(executor)
            .await
    }

    // ── Options ──────────────────────────────────────────────────────

    pub async fn create_option(
        executor: impl PgExecutor<'_>,
        input: &CreateOption,
    ) -> Result<QuestionOption, sqlx::Error> {
        let query = format!(
            "INSERT INTO options (question_id, content, order_number)
             VALUES ($1, $2, $3)
             RETURNING {OPTION_COLUMNS}"
        );
        sqlx::query_as::<_, QuestionOption>(&query)
            .bind(input.question_id)
            .bind(&input.content)
            .bind(input.order_number)
            .fetch_one(executor)
            .await
    }

    /// Every option of every question in the survey.
    pub async fn list_options(
        executor: impl PgExecutor<'_>,
        survey_id: DbId,
    ) -> Result<Vec<QuestionOption>, sqlx::Error> {
        let query = format!(
            "SELECT {OPTION_COLUMNS} FROM options
             WHERE question_id IN (SELECT id FROM questions WHERE survey_id = $1)
             ORDER BY order_number, id"
        );
        sqlx::query_as::<_, QuestionOption>(&query)
            .bind(survey_id)
            .fetch_all(executor)
            .await
    }
}
