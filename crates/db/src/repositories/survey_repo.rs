//! Repository for the `surveys` table and the survey's question tree.

use sqlx::{PgConnection, PgExecutor};
use surveyor_core::error::CoreError;
use surveyor_core::tree::QuestionTree;
use surveyor_core::types::DbId;

use crate::error::DbError;
use crate::models::survey::{CreateSurvey, Survey};
use crate::repositories::QuestionRepo;

const COLUMNS: &str = "id, name, description, is_public, organization_id, \
    published_at, expires_at, created_at, updated_at";

pub struct SurveyRepo;

impl SurveyRepo {
    /// Insert a new survey. `is_public` defaults to `false`.
    pub async fn create(
        executor: impl PgExecutor<'_>,
        input: &CreateSurvey,
    ) -> Result<Survey, sqlx::Error> {
        let query = format!(
            "INSERT INTO surveys (name, description, is_public, organization_id)
             VALUES ($1, $2, COALESCE($3, false), $4)
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Survey>(&query)
            .bind(&input.name)
            .bind(&input.description)
            .bind(input.is_public)
            .bind(input.organization_id)
            .fetch_one(executor)
            .await
    }

    pub async fn find_by_id(
        executor: impl PgExecutor<'_>,
        id: DbId,
    ) -> Result<Option<Survey>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM surveys WHERE id = $1");
        sqlx::query_as::<_, Survey>(&query)
            .bind(id)
            .fetch_optional(executor)
            .await
    }

    /// Build the ordered question tree of a survey from its finalized
    /// questions, categories and options.
    pub async fn load_tree(conn: &mut PgConnection, survey_id: DbId) -> Result<QuestionTree, DbError> {
        let questions = QuestionRepo::list_questions(&mut *conn, survey_id).await?;
        let categories = QuestionRepo::list_categories(&mut *conn, survey_id).await?;
        let options = QuestionRepo::list_options(&mut *conn, survey_id).await?;

        let questions = questions
            .iter()
            .map(|q| q.to_node())
            .collect::<Result<Vec<_>, CoreError>>()?;
        let categories = categories.iter().map(|c| c.to_node()).collect();
        let options = options.iter().map(|o| o.to_node()).collect();

        Ok(QuestionTree::new(survey_id, questions, categories, options))
    }
}
