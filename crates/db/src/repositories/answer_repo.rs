//! Repository for the `answers` and `choices` tables.

use sqlx::{PgConnection, PgExecutor};
use surveyor_core::types::{DbId, Timestamp};

use crate::models::answer::{Answer, AnswerWrite, Choice};

const COLUMNS: &str = "id, response_id, question_id, record_id, content, photo, \
    created_at, updated_at";

const CHOICE_COLUMNS: &str = "id, answer_id, option_id, created_at";

pub struct AnswerRepo;

impl AnswerRepo {
    // ── Answers ──────────────────────────────────────────────────────

    /// All answers of a response, in insertion order.
    pub async fn list_for_response(
        executor: impl PgExecutor<'_>,
        response_id: DbId,
    ) -> Result<Vec<Answer>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM answers WHERE response_id = $1 ORDER BY id"
        );
        sqlx::query_as::<_, Answer>(&query)
            .bind(response_id)
            .fetch_all(executor)
            .await
    }

    /// Insert an answer. Its selected options are written separately with
    /// [`AnswerRepo::replace_choices`].
    pub async fn insert(
        executor: impl PgExecutor<'_>,
        response_id: DbId,
        input: &AnswerWrite,
        updated_at: Timestamp,
    ) -> Result<Answer, sqlx::Error> {
        let query = format!(
            "INSERT INTO answers
                (response_id, question_id, record_id, content, photo, created_at, updated_at)
             VALUES ($1, $2, $3, $4, $5, $6, $6)
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Answer>(&query)
            .bind(response_id)
            .bind(input.question_id)
            .bind(input.record_id)
            .bind(&input.content)
            .bind(&input.photo)
            .bind(updated_at)
            .fetch_one(executor)
            .await
    }

    /// Update an answer. `None` content, photo or record keep their value.
    pub async fn update(
        executor: impl PgExecutor<'_>,
        id: DbId,
        input: &AnswerWrite,
        updated_at: Timestamp,
    ) -> Result<Option<Answer>, sqlx::Error> {
        let query = format!(
            "UPDATE answers SET
                record_id = COALESCE($2, record_id),
                content = COALESCE($3, content),
                photo = COALESCE($4, photo),
                updated_at = $5
             WHERE id = $1
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Answer>(&query)
            .bind(id)
            .bind(input.record_id)
            .bind(&input.content)
            .bind(&input.photo)
            .bind(updated_at)
            .fetch_optional(executor)
            .await
    }

    /// Clear the stored value of each answer: content, photo and choices.
    /// The rows themselves stay.
    pub async fn clear(
        conn: &mut PgConnection,
        ids: &[DbId],
        now: Timestamp,
    ) -> Result<u64, sqlx::Error> {
        if ids.is_empty() {
            return Ok(0);
        }
        sqlx::query("DELETE FROM choices WHERE answer_id = ANY($1)")
            .bind(ids)
            .execute(&mut *conn)
            .await?;
        let result = sqlx::query(
            "UPDATE answers SET content = NULL, photo = NULL, updated_at = $2 \
             WHERE id = ANY($1)",
        )
        .bind(ids)
        .bind(now)
        .execute(&mut *conn)
        .await?;
        Ok(result.rows_affected())
    }

    /// Insert an empty answer for each question that has none yet in this
    /// response (outside any record). Returns the number created.
    pub async fn insert_blank(
        executor: impl PgExecutor<'_>,
        response_id: DbId,
        question_ids: &[DbId],
        now: Timestamp,
    ) -> Result<u64, sqlx::Error> {
        if question_ids.is_empty() {
            return Ok(0);
        }
        let result = sqlx::query(
            "INSERT INTO answers (response_id, question_id, created_at, updated_at) \
             SELECT $1, q, $3, $3 FROM UNNEST($2::bigint[]) AS q \
             ON CONFLICT DO NOTHING",
        )
        .bind(response_id)
        .bind(question_ids)
        .bind(now)
        .execute(executor)
        .await?;
        Ok(result.rows_affected())
    }

    // ── Choices ──────────────────────────────────────────────────────

    /// Replace the selected options of an answer.
    pub async fn replace_choices(
        conn: &mut PgConnection,
        answer_id: DbId,
        option_ids: &[DbId],
    ) -> Result<(), sqlx::Error> {
        sqlx::query("DELETE FROM choices WHERE answer_id = $1")
            .bind(answer_id)
            .execute(&mut *conn)
            .await?;
        if option_ids.is_empty() {
            return Ok(());
        }
        sqlx::query(
            "INSERT INTO choices (answer_id, option_id) \
             SELECT $1, o FROM UNNEST($2::bigint[]) AS o \
             ON CONFLICT DO NOTHING",
        )
        .bind(answer_id)
        .bind(option_ids)
        .execute(&mut *conn)
        .await?;
        Ok(())
    }

    /// Every choice of every answer of a response.
    pub async fn list_choices_for_response(
        executor: impl PgExecutor<'_>,
        response_id: DbId,
    ) -> Result<Vec<Choice>, sqlx::Error> {
        let query = format!(
            "SELECT {CHOICE_COLUMNS} FROM choices
             WHERE answer_id IN (SELECT id FROM answers WHERE response_id = $1)
             ORDER BY answer_id, id"
        );
        sqlx::query_as::<_, Choice>(&query)
            .bind(response_id)
            .fetch_all(executor)
            .await
    }
}
