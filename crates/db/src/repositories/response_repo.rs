//! Repository for the `responses` table.

use sqlx::PgExecutor;
use surveyor_core::status::StatusChange;
use surveyor_core::types::{DbId, Timestamp};

use crate::models::response::{CreateResponse, Response, ResponseFilter, UpdateResponse};

const COLUMNS: &str = "id, survey_id, organization_id, user_id, status, completed_at, \
    session_token, mobile_id, latitude, longitude, ip_address, location, comment, blank, \
    created_at, updated_at";

pub struct ResponseRepo;

impl ResponseRepo {
    // ── Standard CRUD ────────────────────────────────────────────────

    /// Insert a response, stamping both timestamps with `now`.
    pub async fn insert(
        executor: impl PgExecutor<'_>,
        input: &CreateResponse,
        completed_at: Option<Timestamp>,
        now: Timestamp,
    ) -> Result<Response, sqlx::Error> {
        let query = format!(
            "INSERT INTO responses
                (survey_id, organization_id, user_id, status, completed_at, session_token,
                 mobile_id, latitude, longitude, ip_address, comment, blank, created_at, updated_at)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $13)
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Response>(&query)
            .bind(input.survey_id)
            .bind(input.organization_id)
            .bind(input.user_id)
            .bind(input.status.as_str())
            .bind(completed_at)
            .bind(&input.session_token)
            .bind(&input.mobile_id)
            .bind(input.latitude)
            .bind(input.longitude)
            .bind(&input.ip_address)
            .bind(&input.comment)
            .bind(input.blank)
            .bind(now)
            .fetch_one(executor)
            .await
    }

    pub async fn find_by_id(
        executor: impl PgExecutor<'_>,
        id: DbId,
    ) -> Result<Option<Response>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM responses WHERE id = $1");
        sqlx::query_as::<_, Response>(&query)
            .bind(id)
            .fetch_optional(executor)
            .await
    }

    /// Write the permitted attributes. `None` attributes keep their value.
    pub async fn update_attributes(
        executor: impl PgExecutor<'_>,
        id: DbId,
        input: &UpdateResponse,
        now: Timestamp,
    ) -> Result<Option<Response>, sqlx::Error> {
        let query = format!(
            "UPDATE responses SET
                status = $2,
                completed_at = $3,
                comment = COALESCE($4, comment),
                latitude = COALESCE($5, latitude),
                longitude = COALESCE($6, longitude),
                ip_address = COALESCE($7, ip_address),
                updated_at = $8
             WHERE id = $1
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Response>(&query)
            .bind(id)
            .bind(input.status.as_str())
            .bind(input.completed_at)
            .bind(&input.comment)
            .bind(input.latitude)
            .bind(input.longitude)
            .bind(&input.ip_address)
            .bind(now)
            .fetch_optional(executor)
            .await
    }

    /// Write only `status` and `completed_at`. No other column is touched,
    /// `updated_at` included.
    pub async fn update_status(
        executor: impl PgExecutor<'_>,
        id: DbId,
        change: StatusChange,
    ) -> Result<Option<Response>, sqlx::Error> {
        let query = format!(
            "UPDATE responses SET status = $2, completed_at = $3
             WHERE id = $1
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Response>(&query)
            .bind(id)
            .bind(change.status.as_str())
            .bind(change.completed_at)
            .fetch_optional(executor)
            .await
    }

    /// Bump `updated_at` after the response's answers changed.
    pub async fn touch(
        executor: impl PgExecutor<'_>,
        id: DbId,
        now: Timestamp,
    ) -> Result<(), sqlx::Error> {
        sqlx::query("UPDATE responses SET updated_at = $2 WHERE id = $1")
            .bind(id)
            .bind(now)
            .execute(executor)
            .await?;
        Ok(())
    }

    /// Delete a response. Answers, choices and linked records cascade.
    /// Returns `true` if a row was removed.
    pub async fn delete(executor: impl PgExecutor<'_>, id: DbId) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM responses WHERE id = $1")
            .bind(id)
            .execute(executor)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    // ── Queries ──────────────────────────────────────────────────────

    /// List a survey's responses, earliest `updated_at` first.
    pub async fn list_for_survey(
        executor: impl PgExecutor<'_>,
        survey_id: DbId,
        filter: &ResponseFilter,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Response>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM responses
             WHERE survey_id = $1
               AND ($2::boolean = false OR status = 'complete')
               AND ($3::timestamptz IS NULL OR created_at >= $3)
               AND ($4::timestamptz IS NULL OR created_at <= $4)
             ORDER BY updated_at ASC, id ASC
             LIMIT $5 OFFSET $6"
        );
        sqlx::query_as::<_, Response>(&query)
            .bind(survey_id)
            .bind(filter.completed)
            .bind(filter.created_from)
            .bind(filter.created_to)
            .bind(limit)
            .bind(offset)
            .fetch_all(executor)
            .await
    }

    /// The latest of the response's `updated_at` and its answers'.
    pub async fn last_update(
        executor: impl PgExecutor<'_>,
        id: DbId,
    ) -> Result<Option<Timestamp>, sqlx::Error> {
        let row: Option<(Timestamp,)> = sqlx::query_as(
            "SELECT GREATEST(r.updated_at, \
                    (SELECT MAX(a.updated_at) FROM answers a WHERE a.response_id = r.id)) \
             FROM responses r WHERE r.id = $1",
        )
        .bind(id)
        .fetch_optional(executor)
        .await?;
        Ok(row.map(|(at,)| at))
    }
}
