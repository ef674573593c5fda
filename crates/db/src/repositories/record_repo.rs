//! Repository for the `records` table.

use sqlx::PgExecutor;
use surveyor_core::types::{DbId, Timestamp};

use crate::models::record::{CreateRecord, Record};

const COLUMNS: &str = "id, response_id, category_id, created_at, updated_at";

pub struct RecordRepo;

impl RecordRepo {
    /// Insert an unlinked record.
    pub async fn create(
        executor: impl PgExecutor<'_>,
        input: &CreateRecord,
    ) -> Result<Record, sqlx::Error> {
        let query = format!(
            "INSERT INTO records (category_id) VALUES ($1) RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Record>(&query)
            .bind(input.category_id)
            .fetch_one(executor)
            .await
    }

    pub async fn find_by_id(
        executor: impl PgExecutor<'_>,
        id: DbId,
    ) -> Result<Option<Record>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM records WHERE id = $1");
        sqlx::query_as::<_, Record>(&query)
            .bind(id)
            .fetch_optional(executor)
            .await
    }

    /// Ids of the given records that exist.
    pub async fn existing_ids(
        executor: impl PgExecutor<'_>,
        ids: &[DbId],
    ) -> Result<Vec<DbId>, sqlx::Error> {
        let rows: Vec<(DbId,)> = sqlx::query_as("SELECT id FROM records WHERE id = ANY($1)")
            .bind(ids)
            .fetch_all(executor)
            .await?;
        Ok(rows.into_iter().map(|(id,)| id).collect())
    }

    /// Stamp `response_id` on every record referenced by the response's
    /// answers that is not linked yet. Linked records are never reassigned.
    ///
    /// Returns the number of records newly linked.
    pub async fn link_to_response(
        executor: impl PgExecutor<'_>,
        response_id: DbId,
        now: Timestamp,
    ) -> Result<u64, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE records SET response_id = $1, updated_at = $2 \
             WHERE response_id IS NULL \
               AND id IN (SELECT record_id FROM answers \
                          WHERE response_id = $1 AND record_id IS NOT NULL)",
        )
        .bind(response_id)
        .bind(now)
        .execute(executor)
        .await?;
        Ok(result.rows_affected())
    }
}
