use surveyor_core::error::CoreError;
use surveyor_core::types::DbId;

/// Failure of a persistence operation.
///
/// Validation failures are not errors here: they come back as
/// [`SaveOutcome::Rejected`](crate::coordinator::SaveOutcome::Rejected).
#[derive(Debug, thiserror::Error)]
pub enum DbError {
    /// Domain error, typically `NotFound`.
    #[error(transparent)]
    Core(#[from] CoreError),

    /// The store itself failed (connection loss, constraint, ...).
    #[error("Storage error: {0}")]
    Storage(#[from] sqlx::Error),
}

impl DbError {
    pub fn not_found(entity: &'static str, id: DbId) -> Self {
        DbError::Core(CoreError::NotFound { entity, id })
    }
}
