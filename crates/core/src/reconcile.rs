//! Answer reconciliation for resumed or concurrent submissions.
//!
//! An incoming answer loses only when its `updated_at` is strictly older than
//! the stored answer it would overwrite, whether that answer is named by `id`
//! or found by `(question_id, record_id)`. Ties, missing timestamps, and
//! brand-new answers are all accepted.

use crate::params::AnswerParams;
use crate::types::{DbId, Timestamp};

/// The merge-relevant columns of a persisted answer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExistingAnswer {
    pub id: DbId,
    pub question_id: DbId,
    pub record_id: Option<DbId>,
    pub updated_at: Timestamp,
}

/// Whether an incoming edit is older than what is stored.
pub fn is_stale(incoming_updated_at: Option<Timestamp>, existing_updated_at: Timestamp) -> bool {
    matches!(incoming_updated_at, Some(incoming) if incoming < existing_updated_at)
}

/// Keep the incoming answers that are not stale, preserving their order.
pub fn select_new_answers(existing: &[ExistingAnswer], incoming: Vec<AnswerParams>) -> Vec<AnswerParams> {
    incoming
        .into_iter()
        .filter(|answer| match target_of(existing, answer) {
            Some(stored) => !is_stale(answer.updated_at, stored.updated_at),
            None => true,
        })
        .collect()
}

/// The existing answer an incoming one writes to: by `id` first, otherwise
/// by `(question_id, record_id)`.
pub fn target_of<'a>(existing: &'a [ExistingAnswer], incoming: &AnswerParams) -> Option<&'a ExistingAnswer> {
    match incoming.id {
        Some(id) => existing.iter().find(|e| e.id == id),
        None => {
            let question_id = incoming.question_id?;
            existing
                .iter()
                .find(|e| e.question_id == question_id && e.record_id == incoming.record_id)
        }
    }
}

/// Existing answers the incoming set does not mention at all. An edit form
/// submits every answer it shows, so these were removed by the user.
pub fn omitted_answers(existing: &[ExistingAnswer], incoming: &[AnswerParams]) -> Vec<DbId> {
    existing
        .iter()
        .filter(|stored| {
            !incoming
                .iter()
                .any(|answer| target_of(std::slice::from_ref(*stored), answer).is_some())
        })
        .map(|stored| stored.id)
        .collect()
}
