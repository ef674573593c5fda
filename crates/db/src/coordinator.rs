//! Response Transaction Coordinator.
//!
//! Every operation runs in a single transaction. Rules from
//! `surveyor_core` are evaluated before any write of the step they guard;
//! a rejected batch is rolled back explicitly and reported as
//! [`SaveOutcome::Rejected`]. Storage failures also roll back and propagate
//! as [`DbError::Storage`].

use std::collections::HashSet;

use base64::Engine as _;
use sqlx::{PgConnection, Postgres, Transaction};
use surveyor_core::clock::Clock;
use surveyor_core::params::{
    AnswerParams, CreateResponseParams, MergeStatusRequest, Respondent, UpdateResponseParams,
};
use surveyor_core::projector;
use surveyor_core::question::{self, AnswerDraft};
use surveyor_core::reconcile::{self, ExistingAnswer};
use surveyor_core::status::{self, ResponseStatus, StatusChange};
use surveyor_core::tree::QuestionTree;
use surveyor_core::types::{DbId, Timestamp};
use surveyor_core::validation::{self, FieldViolation, ValidationErrors};
use validator::Validate;

use crate::error::DbError;
use crate::models::answer::{Answer, AnswerWrite, Choice};
use crate::models::response::{CreateResponse, Response, ResponsePayload, UpdateResponse};
use crate::models::survey::Survey;
use crate::repositories::{AnswerRepo, RecordRepo, ResponseRepo, SurveyRepo};
use crate::DbPool;

/// Result of a coordinated save.
#[derive(Debug, Clone, PartialEq)]
pub enum SaveOutcome<T> {
    /// Nothing was submitted; nothing was written.
    NoChanges,
    /// Committed.
    Saved(T),
    /// Validation failed; the transaction was rolled back.
    Rejected(ValidationErrors),
}

impl<T> SaveOutcome<T> {
    /// `NoChanges` counts as success.
    pub fn is_success(&self) -> bool {
        !matches!(self, SaveOutcome::Rejected(_))
    }
}

pub struct ResponseCoordinator;

impl ResponseCoordinator {
    // ── Create / update ──────────────────────────────────────────────

    /// Create a response with its nested answers.
    ///
    /// Attributes are written first, answers only once the response itself
    /// is valid, then referenced records are linked. Any violation discards
    /// the whole attempt.
    pub async fn create_valid_response_from_params(
        pool: &DbPool,
        clock: &dyn Clock,
        survey_id: DbId,
        respondent: &Respondent,
        params: CreateResponseParams,
    ) -> Result<SaveOutcome<Response>, DbError> {
        if let Err(errors) = params.validate() {
            return Ok(SaveOutcome::Rejected(errors.into()));
        }
        let mut tx = pool.begin().await?;
        let result = Self::create_in_tx(&mut tx, clock, survey_id, respondent, params).await;
        finish(tx, result).await
    }

    async fn create_in_tx(
        conn: &mut PgConnection,
        clock: &dyn Clock,
        survey_id: DbId,
        respondent: &Respondent,
        params: CreateResponseParams,
    ) -> Result<SaveOutcome<Response>, DbError> {
        let survey = find_survey(&mut *conn, survey_id).await?;

        let mut draft = CreateResponse::from_params(&params);
        draft.set_respondent(survey_id, respondent);

        let errors = validation::validate_response(None, &draft.state(survey.is_public));
        if !errors.is_empty() {
            tracing::info!(survey_id, violations = errors.len(), "Response rejected");
            return Ok(SaveOutcome::Rejected(errors));
        }

        let now = clock.now();
        let completed_at = status::completion_timestamp(draft.status, None, now);
        let response = ResponseRepo::insert(&mut *conn, &draft, completed_at, now).await?;

        if let Some(answers) = params.answers {
            let tree = SurveyRepo::load_tree(&mut *conn, survey_id).await?;
            let errors =
                apply_answers(&mut *conn, &tree, response.id, draft.status, &answers, &[], &[], now)
                    .await?;
            if !errors.is_empty() {
                tracing::info!(
                    survey_id,
                    violations = errors.len(),
                    "Response rejected, answers invalid"
                );
                return Ok(SaveOutcome::Rejected(errors));
            }
        }

        let linked = RecordRepo::link_to_response(&mut *conn, response.id, now).await?;
        tracing::info!(
            response_id = response.id,
            survey_id,
            status = %draft.status,
            records_linked = linked,
            "Response created"
        );
        Ok(SaveOutcome::Saved(response))
    }

    /// Update a response's attributes and answers.
    ///
    /// An empty request is `NoChanges`. The status is resolved before the
    /// answers are validated, so mandatory checks see the intended status.
    /// Stale answers are skipped; omitted answers are left alone. Completing
    /// the response also re-checks every stored answer the batch leaves as is.
    pub async fn update_valid_response_from_params(
        pool: &DbPool,
        clock: &dyn Clock,
        response_id: DbId,
        params: UpdateResponseParams,
    ) -> Result<SaveOutcome<Response>, DbError> {
        if params.is_empty() {
            return Ok(SaveOutcome::NoChanges);
        }
        if let Err(errors) = params.validate() {
            return Ok(SaveOutcome::Rejected(errors.into()));
        }
        let mut tx = pool.begin().await?;
        let result = Self::update_in_tx(&mut tx, clock, response_id, params).await;
        finish(tx, result).await
    }

    async fn update_in_tx(
        conn: &mut PgConnection,
        clock: &dyn Clock,
        response_id: DbId,
        params: UpdateResponseParams,
    ) -> Result<SaveOutcome<Response>, DbError> {
        let response = find_response(&mut *conn, response_id).await?;
        let survey = find_survey(&mut *conn, response.survey_id).await?;

        let current = response.state(survey.is_public)?;
        let next_status = params.status.unwrap_or(current.status);
        let proposed = validation::ResponseState {
            status: next_status,
            ..current.clone()
        };
        let errors = validation::validate_response(Some(&current), &proposed);
        if !errors.is_empty() {
            tracing::info!(response_id, violations = errors.len(), "Response update rejected");
            return Ok(SaveOutcome::Rejected(errors));
        }

        let now = clock.now();
        let change = StatusChange {
            status: next_status,
            completed_at: status::completion_timestamp(next_status, response.completed_at, now),
        };
        let attributes = UpdateResponse::from_params(&params, change);

        let existing = AnswerRepo::list_for_response(&mut *conn, response_id).await?;
        let choices = AnswerRepo::list_choices_for_response(&mut *conn, response_id).await?;
        let fresh = params
            .answers
            .map(|incoming| select_fresh(response_id, &existing, incoming));
        let tree = SurveyRepo::load_tree(&mut *conn, response.survey_id).await?;

        if next_status.is_complete() {
            let keys: Vec<ExistingAnswer> = existing.iter().map(Answer::to_existing).collect();
            let overwritten: HashSet<DbId> = fresh
                .iter()
                .flatten()
                .filter_map(|answer| reconcile::target_of(&keys, answer))
                .map(|stored| stored.id)
                .collect();
            let errors =
                stored_answer_violations(&tree, &existing, &choices, &overwritten, next_status);
            if !errors.is_empty() {
                tracing::info!(
                    response_id,
                    violations = errors.len(),
                    "Response update rejected, stored answers invalid"
                );
                return Ok(SaveOutcome::Rejected(errors));
            }
        }

        let updated = ResponseRepo::update_attributes(&mut *conn, response_id, &attributes, now)
            .await?
            .ok_or_else(|| DbError::not_found("Response", response_id))?;

        if let Some(fresh) = fresh {
            let errors = apply_answers(
                &mut *conn,
                &tree,
                response_id,
                next_status,
                &fresh,
                &existing,
                &choices,
                now,
            )
            .await?;
            if !errors.is_empty() {
                tracing::info!(
                    response_id,
                    violations = errors.len(),
                    "Response update rejected, answers invalid"
                );
                return Ok(SaveOutcome::Rejected(errors));
            }
            RecordRepo::link_to_response(&mut *conn, response_id, now).await?;
        }

        tracing::info!(response_id, status = %next_status, "Response updated");
        Ok(SaveOutcome::Saved(updated))
    }

    /// Replace the response's answer set.
    ///
    /// `None` is a successful no-op. Otherwise submitted answers are written
    /// (stale ones skipped) and every stored answer the submission does not
    /// mention is cleared. One invalid answer rolls back all of it.
    pub async fn update_answers(
        pool: &DbPool,
        clock: &dyn Clock,
        response_id: DbId,
        answers: Option<Vec<AnswerParams>>,
    ) -> Result<SaveOutcome<Vec<Answer>>, DbError> {
        let Some(answers) = answers else {
            return Ok(SaveOutcome::NoChanges);
        };
        let mut tx = pool.begin().await?;
        let result = Self::update_answers_in_tx(&mut tx, clock, response_id, answers).await;
        finish(tx, result).await
    }

    async fn update_answers_in_tx(
        conn: &mut PgConnection,
        clock: &dyn Clock,
        response_id: DbId,
        incoming: Vec<AnswerParams>,
    ) -> Result<SaveOutcome<Vec<Answer>>, DbError> {
        let response = find_response(&mut *conn, response_id).await?;
        let response_status = response.status()?;
        let now = clock.now();

        let existing = AnswerRepo::list_for_response(&mut *conn, response_id).await?;
        let choices = AnswerRepo::list_choices_for_response(&mut *conn, response_id).await?;
        let existing_keys: Vec<ExistingAnswer> = existing.iter().map(Answer::to_existing).collect();
        // Omitted answers that are already empty are left as they are.
        let omitted: Vec<DbId> = reconcile::omitted_answers(&existing_keys, &incoming)
            .into_iter()
            .filter(|id| {
                existing
                    .iter()
                    .any(|a| a.id == *id && !is_empty_answer(a, &choices))
            })
            .collect();
        let fresh = select_fresh(response_id, &existing, incoming);

        let tree = SurveyRepo::load_tree(&mut *conn, response.survey_id).await?;

        let mut errors = ValidationErrors::new();
        if response_status.is_complete() {
            for answer in existing.iter().filter(|a| omitted.contains(&a.id)) {
                if tree.question(answer.question_id).is_some_and(|q| q.mandatory) {
                    errors.push(
                        FieldViolation::new(
                            "content",
                            "mandatory",
                            "A mandatory answer cannot be removed from a completed response",
                        )
                        .under(&format!("answers[id={}]", answer.id)),
                    );
                }
            }
        }
        if !errors.is_empty() {
            tracing::info!(response_id, violations = errors.len(), "Answer update rejected");
            return Ok(SaveOutcome::Rejected(errors));
        }

        let errors = apply_answers(
            &mut *conn,
            &tree,
            response_id,
            response_status,
            &fresh,
            &existing,
            &choices,
            now,
        )
        .await?;
        if !errors.is_empty() {
            tracing::info!(response_id, violations = errors.len(), "Answer update rejected");
            return Ok(SaveOutcome::Rejected(errors));
        }

        let cleared = AnswerRepo::clear(&mut *conn, &omitted, now).await?;
        RecordRepo::link_to_response(&mut *conn, response_id, now).await?;
        ResponseRepo::touch(&mut *conn, response_id, now).await?;

        tracing::info!(
            response_id,
            written = fresh.len(),
            cleared,
            "Answers updated"
        );
        let answers = AnswerRepo::list_for_response(&mut *conn, response_id).await?;
        Ok(SaveOutcome::Saved(answers))
    }

    // ── Status ───────────────────────────────────────────────────────

    /// Move the response to `next`, writing only `status` and
    /// `completed_at`. Downgrading a completed response is rejected.
    pub async fn mark_status(
        pool: &DbPool,
        clock: &dyn Clock,
        response_id: DbId,
        next: ResponseStatus,
    ) -> Result<SaveOutcome<Response>, DbError> {
        let mut tx = pool.begin().await?;
        let result: Result<SaveOutcome<Response>, DbError> = async {
            let response = find_response(&mut *tx, response_id).await?;
            apply_transition(&mut *tx, clock, &response, next).await
        }
        .await;
        finish(tx, result).await
    }

    /// Apply an offline client's status only when its timestamp is strictly
    /// newer than the response's `updated_at`. Otherwise `NoChanges`.
    pub async fn merge_status(
        pool: &DbPool,
        clock: &dyn Clock,
        response_id: DbId,
        incoming: MergeStatusRequest,
    ) -> Result<SaveOutcome<Response>, DbError> {
        let mut tx = pool.begin().await?;
        let result: Result<SaveOutcome<Response>, DbError> = async {
            let response = find_response(&mut *tx, response_id).await?;
            if !status::is_newer(incoming.updated_at, response.updated_at) {
                tracing::debug!(
                    response_id,
                    incoming_at = %incoming.updated_at,
                    current_at = %response.updated_at,
                    "Ignoring stale status merge"
                );
                return Ok(SaveOutcome::NoChanges);
            }
            apply_transition(&mut *tx, clock, &response, incoming.status).await
        }
        .await;
        finish(tx, result).await
    }

    // ── Projection ───────────────────────────────────────────────────

    /// Insert an empty answer for every question in the survey that the
    /// response has not answered. Returns the number created.
    pub async fn create_blank_answers(
        pool: &DbPool,
        clock: &dyn Clock,
        response_id: DbId,
    ) -> Result<u64, DbError> {
        let mut tx = pool.begin().await?;
        let result = async {
            let response = find_response(&mut *tx, response_id).await?;
            let tree = SurveyRepo::load_tree(&mut *tx, response.survey_id).await?;
            let existing = AnswerRepo::list_for_response(&mut *tx, response_id).await?;
            let missing =
                projector::unanswered_questions(&tree, existing.iter().map(|a| a.question_id));
            let created =
                AnswerRepo::insert_blank(&mut *tx, response_id, &missing, clock.now()).await?;
            tracing::debug!(response_id, created, "Blank answers created");
            Ok::<_, DbError>(created)
        }
        .await;
        match result {
            Ok(created) => {
                tx.commit().await?;
                Ok(created)
            }
            Err(e) => {
                rollback(tx).await;
                Err(e)
            }
        }
    }

    /// The response's answers in question-tree order.
    pub async fn sorted_answers(pool: &DbPool, response_id: DbId) -> Result<Vec<Answer>, DbError> {
        let mut conn = pool.acquire().await?;
        let (_, answers) = load_sorted(&mut conn, response_id).await?;
        Ok(answers)
    }

    /// The response with its sorted answers, their choices and photos.
    pub async fn payload(pool: &DbPool, response_id: DbId) -> Result<ResponsePayload, DbError> {
        let mut conn = pool.acquire().await?;
        let (response, answers) = load_sorted(&mut conn, response_id).await?;
        let choices = AnswerRepo::list_choices_for_response(&mut *conn, response_id).await?;
        Ok(ResponsePayload::build(response, answers, choices))
    }

    /// Delete a response with its answers, choices and linked records.
    pub async fn delete(pool: &DbPool, response_id: DbId) -> Result<(), DbError> {
        if !ResponseRepo::delete(pool, response_id).await? {
            return Err(DbError::not_found("Response", response_id));
        }
        tracing::info!(response_id, "Response deleted");
        Ok(())
    }
}

// ── Helpers ──────────────────────────────────────────────────────────

/// Commit a saved outcome; roll back anything else.
async fn finish<T>(
    tx: Transaction<'_, Postgres>,
    result: Result<SaveOutcome<T>, DbError>,
) -> Result<SaveOutcome<T>, DbError> {
    match result {
        Ok(SaveOutcome::Saved(value)) => {
            tx.commit().await?;
            Ok(SaveOutcome::Saved(value))
        }
        other => {
            rollback(tx).await;
            other
        }
    }
}

async fn rollback(tx: Transaction<'_, Postgres>) {
    if let Err(e) = tx.rollback().await {
        tracing::error!(error = %e, "Failed to roll back response transaction");
    }
}

async fn find_response(conn: &mut PgConnection, id: DbId) -> Result<Response, DbError> {
    ResponseRepo::find_by_id(conn, id)
        .await?
        .ok_or_else(|| DbError::not_found("Response", id))
}

async fn find_survey(conn: &mut PgConnection, id: DbId) -> Result<Survey, DbError> {
    SurveyRepo::find_by_id(conn, id)
        .await?
        .ok_or_else(|| DbError::not_found("Survey", id))
}

async fn load_sorted(
    conn: &mut PgConnection,
    response_id: DbId,
) -> Result<(Response, Vec<Answer>), DbError> {
    let response = find_response(&mut *conn, response_id).await?;
    let tree = SurveyRepo::load_tree(&mut *conn, response.survey_id).await?;
    let answers = AnswerRepo::list_for_response(&mut *conn, response_id).await?;
    Ok((response, projector::sorted_answers(&tree, answers)))
}

async fn apply_transition(
    conn: &mut PgConnection,
    clock: &dyn Clock,
    response: &Response,
    next: ResponseStatus,
) -> Result<SaveOutcome<Response>, DbError> {
    let persisted = response.status()?;
    let change = match status::transition(persisted, response.completed_at, next, clock.now()) {
        Ok(change) => change,
        Err(violation) => {
            tracing::info!(
                response_id = response.id,
                from = %persisted,
                to = %next,
                "Status change rejected"
            );
            return Ok(SaveOutcome::Rejected(violation.into()));
        }
    };
    let updated = ResponseRepo::update_status(conn, response.id, change)
        .await?
        .ok_or_else(|| DbError::not_found("Response", response.id))?;
    tracing::info!(response_id = response.id, from = %persisted, to = %next, "Status changed");
    Ok(SaveOutcome::Saved(updated))
}

fn select_fresh(response_id: DbId, existing: &[Answer], incoming: Vec<AnswerParams>) -> Vec<AnswerParams> {
    let keys: Vec<ExistingAnswer> = existing.iter().map(Answer::to_existing).collect();
    let submitted = incoming.len();
    let fresh = reconcile::select_new_answers(&keys, incoming);
    if fresh.len() < submitted {
        tracing::debug!(
            response_id,
            stale = submitted - fresh.len(),
            "Skipping stale answers"
        );
    }
    fresh
}

fn stored_options(answer_id: DbId, choices: &[Choice]) -> Vec<DbId> {
    choices
        .iter()
        .filter(|c| c.answer_id == answer_id)
        .map(|c| c.option_id)
        .collect()
}

fn is_empty_answer(answer: &Answer, choices: &[Choice]) -> bool {
    answer.content.is_none()
        && answer.photo.is_none()
        && !choices.iter().any(|c| c.answer_id == answer.id)
}

/// Stored answers the batch does not overwrite must still satisfy their
/// questions at `response_status`.
fn stored_answer_violations(
    tree: &QuestionTree,
    existing: &[Answer],
    choices: &[Choice],
    overwritten: &HashSet<DbId>,
    response_status: ResponseStatus,
) -> ValidationErrors {
    let mut errors = ValidationErrors::new();
    for answer in existing.iter().filter(|a| !overwritten.contains(&a.id)) {
        let Some(question) = tree.question(answer.question_id) else {
            continue;
        };
        let option_ids = stored_options(answer.id, choices);
        let draft = AnswerDraft {
            content: answer.content.as_deref(),
            option_ids: &option_ids,
            has_photo: answer.photo.is_some(),
        };
        let prefix = format!("answers[id={}]", answer.id);
        errors.extend(
            question::validate_answer(
                question,
                tree.options_for(answer.question_id),
                &draft,
                response_status,
            )
            .into_iter()
            .map(|v| v.under(&prefix)),
        );
    }
    errors
}

/// One validated incoming answer, ready to write.
struct PlannedWrite {
    target: Option<DbId>,
    write: AnswerWrite,
    updated_at: Option<Timestamp>,
}

/// Validate every incoming answer, then write them all. Nothing is written
/// when any answer is invalid; the violations are returned instead.
///
/// Referencing an answer of another response, or a record that does not
/// exist, is `NotFound`.
#[allow(clippy::too_many_arguments)]
async fn apply_answers(
    conn: &mut PgConnection,
    tree: &QuestionTree,
    response_id: DbId,
    response_status: ResponseStatus,
    incoming: &[AnswerParams],
    existing: &[Answer],
    existing_choices: &[Choice],
    now: Timestamp,
) -> Result<ValidationErrors, DbError> {
    let record_ids: Vec<DbId> = incoming
        .iter()
        .filter_map(|a| a.record_id)
        .collect::<HashSet<_>>()
        .into_iter()
        .collect();
    if !record_ids.is_empty() {
        let found = RecordRepo::existing_ids(&mut *conn, &record_ids).await?;
        if let Some(missing) = record_ids.iter().find(|id| !found.contains(id)) {
            return Err(DbError::not_found("Record", *missing));
        }
    }

    let keys: Vec<ExistingAnswer> = existing.iter().map(Answer::to_existing).collect();
    let mut errors = ValidationErrors::new();
    let mut planned = Vec::with_capacity(incoming.len());
    // (question_id, record_id) of every answer already planned in this batch.
    let mut claimed: HashSet<(DbId, Option<DbId>)> = HashSet::new();

    for (index, params) in incoming.iter().enumerate() {
        let prefix = format!("answers[{index}]");

        let target = match params.id {
            Some(id) => Some(
                existing
                    .iter()
                    .find(|a| a.id == id)
                    .ok_or_else(|| DbError::not_found("Answer", id))?,
            ),
            None => reconcile::target_of(&keys, params)
                .and_then(|key| existing.iter().find(|a| a.id == key.id)),
        };

        let Some(question_id) = target.map(|a| a.question_id).or(params.question_id) else {
            errors.push(
                FieldViolation::new("question_id", "required", "question_id can't be blank")
                    .under(&prefix),
            );
            continue;
        };
        let Some(question) = tree.question(question_id) else {
            errors.push(
                FieldViolation::new(
                    "question_id",
                    "not_in_survey",
                    format!(
                        "Question {question_id} does not belong to survey {}",
                        tree.survey_id()
                    ),
                )
                .under(&prefix),
            );
            continue;
        };

        let slot = match target {
            Some(answer) => (answer.question_id, answer.record_id),
            None => (question_id, params.record_id),
        };
        if !claimed.insert(slot) {
            errors.push(
                FieldViolation::new(
                    "question_id",
                    "duplicate",
                    format!("Question {question_id} is answered more than once in this batch"),
                )
                .under(&prefix),
            );
            continue;
        }

        let photo = match params.photo_in_base64.as_deref() {
            Some(encoded) => match base64::engine::general_purpose::STANDARD.decode(encoded) {
                Ok(bytes) => Some(bytes),
                Err(_) => {
                    errors.push(
                        FieldViolation::new(
                            "photo_in_base64",
                            "invalid_base64",
                            "Photo is not valid base64",
                        )
                        .under(&prefix),
                    );
                    continue;
                }
            },
            None => None,
        };

        // Unsubmitted values keep what is stored; validate the result.
        let current_options = match target {
            Some(answer) => stored_options(answer.id, existing_choices),
            None => Vec::new(),
        };
        let draft = AnswerDraft {
            content: params
                .content
                .as_deref()
                .or_else(|| target.and_then(|a| a.content.as_deref())),
            option_ids: params.option_ids.as_deref().unwrap_or(&current_options[..]),
            has_photo: photo.is_some() || target.is_some_and(|a| a.photo.is_some()),
        };
        let violations = question::validate_answer(
            question,
            tree.options_for(question_id),
            &draft,
            response_status,
        );
        if !violations.is_empty() {
            errors.extend(violations.into_iter().map(|v| v.under(&prefix)));
            continue;
        }

        planned.push(PlannedWrite {
            target: target.map(|a| a.id),
            write: AnswerWrite {
                question_id,
                record_id: params.record_id,
                content: params.content.clone(),
                photo,
                option_ids: params.option_ids.clone(),
            },
            updated_at: params.updated_at,
        });
    }

    if !errors.is_empty() {
        return Ok(errors);
    }

    for plan in planned {
        let updated_at = plan.updated_at.unwrap_or(now);
        let answer = match plan.target {
            Some(id) => AnswerRepo::update(&mut *conn, id, &plan.write, updated_at)
                .await?
                .ok_or_else(|| DbError::not_found("Answer", id))?,
            None => AnswerRepo::insert(&mut *conn, response_id, &plan.write, updated_at).await?,
        };
        if let Some(option_ids) = &plan.write.option_ids {
            AnswerRepo::replace_choices(&mut *conn, answer.id, option_ids).await?;
        }
    }

    Ok(errors)
}
