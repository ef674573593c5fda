//! Integration tests for question-tree ordering of a response's answers.
//!
//! - Root questions and categories interleave by `order_number`
//! - Option-triggered sub-questions follow their parent question
//! - Blank answers are created once per unanswered question

use assert_matches::assert_matches;
use sqlx::PgPool;
use surveyor_core::clock::SystemClock;
use surveyor_core::params::{AnswerParams, CreateResponseParams, Respondent};
use surveyor_core::question::QuestionKind;
use surveyor_core::types::DbId;
use surveyor_db::coordinator::{ResponseCoordinator, SaveOutcome};
use surveyor_db::models::question::{CreateCategory, CreateOption, CreateQuestion, Question};
use surveyor_db::models::survey::CreateSurvey;
use surveyor_db::repositories::{AnswerRepo, QuestionRepo, SurveyRepo};

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

async fn seed_survey(pool: &PgPool) -> DbId {
    SurveyRepo::create(
        pool,
        &CreateSurvey {
            name: "Sorted".to_string(),
            is_public: Some(true),
            ..Default::default()
        },
    )
    .await
    .unwrap()
    .id
}

async fn question(pool: &PgPool, input: CreateQuestion) -> Question {
    QuestionRepo::create_question(pool, &input).await.unwrap()
}

fn text(question_id: DbId) -> AnswerParams {
    AnswerParams {
        question_id: Some(question_id),
        content: Some(format!("answer to {question_id}")),
        ..Default::default()
    }
}

async fn respond(pool: &PgPool, survey_id: DbId, answers: Vec<AnswerParams>) -> DbId {
    let outcome = ResponseCoordinator::create_valid_response_from_params(
        pool,
        &SystemClock,
        survey_id,
        &Respondent::default(),
        CreateResponseParams {
            answers: Some(answers),
            ..Default::default()
        },
    )
    .await
    .unwrap();
    assert_matches!(outcome, SaveOutcome::Saved(response) => response.id)
}

async fn sorted_question_ids(pool: &PgPool, response_id: DbId) -> Vec<DbId> {
    ResponseCoordinator::sorted_answers(pool, response_id)
        .await
        .unwrap()
        .iter()
        .map(|a| a.question_id)
        .collect()
}

// ---------------------------------------------------------------------------
// Ordering
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_category_children_follow_root_question(pool: PgPool) {
    let survey_id = seed_survey(&pool).await;
    let q1 = question(&pool, CreateQuestion::new(survey_id, "Q1", QuestionKind::SingleLine, 1)).await;
    let category = QuestionRepo::create_category(
        &pool,
        &CreateCategory {
            survey_id,
            content: "C".to_string(),
            order_number: 2,
            ..Default::default()
        },
    )
    .await
    .unwrap();
    let in_category = |content: &str, order: i32| CreateQuestion {
        category_id: Some(category.id),
        ..CreateQuestion::new(survey_id, content, QuestionKind::SingleLine, order)
    };
    let q2 = question(&pool, in_category("Q2", 1)).await;
    let q3 = question(&pool, in_category("Q3", 2)).await;

    let response_id = respond(&pool, survey_id, vec![text(q3.id), text(q2.id), text(q1.id)]).await;

    assert_eq!(sorted_question_ids(&pool, response_id).await, vec![q1.id, q2.id, q3.id]);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_option_subtree_follows_its_question(pool: PgPool) {
    let survey_id = seed_survey(&pool).await;
    let radio = question(&pool, CreateQuestion::new(survey_id, "R", QuestionKind::Radio, 1)).await;
    let after = question(&pool, CreateQuestion::new(survey_id, "After", QuestionKind::SingleLine, 2)).await;
    let option = QuestionRepo::create_option(
        &pool,
        &CreateOption {
            question_id: radio.id,
            content: "O".to_string(),
            order_number: 1,
        },
    )
    .await
    .unwrap();
    let child = question(
        &pool,
        CreateQuestion {
            parent_option_id: Some(option.id),
            ..CreateQuestion::new(survey_id, "Qc", QuestionKind::SingleLine, 1)
        },
    )
    .await;

    let response_id = respond(
        &pool,
        survey_id,
        vec![
            text(after.id),
            text(child.id),
            AnswerParams {
                question_id: Some(radio.id),
                option_ids: Some(vec![option.id]),
                ..Default::default()
            },
        ],
    )
    .await;

    assert_eq!(
        sorted_question_ids(&pool, response_id).await,
        vec![radio.id, child.id, after.id]
    );
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_equal_order_numbers_break_ties_by_id(pool: PgPool) {
    let survey_id = seed_survey(&pool).await;
    let first = question(&pool, CreateQuestion::new(survey_id, "A", QuestionKind::SingleLine, 1)).await;
    let second = question(&pool, CreateQuestion::new(survey_id, "B", QuestionKind::SingleLine, 1)).await;

    let response_id = respond(&pool, survey_id, vec![text(second.id), text(first.id)]).await;

    assert_eq!(sorted_question_ids(&pool, response_id).await, vec![first.id, second.id]);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_unanswered_questions_are_skipped(pool: PgPool) {
    let survey_id = seed_survey(&pool).await;
    let q1 = question(&pool, CreateQuestion::new(survey_id, "Q1", QuestionKind::SingleLine, 1)).await;
    let _q2 = question(&pool, CreateQuestion::new(survey_id, "Q2", QuestionKind::SingleLine, 2)).await;

    let response_id = respond(&pool, survey_id, vec![text(q1.id)]).await;

    assert_eq!(sorted_question_ids(&pool, response_id).await, vec![q1.id]);
}

// ---------------------------------------------------------------------------
// Blank answers
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_blank_answers_fill_missing_questions_once(pool: PgPool) {
    let survey_id = seed_survey(&pool).await;
    let q1 = question(&pool, CreateQuestion::new(survey_id, "Q1", QuestionKind::SingleLine, 1)).await;
    let q2 = question(&pool, CreateQuestion::new(survey_id, "Q2", QuestionKind::SingleLine, 2)).await;
    let q3 = question(&pool, CreateQuestion::new(survey_id, "Q3", QuestionKind::SingleLine, 3)).await;

    let response_id = respond(&pool, survey_id, vec![text(q2.id)]).await;

    let created = ResponseCoordinator::create_blank_answers(&pool, &SystemClock, response_id)
        .await
        .unwrap();
    assert_eq!(created, 2);

    let again = ResponseCoordinator::create_blank_answers(&pool, &SystemClock, response_id)
        .await
        .unwrap();
    assert_eq!(again, 0);

    let answers = AnswerRepo::list_for_response(&pool, response_id).await.unwrap();
    assert_eq!(answers.len(), 3);
    let blank: Vec<DbId> = answers
        .iter()
        .filter(|a| a.content.is_none())
        .map(|a| a.question_id)
        .collect();
    assert_eq!(blank.len(), 2);
    assert!(blank.contains(&q1.id));
    assert!(blank.contains(&q3.id));
}
