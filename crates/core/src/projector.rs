//! Orders a response's answers by the survey's display order.

use std::collections::{HashMap, HashSet};

use crate::tree::QuestionTree;
use crate::types::DbId;

/// Anything that answers a question.
pub trait Answered {
    fn answer_id(&self) -> DbId;
    fn question_id(&self) -> DbId;
}

/// Answers in the tree's traversal order. Questions without an answer are
/// skipped and answers to questions outside the tree are dropped. Several
/// answers to one question (one per record) keep ascending id order.
pub fn sorted_answers<A: Answered>(tree: &QuestionTree, answers: Vec<A>) -> Vec<A> {
    let mut by_question: HashMap<DbId, Vec<A>> = HashMap::new();
    for answer in answers {
        by_question.entry(answer.question_id()).or_default().push(answer);
    }

    let mut sorted = Vec::new();
    for question_id in tree.question_order() {
        if let Some(mut group) = by_question.remove(&question_id) {
            group.sort_by_key(Answered::answer_id);
            sorted.extend(group);
        }
    }
    sorted
}

/// Reachable questions that have no answer yet, in display order.
pub fn unanswered_questions(
    tree: &QuestionTree,
    answered: impl IntoIterator<Item = DbId>,
) -> Vec<DbId> {
    let answered: HashSet<DbId> = answered.into_iter().collect();
    tree.question_order()
        .into_iter()
        .filter(|id| !answered.contains(id))
        .collect()
}
