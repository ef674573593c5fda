//! A survey's question forest.
//!
//! Questions and categories hang off the survey root, a category, or an
//! option (conditional branch). Siblings are ordered by
//! `(order_number, id)`; each question's options are ordered the same way
//! and each option's subtree is visited right after its question.

use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};

use crate::question::QuestionNode;
use crate::types::DbId;

/// Where a question or category is attached.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "type", content = "id", rename_all = "snake_case")]
pub enum ParentRef {
    Root,
    Category(DbId),
    Option(DbId),
}

impl ParentRef {
    /// Build from the nullable parent columns. The option (conditional
    /// trigger) wins when both are set.
    pub fn from_columns(category_id: Option<DbId>, parent_option_id: Option<DbId>) -> Self {
        match (parent_option_id, category_id) {
            (Some(option_id), _) => ParentRef::Option(option_id),
            (None, Some(category_id)) => ParentRef::Category(category_id),
            (None, None) => ParentRef::Root,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CategoryNode {
    pub id: DbId,
    pub survey_id: DbId,
    pub parent: ParentRef,
    pub order_number: i32,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OptionNode {
    pub id: DbId,
    pub question_id: DbId,
    pub order_number: i32,
}

/// A node of the forest that can sit under a parent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Element {
    Question(DbId),
    Category(DbId),
}

#[derive(Debug, Clone)]
pub struct QuestionTree {
    survey_id: DbId,
    questions: HashMap<DbId, QuestionNode>,
    children: HashMap<ParentRef, Vec<Element>>,
    options_by_question: HashMap<DbId, Vec<DbId>>,
}

impl QuestionTree {
    pub fn new(
        survey_id: DbId,
        questions: Vec<QuestionNode>,
        categories: Vec<CategoryNode>,
        options: Vec<OptionNode>,
    ) -> Self {
        // (order_number, id, kind rank) keeps interleaved siblings deterministic.
        let mut keyed: HashMap<ParentRef, Vec<((i32, DbId, u8), Element)>> = HashMap::new();
        for q in questions.iter().filter(|q| q.survey_id == survey_id) {
            keyed
                .entry(q.parent)
                .or_default()
                .push(((q.order_number, q.id, 0), Element::Question(q.id)));
        }
        for c in categories.iter().filter(|c| c.survey_id == survey_id) {
            keyed
                .entry(c.parent)
                .or_default()
                .push(((c.order_number, c.id, 1), Element::Category(c.id)));
        }
        let children = keyed
            .into_iter()
            .map(|(parent, mut elements)| {
                elements.sort_by_key(|(key, _)| *key);
                (parent, elements.into_iter().map(|(_, e)| e).collect())
            })
            .collect();

        let questions: HashMap<DbId, QuestionNode> = questions
            .into_iter()
            .filter(|q| q.survey_id == survey_id)
            .map(|q| (q.id, q))
            .collect();

        let mut sorted_options = options;
        sorted_options.retain(|o| questions.contains_key(&o.question_id));
        sorted_options.sort_by_key(|o| (o.order_number, o.id));
        let mut options_by_question: HashMap<DbId, Vec<DbId>> = HashMap::new();
        for option in sorted_options {
            options_by_question
                .entry(option.question_id)
                .or_default()
                .push(option.id);
        }

        Self {
            survey_id,
            questions,
            children,
            options_by_question,
        }
    }

    pub fn survey_id(&self) -> DbId {
        self.survey_id
    }

    pub fn question(&self, id: DbId) -> Option<&QuestionNode> {
        self.questions.get(&id)
    }

    pub fn contains_question(&self, id: DbId) -> bool {
        self.questions.contains_key(&id)
    }

    /// Options owned by a question, in display order.
    pub fn options_for(&self, question_id: DbId) -> &[DbId] {
        self.options_by_question
            .get(&question_id)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Elements attached directly to the survey.
    pub fn first_level_elements(&self) -> &[Element] {
        self.children_of(ParentRef::Root)
    }

    pub fn children_of(&self, parent: ParentRef) -> &[Element] {
        self.children.get(&parent).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Question ids in display order: depth-first through categories, with
    /// each option's subtree emitted right after the question owning it.
    ///
    /// Elements attached to a missing parent are unreachable and left out.
    pub fn question_order(&self) -> Vec<DbId> {
        let mut order = Vec::with_capacity(self.questions.len());
        let mut seen = HashSet::new();
        self.visit(self.first_level_elements(), &mut order, &mut seen);
        order
    }

    fn visit(&self, elements: &[Element], order: &mut Vec<DbId>, seen: &mut HashSet<Element>) {
        for element in elements {
            if !seen.insert(*element) {
                continue;
            }
            match *element {
                Element::Question(id) => {
                    order.push(id);
                    for option_id in self.options_for(id) {
                        self.visit(self.children_of(ParentRef::Option(*option_id)), order, seen);
                    }
                }
                Element::Category(id) => {
                    self.visit(self.children_of(ParentRef::Category(id)), order, seen);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::question::QuestionKind;

    const SURVEY: DbId = 1;

    fn question(id: DbId, parent: ParentRef, order_number: i32) -> QuestionNode {
        QuestionNode {
            id,
            survey_id: SURVEY,
            parent,
            order_number,
            kind: QuestionKind::SingleLine,
            mandatory: false,
            max_length: None,
            min_value: None,
            max_value: None,
        }
    }

    fn radio(id: DbId, parent: ParentRef, order_number: i32) -> QuestionNode {
        QuestionNode {
            kind: QuestionKind::Radio,
            ..question(id, parent, order_number)
        }
    }

    fn category(id: DbId, parent: ParentRef, order_number: i32) -> CategoryNode {
        CategoryNode {
            id,
            survey_id: SURVEY,
            parent,
            order_number,
        }
    }

    fn option(id: DbId, question_id: DbId, order_number: i32) -> OptionNode {
        OptionNode {
            id,
            question_id,
            order_number,
        }
    }

    #[test]
    fn first_level_questions_follow_order_number() {
        let tree = QuestionTree::new(
            SURVEY,
            vec![question(10, ParentRef::Root, 2), question(11, ParentRef::Root, 1)],
            vec![],
            vec![],
        );
        assert_eq!(tree.question_order(), vec![11, 10]);
    }

    #[test]
    fn category_questions_are_emitted_in_place() {
        // Q1 (order 1), C (order 2) containing Q2 (order 1) and Q3 (order 2).
        let tree = QuestionTree::new(
            SURVEY,
            vec![
                question(1, ParentRef::Root, 1),
                question(3, ParentRef::Category(100), 2),
                question(2, ParentRef::Category(100), 1),
            ],
            vec![category(100, ParentRef::Root, 2)],
            vec![],
        );
        assert_eq!(tree.question_order(), vec![1, 2, 3]);
    }

    #[test]
    fn option_subtree_follows_its_question() {
        let tree = QuestionTree::new(
            SURVEY,
            vec![
                radio(1, ParentRef::Root, 1),
                question(2, ParentRef::Root, 2),
                question(3, ParentRef::Option(50), 2),
                question(4, ParentRef::Option(50), 1),
                question(5, ParentRef::Option(51), 1),
            ],
            vec![],
            vec![option(51, 1, 2), option(50, 1, 1)],
        );
        assert_eq!(tree.question_order(), vec![1, 4, 3, 5, 2]);
        assert_eq!(tree.options_for(1), &[50, 51]);
    }

    #[test]
    fn nested_categories_and_conditional_categories() {
        let tree = QuestionTree::new(
            SURVEY,
            vec![
                radio(1, ParentRef::Root, 1),
                question(2, ParentRef::Category(201), 1),
                question(3, ParentRef::Category(200), 1),
                question(4, ParentRef::Category(202), 1),
            ],
            vec![
                category(200, ParentRef::Root, 2),
                category(201, ParentRef::Category(200), 2),
                category(202, ParentRef::Option(60), 1),
            ],
            vec![option(60, 1, 1)],
        );
        assert_eq!(tree.question_order(), vec![1, 4, 3, 2]);
    }

    #[test]
    fn equal_order_numbers_break_ties_by_id() {
        let tree = QuestionTree::new(
            SURVEY,
            vec![
                question(9, ParentRef::Root, 1),
                question(7, ParentRef::Root, 1),
                question(8, ParentRef::Root, 1),
            ],
            vec![],
            vec![],
        );
        assert_eq!(tree.question_order(), vec![7, 8, 9]);
    }

    #[test]
    fn orphans_and_other_surveys_are_excluded() {
        let mut foreign = question(5, ParentRef::Root, 1);
        foreign.survey_id = 2;
        let tree = QuestionTree::new(
            SURVEY,
            vec![
                question(1, ParentRef::Root, 1),
                question(2, ParentRef::Category(999), 1),
                foreign,
            ],
            vec![],
            vec![],
        );
        assert_eq!(tree.question_order(), vec![1]);
        assert!(!tree.contains_question(5));
    }

    #[test]
    fn cyclic_data_terminates() {
        // Category 300 sits under option 70, which belongs to a question
        // inside category 300.
        let tree = QuestionTree::new(
            SURVEY,
            vec![radio(1, ParentRef::Category(300), 1)],
            vec![category(300, ParentRef::Option(70), 1)],
            vec![option(70, 1, 1)],
        );
        // Unreachable from the root, and walking it never loops.
        assert!(tree.question_order().is_empty());
    }

    #[test]
    fn parent_columns_prefer_option() {
        assert_eq!(ParentRef::from_columns(None, None), ParentRef::Root);
        assert_eq!(ParentRef::from_columns(Some(3), None), ParentRef::Category(3));
        assert_eq!(ParentRef::from_columns(Some(3), Some(4)), ParentRef::Option(4));
    }
}
