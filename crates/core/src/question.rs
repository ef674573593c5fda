//! Question kinds and per-answer validation rules.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::status::ResponseStatus;
use crate::tree::ParentRef;
use crate::types::DbId;
use crate::validation::FieldViolation;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QuestionKind {
    SingleLine,
    Multiline,
    Numeric,
    Date,
    Radio,
    DropDown,
    MultiChoice,
    Photo,
    Rating,
}

impl QuestionKind {
    pub const ALL: &'static [QuestionKind] = &[
        QuestionKind::SingleLine,
        QuestionKind::Multiline,
        QuestionKind::Numeric,
        QuestionKind::Date,
        QuestionKind::Radio,
        QuestionKind::DropDown,
        QuestionKind::MultiChoice,
        QuestionKind::Photo,
        QuestionKind::Rating,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            QuestionKind::SingleLine => "single_line",
            QuestionKind::Multiline => "multiline",
            QuestionKind::Numeric => "numeric",
            QuestionKind::Date => "date",
            QuestionKind::Radio => "radio",
            QuestionKind::DropDown => "drop_down",
            QuestionKind::MultiChoice => "multi_choice",
            QuestionKind::Photo => "photo",
            QuestionKind::Rating => "rating",
        }
    }

    /// Whether answers select options rather than carry free content.
    pub fn has_options(self) -> bool {
        matches!(
            self,
            QuestionKind::Radio | QuestionKind::DropDown | QuestionKind::MultiChoice
        )
    }

    /// At most one option may be selected.
    pub fn is_single_choice(self) -> bool {
        matches!(self, QuestionKind::Radio | QuestionKind::DropDown)
    }

    fn is_numeric(self) -> bool {
        matches!(self, QuestionKind::Numeric | QuestionKind::Rating)
    }
}

impl fmt::Display for QuestionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for QuestionKind {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        QuestionKind::ALL
            .iter()
            .copied()
            .find(|k| k.as_str() == s)
            .ok_or_else(|| CoreError::Validation(format!("Unknown question type '{s}'")))
    }
}

/// A question as seen by the tree and the answer rules.
#[derive(Debug, Clone, PartialEq)]
pub struct QuestionNode {
    pub id: DbId,
    pub survey_id: DbId,
    pub parent: ParentRef,
    pub order_number: i32,
    pub kind: QuestionKind,
    pub mandatory: bool,
    pub max_length: Option<i32>,
    pub min_value: Option<i32>,
    pub max_value: Option<i32>,
}

/// What an incoming answer would store, borrowed for validation.
#[derive(Debug, Clone, Copy, Default)]
pub struct AnswerDraft<'a> {
    pub content: Option<&'a str>,
    pub option_ids: &'a [DbId],
    pub has_photo: bool,
}

impl AnswerDraft<'_> {
    fn is_blank(&self) -> bool {
        self.content.map_or(true, |c| c.trim().is_empty())
            && self.option_ids.is_empty()
            && !self.has_photo
    }
}

/// Validate one answer against its question.
///
/// `question_options` are the option ids owned by the question. Mandatory
/// questions only demand a value once the response is (becoming) complete.
pub fn validate_answer(
    question: &QuestionNode,
    question_options: &[DbId],
    draft: &AnswerDraft<'_>,
    response_status: ResponseStatus,
) -> Vec<FieldViolation> {
    let mut violations = Vec::new();

    if question.mandatory && response_status.is_complete() && draft.is_blank() {
        violations.push(FieldViolation::new(
            "content",
            "mandatory",
            "This question is mandatory",
        ));
    }

    if let (Some(max), Some(content)) = (question.max_length, draft.content) {
        let len = content.chars().count();
        if len > max.max(0) as usize {
            violations.push(FieldViolation::new(
                "content",
                "too_long",
                format!("Content is too long (maximum is {max} characters, got {len})"),
            ));
        }
    }

    if let Some(content) = draft.content.map(str::trim).filter(|c| !c.is_empty()) {
        if question.kind.is_numeric() {
            violations.extend(check_number(question, content));
        } else if question.kind == QuestionKind::Date && !is_date(content) {
            violations.push(FieldViolation::new(
                "content",
                "invalid_date",
                format!("'{content}' is not a valid date"),
            ));
        }
    }

    if !draft.option_ids.is_empty() {
        if !question.kind.has_options() {
            violations.push(FieldViolation::new(
                "option_ids",
                "options_not_allowed",
                format!("A {} question does not take options", question.kind),
            ));
        } else {
            if question.kind.is_single_choice() && draft.option_ids.len() > 1 {
                violations.push(FieldViolation::new(
                    "option_ids",
                    "single_choice",
                    "Only one option may be selected",
                ));
            }
            for option_id in draft.option_ids {
                if !question_options.contains(option_id) {
                    violations.push(FieldViolation::new(
                        "option_ids",
                        "unknown_option",
                        format!("Option {option_id} does not belong to this question"),
                    ));
                }
            }
        }
    }

    violations
}

fn check_number(question: &QuestionNode, content: &str) -> Option<FieldViolation> {
    let Ok(value) = content.parse::<f64>() else {
        return Some(FieldViolation::new(
            "content",
            "not_a_number",
            format!("'{content}' is not a number"),
        ));
    };
    if let Some(min) = question.min_value {
        if value < f64::from(min) {
            return Some(FieldViolation::new(
                "content",
                "below_minimum",
                format!("Value must be at least {min}"),
            ));
        }
    }
    if let Some(max) = question.max_value {
        if value > f64::from(max) {
            return Some(FieldViolation::new(
                "content",
                "above_maximum",
                format!("Value must be at most {max}"),
            ));
        }
    }
    None
}

fn is_date(content: &str) -> bool {
    chrono::NaiveDate::parse_from_str(content, "%Y-%m-%d").is_ok()
        || chrono::DateTime::parse_from_rfc3339(content).is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn question(kind: QuestionKind) -> QuestionNode {
        QuestionNode {
            id: 1,
            survey_id: 1,
            parent: ParentRef::Root,
            order_number: 1,
            kind,
            mandatory: false,
            max_length: None,
            min_value: None,
            max_value: None,
        }
    }

    fn text(content: &str) -> AnswerDraft<'_> {
        AnswerDraft {
            content: Some(content),
            ..Default::default()
        }
    }

    #[test]
    fn kinds_round_trip_through_strings() {
        for kind in QuestionKind::ALL {
            assert_eq!(kind.as_str().parse::<QuestionKind>().unwrap(), *kind);
        }
        assert!("slider".parse::<QuestionKind>().is_err());
    }

    #[test]
    fn mandatory_blank_fails_only_when_complete() {
        let mut q = question(QuestionKind::SingleLine);
        q.mandatory = true;
        let blank = text("  ");
        assert!(validate_answer(&q, &[], &blank, ResponseStatus::Incomplete).is_empty());
        let violations = validate_answer(&q, &[], &blank, ResponseStatus::Complete);
        assert_eq!(violations[0].code, "mandatory");
    }

    #[test]
    fn mandatory_satisfied_by_option_or_photo() {
        let mut q = question(QuestionKind::Radio);
        q.mandatory = true;
        let picked = AnswerDraft {
            content: None,
            option_ids: &[7],
            has_photo: false,
        };
        assert!(validate_answer(&q, &[7], &picked, ResponseStatus::Complete).is_empty());

        let mut q = question(QuestionKind::Photo);
        q.mandatory = true;
        let photo = AnswerDraft {
            has_photo: true,
            ..Default::default()
        };
        assert!(validate_answer(&q, &[], &photo, ResponseStatus::Complete).is_empty());
    }

    #[test]
    fn content_longer_than_max_length_fails() {
        let mut q = question(QuestionKind::SingleLine);
        q.max_length = Some(2);
        assert!(validate_answer(&q, &[], &text("ab"), ResponseStatus::Incomplete).is_empty());
        let violations = validate_answer(&q, &[], &text("abcd"), ResponseStatus::Incomplete);
        assert_eq!(violations.len(), 1);
        assert_eq!(violations[0].code, "too_long");
    }

    #[test]
    fn max_length_counts_characters_not_bytes() {
        let mut q = question(QuestionKind::SingleLine);
        q.max_length = Some(3);
        assert!(validate_answer(&q, &[], &text("äöü"), ResponseStatus::Incomplete).is_empty());
    }

    #[test]
    fn numeric_content_must_parse_and_fit_bounds() {
        let mut q = question(QuestionKind::Numeric);
        q.min_value = Some(1);
        q.max_value = Some(10);
        assert!(validate_answer(&q, &[], &text("5"), ResponseStatus::Incomplete).is_empty());
        assert_eq!(
            validate_answer(&q, &[], &text("five"), ResponseStatus::Incomplete)[0].code,
            "not_a_number"
        );
        assert_eq!(
            validate_answer(&q, &[], &text("0"), ResponseStatus::Incomplete)[0].code,
            "below_minimum"
        );
        assert_eq!(
            validate_answer(&q, &[], &text("11"), ResponseStatus::Incomplete)[0].code,
            "above_maximum"
        );
    }

    #[test]
    fn date_content_must_parse() {
        let q = question(QuestionKind::Date);
        assert!(validate_answer(&q, &[], &text("2013-05-05"), ResponseStatus::Incomplete).is_empty());
        assert_eq!(
            validate_answer(&q, &[], &text("yesterday"), ResponseStatus::Incomplete)[0].code,
            "invalid_date"
        );
    }

    #[test]
    fn radio_accepts_one_owned_option() {
        let q = question(QuestionKind::Radio);
        let two = AnswerDraft {
            option_ids: &[1, 2],
            ..Default::default()
        };
        let violations = validate_answer(&q, &[1, 2], &two, ResponseStatus::Incomplete);
        assert_eq!(violations[0].code, "single_choice");

        let foreign = AnswerDraft {
            option_ids: &[9],
            ..Default::default()
        };
        let violations = validate_answer(&q, &[1, 2], &foreign, ResponseStatus::Incomplete);
        assert_eq!(violations[0].code, "unknown_option");
    }

    #[test]
    fn multi_choice_accepts_many_options() {
        let q = question(QuestionKind::MultiChoice);
        let many = AnswerDraft {
            option_ids: &[1, 2, 3],
            ..Default::default()
        };
        assert!(validate_answer(&q, &[1, 2, 3], &many, ResponseStatus::Complete).is_empty());
    }

    #[test]
    fn text_question_rejects_options() {
        let q = question(QuestionKind::SingleLine);
        let picked = AnswerDraft {
            option_ids: &[1],
            ..Default::default()
        };
        assert_eq!(
            validate_answer(&q, &[], &picked, ResponseStatus::Incomplete)[0].code,
            "options_not_allowed"
        );
    }
}
