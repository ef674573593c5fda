//! Validation pipeline for responses.
//!
//! Each rule is a pure function over the persisted state (if any) and the
//! proposed state. The coordinator runs [`RESPONSE_RULES`] before commit and
//! rolls back when any of them reports a violation.

use std::fmt;

use serde::Serialize;

use crate::status::{self, ResponseStatus};
use crate::types::DbId;

/// A single field-level rule violation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldViolation {
    pub field: String,
    pub code: String,
    pub message: String,
}

impl FieldViolation {
    pub fn new(
        field: impl Into<String>,
        code: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            field: field.into(),
            code: code.into(),
            message: message.into(),
        }
    }

    /// Re-root the violation under `prefix`, e.g. `content` -> `answers[2].content`.
    pub fn under(mut self, prefix: &str) -> Self {
        self.field = format!("{prefix}.{}", self.field);
        self
    }
}

/// Ordered collection of violations. Empty means valid.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ValidationErrors(Vec<FieldViolation>);

impl ValidationErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, violation: FieldViolation) {
        self.0.push(violation);
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn violations(&self) -> &[FieldViolation] {
        &self.0
    }

    pub fn has_field(&self, field: &str) -> bool {
        self.0.iter().any(|v| v.field == field)
    }
}

impl Extend<FieldViolation> for ValidationErrors {
    fn extend<I: IntoIterator<Item = FieldViolation>>(&mut self, iter: I) {
        self.0.extend(iter);
    }
}

impl From<FieldViolation> for ValidationErrors {
    fn from(violation: FieldViolation) -> Self {
        Self(vec![violation])
    }
}

impl From<validator::ValidationErrors> for ValidationErrors {
    fn from(errors: validator::ValidationErrors) -> Self {
        let mut violations: Vec<FieldViolation> = errors
            .field_errors()
            .into_iter()
            .flat_map(|(field, errs)| {
                let field = field.to_string();
                errs.iter().map(move |e| {
                    let message = e
                        .message
                        .as_ref()
                        .map(|m| m.to_string())
                        .unwrap_or_else(|| format!("{field} is invalid ({})", e.code));
                    FieldViolation::new(field.clone(), e.code.to_string(), message)
                })
            })
            .collect();
        // field_errors() is a HashMap; keep the report stable.
        violations.sort_by(|a, b| a.field.cmp(&b.field).then(a.code.cmp(&b.code)));
        Self(violations)
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self
            .0
            .iter()
            .map(|v| format!("{}: {}", v.field, v.message))
            .collect();
        f.write_str(&parts.join("; "))
    }
}

/// The response attributes the rules look at.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResponseState {
    pub survey_id: Option<DbId>,
    /// `public` flag of the owning survey.
    pub survey_public: bool,
    pub organization_id: Option<DbId>,
    pub user_id: Option<DbId>,
    pub status: ResponseStatus,
}

/// `current` is the persisted state, `None` when the response is new.
pub type ResponseRule = fn(Option<&ResponseState>, &ResponseState) -> Result<(), FieldViolation>;

/// Rules run, in order, against every proposed response state.
pub const RESPONSE_RULES: &[ResponseRule] = &[
    survey_is_present,
    organization_is_present_unless_public,
    user_is_present_unless_public,
    completed_cannot_become_incomplete,
];

pub fn survey_is_present(
    _current: Option<&ResponseState>,
    proposed: &ResponseState,
) -> Result<(), FieldViolation> {
    match proposed.survey_id {
        Some(_) => Ok(()),
        None => Err(FieldViolation::new("survey_id", "required", "survey_id can't be blank")),
    }
}

pub fn organization_is_present_unless_public(
    _current: Option<&ResponseState>,
    proposed: &ResponseState,
) -> Result<(), FieldViolation> {
    if proposed.survey_public || proposed.organization_id.is_some() {
        return Ok(());
    }
    Err(FieldViolation::new(
        "organization_id",
        "required",
        "organization_id can't be blank",
    ))
}

pub fn user_is_present_unless_public(
    _current: Option<&ResponseState>,
    proposed: &ResponseState,
) -> Result<(), FieldViolation> {
    if proposed.survey_public || proposed.user_id.is_some() {
        return Ok(());
    }
    Err(FieldViolation::new("user_id", "required", "user_id can't be blank"))
}

pub fn completed_cannot_become_incomplete(
    current: Option<&ResponseState>,
    proposed: &ResponseState,
) -> Result<(), FieldViolation> {
    status::check_no_downgrade(current.map(|c| c.status), proposed.status)
}

/// Run every rule in [`RESPONSE_RULES`], collecting all violations.
pub fn validate_response(current: Option<&ResponseState>, proposed: &ResponseState) -> ValidationErrors {
    let mut errors = ValidationErrors::new();
    for rule in RESPONSE_RULES {
        if let Err(violation) = rule(current, proposed) {
            errors.push(violation);
        }
    }
    errors
}
