//! Response models and the client sync payload.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use surveyor_core::error::CoreError;
use surveyor_core::params::{CreateResponseParams, Respondent, UpdateResponseParams};
use surveyor_core::status::{ResponseStatus, StatusChange};
use surveyor_core::types::{DbId, Timestamp};
use surveyor_core::validation::ResponseState;

use crate::models::answer::{Answer, Choice};

/// A row from the `responses` table.
#[derive(Debug, Clone, PartialEq, FromRow, Serialize)]
pub struct Response {
    pub id: DbId,
    pub survey_id: DbId,
    pub organization_id: Option<DbId>,
    pub user_id: Option<DbId>,
    pub status: String,
    pub completed_at: Option<Timestamp>,
    #[serde(skip_serializing)]
    pub session_token: Option<String>,
    pub mobile_id: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub ip_address: Option<String>,
    pub location: Option<String>,
    pub comment: Option<String>,
    pub blank: bool,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl Response {
    pub fn status(&self) -> Result<ResponseStatus, CoreError> {
        self.status.parse()
    }

    /// The attributes the validation rules see, given the survey's flag.
    pub fn state(&self, survey_public: bool) -> Result<ResponseState, CoreError> {
        Ok(ResponseState {
            survey_id: Some(self.survey_id),
            survey_public,
            organization_id: self.organization_id,
            user_id: self.user_id,
            status: self.status()?,
        })
    }
}

/// DTO for inserting a response.
#[derive(Debug, Clone, Default)]
pub struct CreateResponse {
    pub survey_id: Option<DbId>,
    pub organization_id: Option<DbId>,
    pub user_id: Option<DbId>,
    pub session_token: Option<String>,
    pub status: ResponseStatus,
    pub mobile_id: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub ip_address: Option<String>,
    pub comment: Option<String>,
    pub blank: bool,
}

impl CreateResponse {
    /// Non-answer attributes of a create request.
    pub fn from_params(params: &CreateResponseParams) -> Self {
        Self {
            status: params.status.unwrap_or_default(),
            mobile_id: params.mobile_id.clone(),
            latitude: params.latitude,
            longitude: params.longitude,
            ip_address: params.ip_address.clone(),
            comment: params.comment.clone(),
            blank: params.blank,
            ..Default::default()
        }
    }

    /// Stamp the survey and the submitting identity.
    pub fn set(
        &mut self,
        survey_id: DbId,
        user_id: Option<DbId>,
        organization_id: Option<DbId>,
        session_token: Option<String>,
    ) {
        self.survey_id = Some(survey_id);
        self.user_id = user_id;
        self.organization_id = organization_id;
        self.session_token = session_token;
    }

    pub fn set_respondent(&mut self, survey_id: DbId, respondent: &Respondent) {
        self.set(
            survey_id,
            respondent.user_id,
            respondent.organization_id,
            respondent.session_token.clone(),
        );
    }

    pub fn state(&self, survey_public: bool) -> ResponseState {
        ResponseState {
            survey_id: self.survey_id,
            survey_public,
            organization_id: self.organization_id,
            user_id: self.user_id,
            status: self.status,
        }
    }
}

/// Column values written by a full attribute update. `None` attributes keep
/// their stored value; `status` and `completed_at` are always written.
#[derive(Debug, Clone)]
pub struct UpdateResponse {
    pub status: ResponseStatus,
    pub completed_at: Option<Timestamp>,
    pub comment: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub ip_address: Option<String>,
}

impl UpdateResponse {
    pub fn from_params(params: &UpdateResponseParams, change: StatusChange) -> Self {
        Self {
            status: change.status,
            completed_at: change.completed_at,
            comment: params.comment.clone(),
            latitude: params.latitude,
            longitude: params.longitude,
            ip_address: params.ip_address.clone(),
        }
    }
}

/// Filters for listing a survey's responses.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ResponseFilter {
    /// Only `complete` responses.
    #[serde(default)]
    pub completed: bool,
    /// Inclusive lower bound on `created_at`.
    pub created_from: Option<Timestamp>,
    /// Inclusive upper bound on `created_at`.
    pub created_to: Option<Timestamp>,
}

/// A response with its answers, their choices, and inline photos, as sent
/// to syncing clients.
#[derive(Debug, Clone, Serialize)]
pub struct ResponsePayload {
    #[serde(flatten)]
    pub response: Response,
    pub answers: Vec<AnswerPayload>,
}

#[derive(Debug, Clone, Serialize)]
pub struct AnswerPayload {
    #[serde(flatten)]
    pub answer: Answer,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub photo_in_base64: Option<String>,
    pub choices: Vec<Choice>,
}

impl ResponsePayload {
    /// Assemble the payload. `answers` should already be in display order.
    pub fn build(response: Response, answers: Vec<Answer>, choices: Vec<Choice>) -> Self {
        let answers = answers
            .into_iter()
            .map(|answer| {
                let choices = choices
                    .iter()
                    .filter(|c| c.answer_id == answer.id)
                    .cloned()
                    .collect();
                AnswerPayload {
                    photo_in_base64: answer.photo_in_base64(),
                    answer,
                    choices,
                }
            })
            .collect();
        Self { response, answers }
    }
}
