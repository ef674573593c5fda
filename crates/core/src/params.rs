//! Permitted fields for each response operation.
//!
//! Every struct denies unknown fields at deserialization, so a client can
//! only ever touch the attributes listed here.

use serde::Deserialize;
use validator::Validate;

use crate::status::ResponseStatus;
use crate::types::{DbId, Timestamp};

/// One submitted answer.
///
/// `id` refers to an existing answer of the same response; without it the
/// answer is matched on `(question_id, record_id)` or created.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AnswerParams {
    pub id: Option<DbId>,
    pub question_id: Option<DbId>,
    pub content: Option<String>,
    pub option_ids: Option<Vec<DbId>>,
    pub record_id: Option<DbId>,
    pub photo_in_base64: Option<String>,
    /// When the client last edited this answer.
    pub updated_at: Option<Timestamp>,
}

/// Attributes accepted when a response is created.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Validate)]
#[serde(deny_unknown_fields)]
pub struct CreateResponseParams {
    pub status: Option<ResponseStatus>,
    #[validate(length(max = 5000))]
    pub comment: Option<String>,
    #[validate(range(min = -90.0, max = 90.0))]
    pub latitude: Option<f64>,
    #[validate(range(min = -180.0, max = 180.0))]
    pub longitude: Option<f64>,
    #[validate(ip)]
    pub ip_address: Option<String>,
    pub mobile_id: Option<String>,
    #[serde(default)]
    pub blank: bool,
    pub answers: Option<Vec<AnswerParams>>,
}

/// Attributes accepted when a response is updated.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Validate)]
#[serde(deny_unknown_fields)]
pub struct UpdateResponseParams {
    pub status: Option<ResponseStatus>,
    #[validate(length(max = 5000))]
    pub comment: Option<String>,
    #[validate(range(min = -90.0, max = 90.0))]
    pub latitude: Option<f64>,
    #[validate(range(min = -180.0, max = 180.0))]
    pub longitude: Option<f64>,
    #[validate(ip)]
    pub ip_address: Option<String>,
    pub answers: Option<Vec<AnswerParams>>,
}

impl UpdateResponseParams {
    /// Nothing to apply: the update is a no-op.
    pub fn is_empty(&self) -> bool {
        self.status.is_none()
            && self.comment.is_none()
            && self.latitude.is_none()
            && self.longitude.is_none()
            && self.ip_address.is_none()
            && self.answers.is_none()
    }
}

/// Body of an answers-only update. A missing `answers` key is a no-op.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct UpdateAnswersParams {
    pub answers: Option<Vec<AnswerParams>>,
}

/// Body of a status-only update.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MarkStatusRequest {
    pub status: ResponseStatus,
}

/// Body of an offline client's timestamped status update.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MergeStatusRequest {
    pub status: ResponseStatus,
    pub updated_at: Timestamp,
}

/// Who is submitting, as supplied by the identity collaborator.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Respondent {
    pub user_id: Option<DbId>,
    pub organization_id: Option<DbId>,
    pub session_token: Option<String>,
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;

    #[test]
    fn unknown_fields_are_rejected() {
        let result: Result<UpdateResponseParams, _> =
            serde_json::from_str(r#"{"comment":"x","organization_id":5}"#);
        assert!(result.is_err());

        let result: Result<AnswerParams, _> =
            serde_json::from_str(r#"{"content":"x","response_id":9}"#);
        assert!(result.is_err());
    }

    #[test]
    fn empty_update_is_detected() {
        let params: UpdateResponseParams = serde_json::from_str("{}").unwrap();
        assert!(params.is_empty());

        let params: UpdateResponseParams = serde_json::from_str(r#"{"answers":[]}"#).unwrap();
        assert!(!params.is_empty());
    }

    #[test]
    fn answer_timestamps_parse_rfc3339() {
        let params: AnswerParams =
            serde_json::from_str(r#"{"id":3,"updated_at":"2013-05-05T10:00:00Z","content":"x"}"#)
                .unwrap();
        assert_eq!(params.id, Some(3));
        assert!(params.updated_at.is_some());
    }

    #[test]
    fn create_params_validate_coordinates() {
        let params = CreateResponseParams {
            latitude: Some(91.0),
            longitude: Some(-181.0),
            ..Default::default()
        };
        let errors = params.validate().unwrap_err();
        let fields = errors.field_errors();
        assert!(fields.contains_key("latitude"));
        assert!(fields.contains_key("longitude"));
    }

    #[test]
    fn create_params_validate_ip_address() {
        let params = CreateResponseParams {
            ip_address: Some("not-an-ip".into()),
            ..Default::default()
        };
        assert!(params.validate().is_err());

        let params = CreateResponseParams {
            ip_address: Some("10.0.0.1".into()),
            ..Default::default()
        };
        assert_matches!(params.validate(), Ok(()));
    }

    #[test]
    fn missing_answers_key_is_none() {
        let params: UpdateAnswersParams = serde_json::from_str("{}").unwrap();
        assert!(params.answers.is_none());

        let params: UpdateAnswersParams = serde_json::from_str(r#"{"answers":[]}"#).unwrap();
        assert_eq!(params.answers, Some(vec![]));
    }

    #[test]
    fn status_request_parses_lowercase() {
        let req: MarkStatusRequest = serde_json::from_str(r#"{"status":"complete"}"#).unwrap();
        assert_eq!(req.status, ResponseStatus::Complete);
    }
}
