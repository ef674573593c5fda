//! Response lifecycle: statuses, completion stamping, and merge precedence.
//!
//! A response starts `incomplete`, may move to `validating` from anywhere,
//! and once `complete` it can never go back to `incomplete`. The downgrade
//! check is always made against the *persisted* status, so assigning the
//! status several times within one transaction cannot sneak past it.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::types::Timestamp;
use crate::validation::FieldViolation;

pub const STATUS_INCOMPLETE: &str = "incomplete";
pub const STATUS_VALIDATING: &str = "validating";
pub const STATUS_COMPLETE: &str = "complete";

/// All valid response statuses, in lifecycle order.
pub const VALID_STATUSES: &[&str] = &[STATUS_INCOMPLETE, STATUS_VALIDATING, STATUS_COMPLETE];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResponseStatus {
    #[default]
    Incomplete,
    Validating,
    Complete,
}

impl ResponseStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            ResponseStatus::Incomplete => STATUS_INCOMPLETE,
            ResponseStatus::Validating => STATUS_VALIDATING,
            ResponseStatus::Complete => STATUS_COMPLETE,
        }
    }

    pub fn is_complete(self) -> bool {
        self == ResponseStatus::Complete
    }
}

impl fmt::Display for ResponseStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ResponseStatus {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            STATUS_INCOMPLETE => Ok(ResponseStatus::Incomplete),
            STATUS_VALIDATING => Ok(ResponseStatus::Validating),
            STATUS_COMPLETE => Ok(ResponseStatus::Complete),
            other => Err(CoreError::Validation(format!(
                "Invalid response status '{other}'. Must be one of: {}",
                VALID_STATUSES.join(", ")
            ))),
        }
    }
}

/// The columns written by a status-only update.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatusChange {
    pub status: ResponseStatus,
    pub completed_at: Option<Timestamp>,
}

/// `completed_at` after moving to `status`: stamped with `now` the first time
/// the response becomes complete, otherwise left as it was.
pub fn completion_timestamp(
    status: ResponseStatus,
    completed_at: Option<Timestamp>,
    now: Timestamp,
) -> Option<Timestamp> {
    match (status, completed_at) {
        (ResponseStatus::Complete, None) => Some(now),
        (_, existing) => existing,
    }
}

/// Reject `complete -> incomplete`. `persisted` is `None` for a new response.
pub fn check_no_downgrade(
    persisted: Option<ResponseStatus>,
    proposed: ResponseStatus,
) -> Result<(), FieldViolation> {
    if persisted == Some(ResponseStatus::Complete) && proposed == ResponseStatus::Incomplete {
        return Err(FieldViolation::new(
            "status",
            "complete_to_incomplete",
            "A completed response cannot be marked incomplete",
        ));
    }
    Ok(())
}

/// Compute a status-only transition from the persisted row.
pub fn transition(
    persisted: ResponseStatus,
    completed_at: Option<Timestamp>,
    next: ResponseStatus,
    now: Timestamp,
) -> Result<StatusChange, FieldViolation> {
    check_no_downgrade(Some(persisted), next)?;
    Ok(StatusChange {
        status: next,
        completed_at: completion_timestamp(next, completed_at, now),
    })
}

/// An offline client's status update is applied only when it is strictly
/// newer than the response's last persisted change.
pub fn is_newer(incoming_at: Timestamp, current_updated_at: Timestamp) -> bool {
    incoming_at > current_updated_at
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, TimeZone, Utc};

    use super::*;

    fn t0() -> Timestamp {
        Utc.with_ymd_and_hms(2013, 5, 5, 10, 0, 0).unwrap()
    }

    #[test]
    fn statuses_round_trip_through_strings() {
        for s in VALID_STATUSES {
            let status: ResponseStatus = s.parse().unwrap();
            assert_eq!(status.as_str(), *s);
        }
    }

    #[test]
    fn unknown_status_is_invalid() {
        assert!("done".parse::<ResponseStatus>().is_err());
        assert!("".parse::<ResponseStatus>().is_err());
    }

    #[test]
    fn default_status_is_incomplete() {
        assert_eq!(ResponseStatus::default(), ResponseStatus::Incomplete);
    }

    #[test]
    fn first_completion_stamps_now() {
        let change = transition(ResponseStatus::Incomplete, None, ResponseStatus::Complete, t0())
            .unwrap();
        assert_eq!(change.status, ResponseStatus::Complete);
        assert_eq!(change.completed_at, Some(t0()));
    }

    #[test]
    fn staying_complete_keeps_original_timestamp() {
        let later = t0() + Duration::days(3);
        let change = transition(
            ResponseStatus::Complete,
            Some(t0()),
            ResponseStatus::Complete,
            later,
        )
        .unwrap();
        assert_eq!(change.completed_at, Some(t0()));
    }

    #[test]
    fn non_complete_status_does_not_stamp() {
        assert_eq!(
            completion_timestamp(ResponseStatus::Incomplete, None, t0()),
            None
        );
        assert_eq!(
            completion_timestamp(ResponseStatus::Validating, None, t0()),
            None
        );
    }

    #[test]
    fn complete_cannot_be_downgraded_to_incomplete() {
        let err = transition(ResponseStatus::Complete, Some(t0()), ResponseStatus::Incomplete, t0())
            .unwrap_err();
        assert_eq!(err.field, "status");
    }

    #[test]
    fn validating_is_reachable_from_every_status() {
        for from in [
            ResponseStatus::Incomplete,
            ResponseStatus::Validating,
            ResponseStatus::Complete,
        ] {
            assert!(transition(from, None, ResponseStatus::Validating, t0()).is_ok());
        }
    }

    #[test]
    fn validating_can_become_incomplete_or_complete() {
        assert!(transition(ResponseStatus::Validating, None, ResponseStatus::Incomplete, t0()).is_ok());
        assert!(transition(ResponseStatus::Validating, None, ResponseStatus::Complete, t0()).is_ok());
    }

    #[test]
    fn new_response_may_start_in_any_status() {
        assert!(check_no_downgrade(None, ResponseStatus::Incomplete).is_ok());
        assert!(check_no_downgrade(None, ResponseStatus::Complete).is_ok());
    }

    #[test]
    fn merge_requires_strictly_newer_timestamp() {
        let current = t0();
        assert!(is_newer(current + Duration::seconds(1), current));
        assert!(!is_newer(current, current));
        assert!(!is_newer(current - Duration::days(5), current));
    }

    #[test]
    fn status_serializes_lowercase() {
        let json = serde_json::to_string(&ResponseStatus::Validating).unwrap();
        assert_eq!(json, "\"validating\"");
    }
}
