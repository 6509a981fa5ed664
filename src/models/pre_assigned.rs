//! Pre-assigned pass model

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use chrono::{DateTime, NaiveDate, Utc};
use sqlx::FromRow;
use uuid::Uuid;

use super::{Destination, ParseEnumError};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PreAssignedStatus {
    Pending,
    Approved,
    Denied,
    Used,
}

impl PreAssignedStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PreAssignedStatus::Pending => "pending",
            PreAssignedStatus::Approved => "approved",
            PreAssignedStatus::Denied => "denied",
            PreAssignedStatus::Used => "used",
        }
    }

    /// Whether a teacher review may move a pass from `self` to `next`
    pub fn can_review_to(&self, next: PreAssignedStatus) -> bool {
        matches!(
            (self, next),
            (PreAssignedStatus::Pending, PreAssignedStatus::Approved)
                | (PreAssignedStatus::Pending, PreAssignedStatus::Denied)
        )
    }
}

impl fmt::Display for PreAssignedStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PreAssignedStatus {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(PreAssignedStatus::Pending),
            "approved" => Ok(PreAssignedStatus::Approved),
            "denied" => Ok(PreAssignedStatus::Denied),
            "used" => Ok(PreAssignedStatus::Used),
            other => Err(ParseEnumError::new("pre-assigned status", other)),
        }
    }
}

impl TryFrom<String> for PreAssignedStatus {
    type Error = ParseEnumError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct PreAssignedPass {
    pub id: Uuid,
    pub student_name: String,
    pub student_email: String,
    #[sqlx(try_from = "String")]
    pub destination: Destination,
    pub scheduled_date: NaiveDate,
    pub reason: Option<String>,
    #[sqlx(try_from = "String")]
    pub status: PreAssignedStatus,
    pub teacher_notes: Option<String>,
    pub used_at: Option<DateTime<Utc>>,
    pub pass_session_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreatePreAssignedRequest {
    pub student_name: String,
    pub student_email: String,
    pub destination: Destination,
    pub scheduled_date: NaiveDate,
    pub reason: Option<String>,
}

impl CreatePreAssignedRequest {
    pub fn into_record(self, id: Uuid, now: DateTime<Utc>) -> PreAssignedPass {
        PreAssignedPass {
            id,
            student_name: self.student_name,
            student_email: self.student_email,
            destination: self.destination,
            scheduled_date: self.scheduled_date,
            reason: self.reason,
            status: PreAssignedStatus::Pending,
            teacher_notes: None,
            used_at: None,
            pass_session_id: None,
            created_at: now,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReviewPreAssignedRequest {
    pub status: PreAssignedStatus,
    pub notes: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_review_transitions() {
        assert!(PreAssignedStatus::Pending.can_review_to(PreAssignedStatus::Approved));
        assert!(PreAssignedStatus::Pending.can_review_to(PreAssignedStatus::Denied));
        assert!(!PreAssignedStatus::Approved.can_review_to(PreAssignedStatus::Denied));
        assert!(!PreAssignedStatus::Pending.can_review_to(PreAssignedStatus::Used));
        assert!(!PreAssignedStatus::Used.can_review_to(PreAssignedStatus::Approved));
    }
}
