//! Student allowance and PBIS models

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use chrono::{DateTime, NaiveDate, Utc};
use sqlx::FromRow;
use uuid::Uuid;

use super::ParseEnumError;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct StudentPassData {
    pub id: Uuid,
    pub student_name: String,
    pub student_email: String,
    pub monthly_pass_allowance: i32,
    pub passes_used_this_month: i32,
    pub purchased_passes_this_month: i32,
    pub unused_passes_last_month: i32,
    pub pbis_points_balance: i32,
    pub last_reset_date: NaiveDate,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateStudentPassData {
    pub student_name: String,
    pub student_email: String,
    pub monthly_pass_allowance: i32,
    pub last_reset_date: NaiveDate,
}

impl CreateStudentPassData {
    pub fn into_record(self, id: Uuid, now: DateTime<Utc>) -> StudentPassData {
        StudentPassData {
            id,
            student_name: self.student_name,
            student_email: self.student_email,
            monthly_pass_allowance: self.monthly_pass_allowance,
            passes_used_this_month: 0,
            purchased_passes_this_month: 0,
            unused_passes_last_month: 0,
            pbis_points_balance: 0,
            last_reset_date: self.last_reset_date,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Pass data as presented to students and teachers
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PassDataSummary {
    #[serde(flatten)]
    pub data: StudentPassData,
    pub remaining_passes: i32,
    pub total_allowance: i32,
    pub can_purchase: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PbisReason {
    PassPurchase,
    UnusedPassTradeIn,
    TeacherAward,
}

impl PbisReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            PbisReason::PassPurchase => "pass_purchase",
            PbisReason::UnusedPassTradeIn => "unused_pass_trade_in",
            PbisReason::TeacherAward => "teacher_award",
        }
    }
}

impl fmt::Display for PbisReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PbisReason {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pass_purchase" => Ok(PbisReason::PassPurchase),
            "unused_pass_trade_in" => Ok(PbisReason::UnusedPassTradeIn),
            "teacher_award" => Ok(PbisReason::TeacherAward),
            other => Err(ParseEnumError::new("PBIS reason", other)),
        }
    }
}

impl TryFrom<String> for PbisReason {
    type Error = ParseEnumError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct PbisTransaction {
    pub id: Uuid,
    pub student_name: String,
    pub student_email: String,
    pub points_delta: i32,
    #[sqlx(try_from = "String")]
    pub reason: PbisReason,
    pub description: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewPbisTransaction {
    pub student_name: String,
    pub student_email: String,
    pub points_delta: i32,
    pub reason: PbisReason,
    pub description: String,
}

impl NewPbisTransaction {
    pub fn into_record(self, id: Uuid, now: DateTime<Utc>) -> PbisTransaction {
        PbisTransaction {
            id,
            student_name: self.student_name,
            student_email: self.student_email,
            points_delta: self.points_delta,
            reason: self.reason,
            description: self.description,
            created_at: now,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AwardPointsRequest {
    pub student_email: String,
    pub points: i32,
    pub reason: String,
}

/// Outcome of the monthly reset for one student
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResetOutcome {
    pub student_email: String,
    pub unused_passes: i32,
    pub points_credited: i32,
}
