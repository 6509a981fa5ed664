//! Daily attendance check-ins and parent contact preferences

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use chrono::{DateTime, NaiveDate, Utc};
use sqlx::FromRow;
use uuid::Uuid;

use super::ParseEnumError;

/// Question shown to students when they check in
pub const DAILY_QUESTION: &str = "What are you most excited to work on today?";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AttendanceStatus {
    Present,
    /// Never stored; a roster entry without a check-in
    Absent,
}

impl AttendanceStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            AttendanceStatus::Present => "present",
            AttendanceStatus::Absent => "absent",
        }
    }
}

impl fmt::Display for AttendanceStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AttendanceStatus {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "present" => Ok(AttendanceStatus::Present),
            "absent" => Ok(AttendanceStatus::Absent),
            other => Err(ParseEnumError::new("attendance status", other)),
        }
    }
}

impl TryFrom<String> for AttendanceStatus {
    type Error = ParseEnumError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContactMethod {
    #[default]
    Email,
    Sms,
    Both,
}

impl ContactMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            ContactMethod::Email => "email",
            ContactMethod::Sms => "sms",
            ContactMethod::Both => "both",
        }
    }
}

impl FromStr for ContactMethod {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "email" => Ok(ContactMethod::Email),
            "sms" => Ok(ContactMethod::Sms),
            "both" => Ok(ContactMethod::Both),
            other => Err(ParseEnumError::new("contact method", other)),
        }
    }
}

impl TryFrom<String> for ContactMethod {
    type Error = ParseEnumError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

/// One student check-in; at most one per student per school day
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct DailyAttendance {
    pub id: Uuid,
    pub student_name: String,
    pub student_email: String,
    pub check_in_date: NaiveDate,
    pub check_in_time: DateTime<Utc>,
    pub daily_question: String,
    pub student_answer: String,
    #[sqlx(try_from = "String")]
    pub status: AttendanceStatus,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckInRequest {
    pub student_answer: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RosterEntry {
    pub student_name: String,
    pub student_email: String,
    pub status: AttendanceStatus,
    pub check_in_time: Option<DateTime<Utc>>,
    pub daily_question: Option<String>,
    pub student_answer: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AttendanceRoster {
    pub date: NaiveDate,
    pub present: usize,
    pub absent: usize,
    pub entries: Vec<RosterEntry>,
}

/// Who to contact about a student, and for what
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct ParentContactPreference {
    pub id: Uuid,
    pub student_name: String,
    pub student_email: String,
    pub parent_email: String,
    pub parent_phone: Option<String>,
    pub notify_on_absence: bool,
    pub notify_on_referral: bool,
    pub notify_on_failing: bool,
    pub notify_on_updates: bool,
    #[sqlx(try_from = "String")]
    pub preferred_contact_method: ContactMethod,
    /// School day of the last absence alert
    pub last_absence_notice: Option<NaiveDate>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

fn enabled() -> bool {
    true
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SaveParentPreferenceRequest {
    pub student_email: String,
    pub student_name: Option<String>,
    pub parent_email: String,
    pub parent_phone: Option<String>,
    #[serde(default = "enabled")]
    pub notify_on_absence: bool,
    #[serde(default = "enabled")]
    pub notify_on_referral: bool,
    #[serde(default = "enabled")]
    pub notify_on_failing: bool,
    #[serde(default)]
    pub notify_on_updates: bool,
    #[serde(default)]
    pub preferred_contact_method: ContactMethod,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NoticeStatus {
    Sent,
    Failed,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AbsenceNotice {
    pub student_email: String,
    pub parent_email: String,
    pub status: NoticeStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AbsenceSweepSummary {
    pub date: NaiveDate,
    /// Preferences looked at
    pub checked: usize,
    pub notifications_sent: usize,
    pub results: Vec<AbsenceNotice>,
}
