//! Pass session model

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use chrono::{DateTime, Utc};
use sqlx::FromRow;
use uuid::Uuid;

use super::ParseEnumError;

/// Where a student is going
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Destination {
    Restroom,
    #[serde(rename = "Water Fountain")]
    WaterFountain,
    #[serde(rename = "Main Office")]
    MainOffice,
    Counselor,
    Nurse,
    Library,
    Other,
}

impl Destination {
    pub const ALL: [Destination; 7] = [
        Destination::Restroom,
        Destination::WaterFountain,
        Destination::MainOffice,
        Destination::Counselor,
        Destination::Nurse,
        Destination::Library,
        Destination::Other,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Destination::Restroom => "Restroom",
            Destination::WaterFountain => "Water Fountain",
            Destination::MainOffice => "Main Office",
            Destination::Counselor => "Counselor",
            Destination::Nurse => "Nurse",
            Destination::Library => "Library",
            Destination::Other => "Other",
        }
    }
}

impl fmt::Display for Destination {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Destination {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Destination::ALL
            .iter()
            .copied()
            .find(|d| d.as_str() == s)
            .ok_or_else(|| ParseEnumError::new("destination", s))
    }
}

impl TryFrom<String> for Destination {
    type Error = ParseEnumError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

/// Pass session status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PassStatus {
    Open,
    Closed,
    AutoClosed,
    ReturnUnconfirmed,
}

impl PassStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PassStatus::Open => "OPEN",
            PassStatus::Closed => "CLOSED",
            PassStatus::AutoClosed => "AUTO_CLOSED",
            PassStatus::ReturnUnconfirmed => "RETURN_UNCONFIRMED",
        }
    }

    /// Terminal sessions never change status again
    pub fn is_terminal(&self) -> bool {
        !matches!(self, PassStatus::Open)
    }
}

impl fmt::Display for PassStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PassStatus {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "OPEN" => Ok(PassStatus::Open),
            "CLOSED" => Ok(PassStatus::Closed),
            "AUTO_CLOSED" => Ok(PassStatus::AutoClosed),
            "RETURN_UNCONFIRMED" => Ok(PassStatus::ReturnUnconfirmed),
            other => Err(ParseEnumError::new("pass status", other)),
        }
    }
}

impl TryFrom<String> for PassStatus {
    type Error = ParseEnumError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct PassSession {
    pub id: Uuid,
    pub student_name: String,
    pub student_email: String,
    #[sqlx(try_from = "String")]
    pub destination: Destination,
    pub start_time: DateTime<Utc>,
    pub end_time: Option<DateTime<Utc>>,
    pub duration_minutes: Option<i32>,
    #[sqlx(try_from = "String")]
    pub status: PassStatus,
    pub overtime: bool,
    pub return_code_entered: Option<String>,
    pub return_code_validated: bool,
    pub teacher_notes: Option<String>,
    pub pre_assigned_pass_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewPassSession {
    pub student_name: String,
    pub student_email: String,
    pub destination: Destination,
    pub start_time: DateTime<Utc>,
    pub pre_assigned_pass_id: Option<Uuid>,
}

impl NewPassSession {
    /// Materialize the record as the store creates it
    pub fn into_session(self, id: Uuid, created_at: DateTime<Utc>) -> PassSession {
        PassSession {
            id,
            student_name: self.student_name,
            student_email: self.student_email,
            destination: self.destination,
            start_time: self.start_time,
            end_time: None,
            duration_minutes: None,
            status: PassStatus::Open,
            overtime: false,
            return_code_entered: None,
            return_code_validated: false,
            teacher_notes: None,
            pre_assigned_pass_id: self.pre_assigned_pass_id,
            created_at,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StartPassRequest {
    pub destination: Option<Destination>,
    pub pre_assigned_id: Option<Uuid>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EndPassRequest {
    pub code: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TeacherNoteRequest {
    pub notes: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_destination_round_trips_display_names() {
        for destination in Destination::ALL {
            assert_eq!(destination.as_str().parse::<Destination>().unwrap(), destination);
        }
        assert!("Gym".parse::<Destination>().is_err());
    }

    #[test]
    fn test_destination_serde_uses_display_names() {
        let json = serde_json::to_string(&Destination::WaterFountain).unwrap();
        assert_eq!(json, "\"Water Fountain\"");
        let parsed: Destination = serde_json::from_str("\"Main Office\"").unwrap();
        assert_eq!(parsed, Destination::MainOffice);
    }

    #[test]
    fn test_status_terminality() {
        assert!(!PassStatus::Open.is_terminal());
        assert!(PassStatus::Closed.is_terminal());
        assert!(PassStatus::AutoClosed.is_terminal());
        assert!(PassStatus::ReturnUnconfirmed.is_terminal());
        assert_eq!(serde_json::to_string(&PassStatus::ReturnUnconfirmed).unwrap(), "\"RETURN_UNCONFIRMED\"");
    }
}
