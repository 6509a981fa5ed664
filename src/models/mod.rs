//! Data models module
//!
//! This module contains all data structures used throughout the application

pub mod user;
pub mod pass;
pub mod student;
pub mod pre_assigned;
pub mod notification;
pub mod report;
pub mod message;
pub mod assistant;
pub mod attendance;

// Re-export commonly used models
pub use user::{User, UserRole, ElevateRequest};
pub use pass::{PassSession, PassStatus, Destination, NewPassSession, StartPassRequest, EndPassRequest, TeacherNoteRequest};
pub use student::{StudentPassData, CreateStudentPassData, PassDataSummary, PbisTransaction, NewPbisTransaction, PbisReason, AwardPointsRequest, ResetOutcome};
pub use pre_assigned::{PreAssignedPass, PreAssignedStatus, CreatePreAssignedRequest, ReviewPreAssignedRequest};
pub use notification::{NotificationSettings, UpdateNotificationSettingsRequest, MIN_REMINDER_MINUTES, MAX_REMINDER_MINUTES};
pub use report::{MonthlyReport, TopUser};
pub use message::{ScheduledMessage, MessageStatus, CreateScheduledMessageRequest, DeliveryResult, SweepSummary};
pub use assistant::{Tone, FeedbackRequest, FeedbackResponse, ParentMessageRequest, ParentMessageResponse};
pub use attendance::{DailyAttendance, AttendanceStatus, CheckInRequest, RosterEntry, AttendanceRoster, ParentContactPreference, ContactMethod, SaveParentPreferenceRequest, AbsenceNotice, NoticeStatus, AbsenceSweepSummary, DAILY_QUESTION};

/// A stored string did not name a known enum variant
#[derive(Debug, Clone, thiserror::Error)]
#[error("unknown {kind}: {value}")]
pub struct ParseEnumError {
    kind: &'static str,
    value: String,
}

impl ParseEnumError {
    pub fn new(kind: &'static str, value: &str) -> Self {
        Self { kind, value: value.to_string() }
    }
}
