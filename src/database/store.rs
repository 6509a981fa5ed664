//! Entity store boundary
//!
//! Services talk to persistence only through [`PassStore`]. Two backends
//! implement it: [`PgStore`](super::PgStore) over PostgreSQL and
//! [`MemoryStore`](super::MemoryStore) for development and tests.

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use uuid::Uuid;

use crate::models::*;
use crate::pass::PassClosure;
use crate::utils::errors::Result;

#[async_trait]
pub trait PassStore: Send + Sync + 'static {
    async fn health_check(&self) -> Result<()>;

    // Users

    /// Insert the user on first sight; an existing user keeps its role
    async fn upsert_user(&self, email: &str, full_name: &str, now: DateTime<Utc>) -> Result<User>;
    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>>;
    async fn set_user_role(&self, id: Uuid, role: UserRole, now: DateTime<Utc>) -> Result<User>;

    // Student pass data

    async fn find_student_data(&self, email: &str) -> Result<Option<StudentPassData>>;
    /// Create the record unless one already exists for the email
    async fn get_or_create_student_data(&self, request: CreateStudentPassData, now: DateTime<Utc>) -> Result<StudentPassData>;
    /// Persist counters and balance of an existing record
    async fn save_student_data(&self, data: &StudentPassData) -> Result<StudentPassData>;
    async fn list_student_data(&self) -> Result<Vec<StudentPassData>>;

    // Pass sessions

    /// Fails with `ActivePassExists` if the student already has an OPEN session
    async fn create_session(&self, session: NewPassSession, now: DateTime<Utc>) -> Result<PassSession>;
    /// Apply a closure to a session that is still OPEN
    async fn close_session(&self, id: Uuid, closure: PassClosure) -> Result<PassSession>;
    async fn set_session_notes(&self, id: Uuid, notes: &str) -> Result<PassSession>;
    async fn find_session(&self, id: Uuid) -> Result<Option<PassSession>>;
    async fn find_open_session(&self, email: &str) -> Result<Option<PassSession>>;
    async fn list_open_sessions(&self) -> Result<Vec<PassSession>>;
    /// Newest first by start time
    async fn list_recent_sessions(&self, limit: i64) -> Result<Vec<PassSession>>;
    /// Newest first; `[start, end)`
    async fn list_sessions_between(&self, start: DateTime<Utc>, end: DateTime<Utc>) -> Result<Vec<PassSession>>;
    async fn list_sessions_for_student(&self, email: &str, limit: i64) -> Result<Vec<PassSession>>;

    // Pre-assigned passes

    async fn create_pre_assigned(&self, request: CreatePreAssignedRequest, now: DateTime<Utc>) -> Result<PreAssignedPass>;
    async fn find_pre_assigned(&self, id: Uuid) -> Result<Option<PreAssignedPass>>;
    async fn list_pre_assigned(&self) -> Result<Vec<PreAssignedPass>>;
    async fn list_pre_assigned_for_student(&self, email: &str) -> Result<Vec<PreAssignedPass>>;
    async fn update_pre_assigned_status(
        &self,
        id: Uuid,
        status: PreAssignedStatus,
        notes: Option<String>,
    ) -> Result<PreAssignedPass>;
    /// Only an approved pass can be consumed
    async fn mark_pre_assigned_used(&self, id: Uuid, session_id: Uuid, used_at: DateTime<Utc>) -> Result<PreAssignedPass>;

    // Notification settings

    async fn find_notification_settings(&self, email: &str) -> Result<Option<NotificationSettings>>;
    async fn save_notification_settings(&self, settings: &NotificationSettings) -> Result<NotificationSettings>;

    // PBIS ledger

    async fn record_pbis_transaction(&self, transaction: NewPbisTransaction, now: DateTime<Utc>) -> Result<PbisTransaction>;
    async fn list_pbis_transactions(&self, email: &str) -> Result<Vec<PbisTransaction>>;

    // Monthly reports

    /// Insert or replace the report for `report.month`, keeping the first id
    async fn upsert_monthly_report(&self, report: &MonthlyReport) -> Result<MonthlyReport>;
    async fn find_monthly_report(&self, month: &str) -> Result<Option<MonthlyReport>>;
    async fn list_monthly_reports(&self) -> Result<Vec<MonthlyReport>>;

    // Scheduled messages

    async fn create_scheduled_message(&self, request: CreateScheduledMessageRequest, now: DateTime<Utc>) -> Result<ScheduledMessage>;
    async fn find_scheduled_message(&self, id: Uuid) -> Result<Option<ScheduledMessage>>;
    /// Messages still `scheduled` whose date is at or before `now`
    async fn list_due_messages(&self, now: DateTime<Utc>) -> Result<Vec<ScheduledMessage>>;
    /// Move a message from `scheduled` to `sending`.
    ///
    /// Returns false when another sweep already claimed it. Only the claimant
    /// may mark the message sent or failed.
    async fn claim_message(&self, id: Uuid) -> Result<bool>;
    async fn mark_message_sent(&self, id: Uuid, sent_at: DateTime<Utc>) -> Result<()>;
    async fn mark_message_failed(&self, id: Uuid, error: &str) -> Result<()>;

    // Attendance

    /// Fails with `Conflict` if the student already checked in that day
    async fn create_attendance(&self, record: DailyAttendance) -> Result<DailyAttendance>;
    async fn find_attendance(&self, email: &str, date: NaiveDate) -> Result<Option<DailyAttendance>>;
    async fn list_attendance_for_date(&self, date: NaiveDate) -> Result<Vec<DailyAttendance>>;

    // Parent contact preferences

    /// Insert or replace by student email, keeping the first id and notice date
    async fn upsert_parent_preference(&self, preference: &ParentContactPreference) -> Result<ParentContactPreference>;
    async fn find_parent_preference(&self, student_email: &str) -> Result<Option<ParentContactPreference>>;
    async fn list_parent_preferences(&self) -> Result<Vec<ParentContactPreference>>;
    /// Record that `date`'s absence alert is going out.
    ///
    /// Returns false when an alert for that day was already claimed.
    async fn claim_absence_notice(&self, id: Uuid, date: NaiveDate) -> Result<bool>;
}
