//! PostgreSQL-backed store
//!
//! Composes the per-table repositories behind [`PassStore`].

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use uuid::Uuid;

use crate::database::repositories::*;
use crate::database::{health_check, DatabasePool, PassStore};
use crate::models::*;
use crate::pass::PassClosure;
use crate::utils::errors::Result;

#[derive(Debug, Clone)]
pub struct PgStore {
    pool: DatabasePool,
    pub users: UserRepository,
    pub students: StudentRepository,
    pub sessions: SessionRepository,
    pub pre_assigned: PreAssignedRepository,
    pub notifications: NotificationRepository,
    pub reports: ReportRepository,
    pub messages: MessageRepository,
    pub attendance: AttendanceRepository,
}

impl PgStore {
    pub fn new(pool: DatabasePool) -> Self {
        Self {
            users: UserRepository::new(pool.clone()),
            students: StudentRepository::new(pool.clone()),
            sessions: SessionRepository::new(pool.clone()),
            pre_assigned: PreAssignedRepository::new(pool.clone()),
            notifications: NotificationRepository::new(pool.clone()),
            reports: ReportRepository::new(pool.clone()),
            messages: MessageRepository::new(pool.clone()),
            attendance: AttendanceRepository::new(pool.clone()),
            pool,
        }
    }
}

#[async_trait]
impl PassStore for PgStore {
    async fn health_check(&self) -> Result<()> {
        health_check(&self.pool).await
    }

    async fn upsert_user(&self, email: &str, full_name: &str, now: DateTime<Utc>) -> Result<User> {
        self.users.upsert(email, full_name, now).await
    }

    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>> {
        self.users.find_by_email(email).await
    }

    async fn set_user_role(&self, id: Uuid, role: UserRole, now: DateTime<Utc>) -> Result<User> {
        self.users.set_role(id, role, now).await
    }

    async fn find_student_data(&self, email: &str) -> Result<Option<StudentPassData>> {
        self.students.find_by_email(email).await
    }

    async fn get_or_create_student_data(&self, request: CreateStudentPassData, now: DateTime<Utc>) -> Result<StudentPassData> {
        self.students.get_or_create(request, now).await
    }

    async fn save_student_data(&self, data: &StudentPassData) -> Result<StudentPassData> {
        self.students.save(data).await
    }

    async fn list_student_data(&self) -> Result<Vec<StudentPassData>> {
        self.students.list().await
    }

    async fn create_session(&self, session: NewPassSession, now: DateTime<Utc>) -> Result<PassSession> {
        self.sessions.create(session, now).await
    }

    async fn close_session(&self, id: Uuid, closure: PassClosure) -> Result<PassSession> {
        self.sessions.close(id, closure).await
    }

    async fn set_session_notes(&self, id: Uuid, notes: &str) -> Result<PassSession> {
        self.sessions.set_notes(id, notes).await
    }

    async fn find_session(&self, id: Uuid) -> Result<Option<PassSession>> {
        self.sessions.find_by_id(id).await
    }

    async fn find_open_session(&self, email: &str) -> Result<Option<PassSession>> {
        self.sessions.find_open(email).await
    }

    async fn list_open_sessions(&self) -> Result<Vec<PassSession>> {
        self.sessions.list_open().await
    }

    async fn list_recent_sessions(&self, limit: i64) -> Result<Vec<PassSession>> {
        self.sessions.list_recent(limit).await
    }

    async fn list_sessions_between(&self, start: DateTime<Utc>, end: DateTime<Utc>) -> Result<Vec<PassSession>> {
        self.sessions.list_between(start, end).await
    }

    async fn list_sessions_for_student(&self, email: &str, limit: i64) -> Result<Vec<PassSession>> {
        self.sessions.list_for_student(email, limit).await
    }

    async fn create_pre_assigned(&self, request: CreatePreAssignedRequest, now: DateTime<Utc>) -> Result<PreAssignedPass> {
        self.pre_assigned.create(request, now).await
    }

    async fn find_pre_assigned(&self, id: Uuid) -> Result<Option<PreAssignedPass>> {
        self.pre_assigned.find_by_id(id).await
    }

    async fn list_pre_assigned(&self) -> Result<Vec<PreAssignedPass>> {
        self.pre_assigned.list().await
    }

    async fn list_pre_assigned_for_student(&self, email: &str) -> Result<Vec<PreAssignedPass>> {
        self.pre_assigned.list_for_student(email).await
    }

    async fn update_pre_assigned_status(
        &self,
        id: Uuid,
        status: PreAssignedStatus,
        notes: Option<String>,
    ) -> Result<PreAssignedPass> {
        self.pre_assigned.update_status(id, status, notes).await
    }

    async fn mark_pre_assigned_used(&self, id: Uuid, session_id: Uuid, used_at: DateTime<Utc>) -> Result<PreAssignedPass> {
        self.pre_assigned.mark_used(id, session_id, used_at).await
    }

    async fn find_notification_settings(&self, email: &str) -> Result<Option<NotificationSettings>> {
        self.notifications.find_by_email(email).await
    }

    async fn save_notification_settings(&self, settings: &NotificationSettings) -> Result<NotificationSettings> {
        self.notifications.upsert(settings).await
    }

    async fn record_pbis_transaction(&self, transaction: NewPbisTransaction, now: DateTime<Utc>) -> Result<PbisTransaction> {
        self.students.record_transaction(transaction, now).await
    }

    async fn list_pbis_transactions(&self, email: &str) -> Result<Vec<PbisTransaction>> {
        self.students.list_transactions(email).await
    }

    async fn upsert_monthly_report(&self, report: &MonthlyReport) -> Result<MonthlyReport> {
        self.reports.upsert(report).await
    }

    async fn find_monthly_report(&self, month: &str) -> Result<Option<MonthlyReport>> {
        self.reports.find_by_month(month).await
    }

    async fn list_monthly_reports(&self) -> Result<Vec<MonthlyReport>> {
        self.reports.list().await
    }

    async fn create_scheduled_message(&self, request: CreateScheduledMessageRequest, now: DateTime<Utc>) -> Result<ScheduledMessage> {
        self.messages.create(request, now).await
    }

    async fn find_scheduled_message(&self, id: Uuid) -> Result<Option<ScheduledMessage>> {
        self.messages.find_by_id(id).await
    }

    async fn list_due_messages(&self, now: DateTime<Utc>) -> Result<Vec<ScheduledMessage>> {
        self.messages.list_due(now).await
    }

    async fn claim_message(&self, id: Uuid) -> Result<bool> {
        self.messages.claim(id).await
    }

    async fn mark_message_sent(&self, id: Uuid, sent_at: DateTime<Utc>) -> Result<()> {
        self.messages.mark_sent(id, sent_at).await
    }

    async fn mark_message_failed(&self, id: Uuid, error: &str) -> Result<()> {
        self.messages.mark_failed(id, error).await
    }

    async fn create_attendance(&self, record: DailyAttendance) -> Result<DailyAttendance> {
        self.attendance.create(record).await
    }

    async fn find_attendance(&self, email: &str, date: NaiveDate) -> Result<Option<DailyAttendance>> {
        self.attendance.find(email, date).await
    }

    async fn list_attendance_for_date(&self, date: NaiveDate) -> Result<Vec<DailyAttendance>> {
        self.attendance.list_for_date(date).await
    }

    async fn upsert_parent_preference(&self, preference: &ParentContactPreference) -> Result<ParentContactPreference> {
        self.attendance.upsert_preference(preference).await
    }

    async fn find_parent_preference(&self, student_email: &str) -> Result<Option<ParentContactPreference>> {
        self.attendance.find_preference(student_email).await
    }

    async fn list_parent_preferences(&self) -> Result<Vec<ParentContactPreference>> {
        self.attendance.list_preferences().await
    }

    async fn claim_absence_notice(&self, id: Uuid, date: NaiveDate) -> Result<bool> {
        self.attendance.claim_absence_notice(id, date).await
    }
}
