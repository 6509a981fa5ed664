//! In-process store for `memory://` and tests

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use tokio::sync::Mutex;
use uuid::Uuid;

use crate::models::*;
use crate::pass::PassClosure;
use crate::utils::errors::{Result, TeachersPetError};

use super::store::PassStore;

#[derive(Default)]
struct Tables {
    users: HashMap<String, User>,
    student_data: HashMap<String, StudentPassData>,
    sessions: Vec<PassSession>,
    pre_assigned: Vec<PreAssignedPass>,
    notification_settings: HashMap<String, NotificationSettings>,
    pbis_transactions: Vec<PbisTransaction>,
    reports: HashMap<String, MonthlyReport>,
    messages: Vec<ScheduledMessage>,
    attendance: Vec<DailyAttendance>,
    parent_preferences: HashMap<String, ParentContactPreference>,
}

impl Tables {
    fn session_mut(&mut self, id: Uuid) -> Result<&mut PassSession> {
        self.sessions
            .iter_mut()
            .find(|s| s.id == id)
            .ok_or_else(|| TeachersPetError::not_found("pass session", id))
    }

    fn pre_assigned_mut(&mut self, id: Uuid) -> Result<&mut PreAssignedPass> {
        self.pre_assigned
            .iter_mut()
            .find(|p| p.id == id)
            .ok_or_else(|| TeachersPetError::not_found("pre-assigned pass", id))
    }

    fn message_mut(&mut self, id: Uuid) -> Result<&mut ScheduledMessage> {
        self.messages
            .iter_mut()
            .find(|m| m.id == id)
            .ok_or_else(|| TeachersPetError::not_found("scheduled message", id))
    }

    fn claimed_message_mut(&mut self, id: Uuid) -> Result<&mut ScheduledMessage> {
        let message = self.message_mut(id)?;
        if message.status != MessageStatus::Sending {
            return Err(TeachersPetError::InvalidStateTransition {
                from: message.status.to_string(),
                to: "delivered".to_string(),
            });
        }
        Ok(message)
    }
}

/// Newest first by start time; later inserts win ties
fn newest_first(sessions: impl DoubleEndedIterator<Item = PassSession>) -> Vec<PassSession> {
    let mut sorted: Vec<PassSession> = sessions.rev().collect();
    sorted.sort_by(|a, b| b.start_time.cmp(&a.start_time));
    sorted
}

/// Store backed by mutex-guarded maps; every call sees one consistent snapshot
#[derive(Default)]
pub struct MemoryStore {
    tables: Mutex<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl PassStore for MemoryStore {
    async fn health_check(&self) -> Result<()> {
        Ok(())
    }

    async fn upsert_user(&self, email: &str, full_name: &str, now: DateTime<Utc>) -> Result<User> {
        let mut tables = self.tables.lock().await;
        let user = tables.users.entry(email.to_string()).or_insert_with(|| User {
            id: Uuid::new_v4(),
            email: email.to_string(),
            full_name: full_name.to_string(),
            role: UserRole::User,
            created_at: now,
            updated_at: now,
        });
        if user.full_name != full_name {
            user.full_name = full_name.to_string();
            user.updated_at = now;
        }
        Ok(user.clone())
    }

    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>> {
        Ok(self.tables.lock().await.users.get(email).cloned())
    }

    async fn set_user_role(&self, id: Uuid, role: UserRole, now: DateTime<Utc>) -> Result<User> {
        let mut tables = self.tables.lock().await;
        let user = tables
            .users
            .values_mut()
            .find(|u| u.id == id)
            .ok_or_else(|| TeachersPetError::not_found("user", id))?;
        user.role = role;
        user.updated_at = now;
        Ok(user.clone())
    }

    async fn find_student_data(&self, email: &str) -> Result<Option<StudentPassData>> {
        Ok(self.tables.lock().await.student_data.get(email).cloned())
    }

    async fn get_or_create_student_data(&self, request: CreateStudentPassData, now: DateTime<Utc>) -> Result<StudentPassData> {
        let mut tables = self.tables.lock().await;
        let data = tables
            .student_data
            .entry(request.student_email.clone())
            .or_insert_with(|| request.into_record(Uuid::new_v4(), now));
        Ok(data.clone())
    }

    async fn save_student_data(&self, data: &StudentPassData) -> Result<StudentPassData> {
        let mut tables = self.tables.lock().await;
        let existing = tables
            .student_data
            .get_mut(&data.student_email)
            .ok_or_else(|| TeachersPetError::not_found("student pass data", &data.student_email))?;
        *existing = data.clone();
        Ok(existing.clone())
    }

    async fn list_student_data(&self) -> Result<Vec<StudentPassData>> {
        let tables = self.tables.lock().await;
        let mut all: Vec<StudentPassData> = tables.student_data.values().cloned().collect();
        all.sort_by(|a, b| a.student_name.cmp(&b.student_name));
        Ok(all)
    }

    async fn create_session(&self, session: NewPassSession, now: DateTime<Utc>) -> Result<PassSession> {
        let mut tables = self.tables.lock().await;
        if tables
            .sessions
            .iter()
            .any(|s| s.student_email == session.student_email && s.status == PassStatus::Open)
        {
            return Err(TeachersPetError::ActivePassExists { student: session.student_email });
        }
        let created = session.into_session(Uuid::new_v4(), now);
        tables.sessions.push(created.clone());
        Ok(created)
    }

    async fn close_session(&self, id: Uuid, closure: PassClosure) -> Result<PassSession> {
        let mut tables = self.tables.lock().await;
        let session = tables.session_mut(id)?;
        if session.status != PassStatus::Open {
            return Err(TeachersPetError::InvalidStateTransition {
                from: session.status.to_string(),
                to: closure.status.to_string(),
            });
        }
        closure.apply(session);
        Ok(session.clone())
    }

    async fn set_session_notes(&self, id: Uuid, notes: &str) -> Result<PassSession> {
        let mut tables = self.tables.lock().await;
        let session = tables.session_mut(id)?;
        session.teacher_notes = Some(notes.to_string());
        Ok(session.clone())
    }

    async fn find_session(&self, id: Uuid) -> Result<Option<PassSession>> {
        Ok(self.tables.lock().await.sessions.iter().find(|s| s.id == id).cloned())
    }

    async fn find_open_session(&self, email: &str) -> Result<Option<PassSession>> {
        Ok(self
            .tables
            .lock()
            .await
            .sessions
            .iter()
            .find(|s| s.student_email == email && s.status == PassStatus::Open)
            .cloned())
    }

    async fn list_open_sessions(&self) -> Result<Vec<PassSession>> {
        let tables = self.tables.lock().await;
        Ok(newest_first(
            tables.sessions.iter().filter(|s| s.status == PassStatus::Open).cloned().collect::<Vec<_>>().into_iter(),
        ))
    }

    async fn list_recent_sessions(&self, limit: i64) -> Result<Vec<PassSession>> {
        let tables = self.tables.lock().await;
        let mut sessions = newest_first(tables.sessions.clone().into_iter());
        sessions.truncate(limit.max(0) as usize);
        Ok(sessions)
    }

    async fn list_sessions_between(&self, start: DateTime<Utc>, end: DateTime<Utc>) -> Result<Vec<PassSession>> {
        let tables = self.tables.lock().await;
        Ok(newest_first(
            tables
                .sessions
                .iter()
                .filter(|s| s.start_time >= start && s.start_time < end)
                .cloned()
                .collect::<Vec<_>>()
                .into_iter(),
        ))
    }

    async fn list_sessions_for_student(&self, email: &str, limit: i64) -> Result<Vec<PassSession>> {
        let tables = self.tables.lock().await;
        let mut sessions = newest_first(
            tables
                .sessions
                .iter()
                .filter(|s| s.student_email == email)
                .cloned()
                .collect::<Vec<_>>()
                .into_iter(),
        );
        sessions.truncate(limit.max(0) as usize);
        Ok(sessions)
    }

    async fn create_pre_assigned(&self, request: CreatePreAssignedRequest, now: DateTime<Utc>) -> Result<PreAssignedPass> {
        let pass = request.into_record(Uuid::new_v4(), now);
        self.tables.lock().await.pre_assigned.push(pass.clone());
        Ok(pass)
    }

    async fn find_pre_assigned(&self, id: Uuid) -> Result<Option<PreAssignedPass>> {
        Ok(self.tables.lock().await.pre_assigned.iter().find(|p| p.id == id).cloned())
    }

    async fn list_pre_assigned(&self) -> Result<Vec<PreAssignedPass>> {
        let mut passes = self.tables.lock().await.pre_assigned.clone();
        passes.sort_by(|a, b| b.scheduled_date.cmp(&a.scheduled_date));
        Ok(passes)
    }

    async fn list_pre_assigned_for_student(&self, email: &str) -> Result<Vec<PreAssignedPass>> {
        let tables = self.tables.lock().await;
        let mut passes: Vec<PreAssignedPass> = tables
            .pre_assigned
            .iter()
            .filter(|p| p.student_email == email)
            .cloned()
            .collect();
        passes.sort_by(|a, b| b.scheduled_date.cmp(&a.scheduled_date));
        Ok(passes)
    }

    async fn update_pre_assigned_status(
        &self,
        id: Uuid,
        status: PreAssignedStatus,
        notes: Option<String>,
    ) -> Result<PreAssignedPass> {
        let mut tables = self.tables.lock().await;
        let pass = tables.pre_assigned_mut(id)?;
        pass.status = status;
        if notes.is_some() {
            pass.teacher_notes = notes;
        }
        Ok(pass.clone())
    }

    async fn mark_pre_assigned_used(&self, id: Uuid, session_id: Uuid, used_at: DateTime<Utc>) -> Result<PreAssignedPass> {
        let mut tables = self.tables.lock().await;
        let pass = tables.pre_assigned_mut(id)?;
        if pass.status != PreAssignedStatus::Approved {
            return Err(TeachersPetError::InvalidStateTransition {
                from: pass.status.to_string(),
                to: PreAssignedStatus::Used.to_string(),
            });
        }
        pass.status = PreAssignedStatus::Used;
        pass.used_at = Some(used_at);
        pass.pass_session_id = Some(session_id);
        Ok(pass.clone())
    }

    async fn find_notification_settings(&self, email: &str) -> Result<Option<NotificationSettings>> {
        Ok(self.tables.lock().await.notification_settings.get(email).cloned())
    }

    async fn save_notification_settings(&self, settings: &NotificationSettings) -> Result<NotificationSettings> {
        let mut tables = self.tables.lock().await;
        let stored = tables
            .notification_settings
            .entry(settings.student_email.clone())
            .or_insert_with(|| settings.clone());
        let id = stored.id;
        *stored = NotificationSettings { id, ..settings.clone() };
        Ok(stored.clone())
    }

    async fn record_pbis_transaction(&self, transaction: NewPbisTransaction, now: DateTime<Utc>) -> Result<PbisTransaction> {
        let record = transaction.into_record(Uuid::new_v4(), now);
        self.tables.lock().await.pbis_transactions.push(record.clone());
        Ok(record)
    }

    async fn list_pbis_transactions(&self, email: &str) -> Result<Vec<PbisTransaction>> {
        let tables = self.tables.lock().await;
        Ok(tables
            .pbis_transactions
            .iter()
            .rev()
            .filter(|t| t.student_email == email)
            .cloned()
            .collect())
    }

    async fn upsert_monthly_report(&self, report: &MonthlyReport) -> Result<MonthlyReport> {
        let mut tables = self.tables.lock().await;
        let id = tables.reports.get(&report.month).map_or(report.id, |existing| existing.id);
        let stored = MonthlyReport { id, ..report.clone() };
        tables.reports.insert(report.month.clone(), stored.clone());
        Ok(stored)
    }

    async fn find_monthly_report(&self, month: &str) -> Result<Option<MonthlyReport>> {
        Ok(self.tables.lock().await.reports.get(month).cloned())
    }

    async fn list_monthly_reports(&self) -> Result<Vec<MonthlyReport>> {
        let mut reports: Vec<MonthlyReport> = self.tables.lock().await.reports.values().cloned().collect();
        reports.sort_by(|a, b| b.month.cmp(&a.month));
        Ok(reports)
    }

    async fn create_scheduled_message(&self, request: CreateScheduledMessageRequest, now: DateTime<Utc>) -> Result<ScheduledMessage> {
        let message = request.into_record(Uuid::new_v4(), now);
        self.tables.lock().await.messages.push(message.clone());
        Ok(message)
    }

    async fn find_scheduled_message(&self, id: Uuid) -> Result<Option<ScheduledMessage>> {
        Ok(self.tables.lock().await.messages.iter().find(|m| m.id == id).cloned())
    }

    async fn list_due_messages(&self, now: DateTime<Utc>) -> Result<Vec<ScheduledMessage>> {
        let tables = self.tables.lock().await;
        let mut due: Vec<ScheduledMessage> = tables
            .messages
            .iter()
            .filter(|m| m.status == MessageStatus::Scheduled && m.scheduled_date <= now)
            .cloned()
            .collect();
        due.sort_by(|a, b| a.scheduled_date.cmp(&b.scheduled_date));
        Ok(due)
    }

    async fn claim_message(&self, id: Uuid) -> Result<bool> {
        let mut tables = self.tables.lock().await;
        let message = tables.message_mut(id)?;
        if message.status != MessageStatus::Scheduled {
            return Ok(false);
        }
        message.status = MessageStatus::Sending;
        Ok(true)
    }

    async fn mark_message_sent(&self, id: Uuid, sent_at: DateTime<Utc>) -> Result<()> {
        let mut tables = self.tables.lock().await;
        let message = tables.claimed_message_mut(id)?;
        message.status = MessageStatus::Sent;
        message.sent_at = Some(sent_at);
        message.error = None;
        Ok(())
    }

    async fn mark_message_failed(&self, id: Uuid, error: &str) -> Result<()> {
        let mut tables = self.tables.lock().await;
        let message = tables.claimed_message_mut(id)?;
        message.status = MessageStatus::Failed;
        message.error = Some(error.to_string());
        Ok(())
    }

    async fn create_attendance(&self, record: DailyAttendance) -> Result<DailyAttendance> {
        let mut tables = self.tables.lock().await;
        let duplicate = tables
            .attendance
            .iter()
            .any(|a| a.student_email == record.student_email && a.check_in_date == record.check_in_date);
        if duplicate {
            return Err(TeachersPetError::Conflict(format!(
                "{} already checked in on {}",
                record.student_email, record.check_in_date
            )));
        }
        tables.attendance.push(record.clone());
        Ok(record)
    }

    async fn find_attendance(&self, email: &str, date: NaiveDate) -> Result<Option<DailyAttendance>> {
        let tables = self.tables.lock().await;
        Ok(tables
            .attendance
            .iter()
            .find(|a| a.student_email == email && a.check_in_date == date)
            .cloned())
    }

    async fn list_attendance_for_date(&self, date: NaiveDate) -> Result<Vec<DailyAttendance>> {
        let tables = self.tables.lock().await;
        let mut records: Vec<DailyAttendance> =
            tables.attendance.iter().filter(|a| a.check_in_date == date).cloned().collect();
        records.sort_by(|a, b| a.check_in_time.cmp(&b.check_in_time));
        Ok(records)
    }

    async fn upsert_parent_preference(&self, preference: &ParentContactPreference) -> Result<ParentContactPreference> {
        let mut tables = self.tables.lock().await;
        let stored = tables
            .parent_preferences
            .entry(preference.student_email.clone())
            .or_insert_with(|| preference.clone());
        let (id, created_at, last_absence_notice) = (stored.id, stored.created_at, stored.last_absence_notice);
        *stored = ParentContactPreference {
            id,
            created_at,
            last_absence_notice,
            ..preference.clone()
        };
        Ok(stored.clone())
    }

    async fn find_parent_preference(&self, student_email: &str) -> Result<Option<ParentContactPreference>> {
        Ok(self.tables.lock().await.parent_preferences.get(student_email).cloned())
    }

    async fn list_parent_preferences(&self) -> Result<Vec<ParentContactPreference>> {
        let mut preferences: Vec<ParentContactPreference> =
            self.tables.lock().await.parent_preferences.values().cloned().collect();
        preferences.sort_by(|a, b| a.student_email.cmp(&b.student_email));
        Ok(preferences)
    }

    async fn claim_absence_notice(&self, id: Uuid, date: NaiveDate) -> Result<bool> {
        let mut tables = self.tables.lock().await;
        let preference = tables
            .parent_preferences
            .values_mut()
            .find(|p| p.id == id)
            .ok_or_else(|| TeachersPetError::not_found("parent contact preference", id))?;
        if preference.last_absence_notice.is_some_and(|last| last >= date) {
            return Ok(false);
        }
        preference.last_absence_notice = Some(date);
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use chrono::{Duration, TimeZone};

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 3, 3, 10, 0, 0).unwrap()
    }

    fn new_session(email: &str, start: DateTime<Utc>) -> NewPassSession {
        NewPassSession {
            student_name: "Ava Reyes".to_string(),
            student_email: email.to_string(),
            destination: Destination::Library,
            start_time: start,
            pre_assigned_pass_id: None,
        }
    }

    #[tokio::test]
    async fn test_one_open_session_per_student() {
        let store = MemoryStore::new();
        let first = store.create_session(new_session("ava@school.org", now()), now()).await.unwrap();
        assert_matches!(
            store.create_session(new_session("ava@school.org", now()), now()).await,
            Err(TeachersPetError::ActivePassExists { .. })
        );
        // other students are unaffected
        store.create_session(new_session("ben@school.org", now()), now()).await.unwrap();

        let closure = crate::pass::lifecycle::auto_close(&first, now() + Duration::minutes(95)).unwrap();
        store.close_session(first.id, closure.clone()).await.unwrap();
        assert_matches!(
            store.close_session(first.id, closure).await,
            Err(TeachersPetError::InvalidStateTransition { .. })
        );
        store.create_session(new_session("ava@school.org", now()), now()).await.unwrap();
    }

    #[tokio::test]
    async fn test_message_claimed_once() {
        let store = MemoryStore::new();
        let message = store
            .create_scheduled_message(
                CreateScheduledMessageRequest {
                    student_name: "Ava Reyes".to_string(),
                    parent_email: "parent@home.org".to_string(),
                    subject: "Update".to_string(),
                    message_content: "Hello".to_string(),
                    scheduled_date: now(),
                },
                now(),
            )
            .await
            .unwrap();

        assert_matches!(
            store.mark_message_sent(message.id, now()).await,
            Err(TeachersPetError::InvalidStateTransition { .. })
        );
        assert!(store.claim_message(message.id).await.unwrap());
        assert!(!store.claim_message(message.id).await.unwrap());
        assert!(store.list_due_messages(now()).await.unwrap().is_empty());

        store.mark_message_sent(message.id, now()).await.unwrap();
        assert!(!store.claim_message(message.id).await.unwrap());
    }

    #[tokio::test]
    async fn test_absence_notice_claimed_once_per_day() {
        let store = MemoryStore::new();
        let today = now().date_naive();
        let preference = store
            .upsert_parent_preference(&ParentContactPreference {
                id: Uuid::new_v4(),
                student_name: "Ava Reyes".to_string(),
                student_email: "ava@school.edu".to_string(),
                parent_email: "parent@home.org".to_string(),
                parent_phone: None,
                notify_on_absence: true,
                notify_on_referral: true,
                notify_on_failing: true,
                notify_on_updates: false,
                preferred_contact_method: ContactMethod::Email,
                last_absence_notice: None,
                created_at: now(),
                updated_at: now(),
            })
            .await
            .unwrap();

        assert!(store.claim_absence_notice(preference.id, today).await.unwrap());
        assert!(!store.claim_absence_notice(preference.id, today).await.unwrap());
        assert!(store
            .claim_absence_notice(preference.id, today + Duration::days(1))
            .await
            .unwrap());

        // saving preferences again keeps the notice date
        let resaved = store
            .upsert_parent_preference(&ParentContactPreference {
                id: Uuid::new_v4(),
                last_absence_notice: None,
                ..preference.clone()
            })
            .await
            .unwrap();
        assert_eq!(resaved.id, preference.id);
        assert_eq!(resaved.last_absence_notice, Some(today + Duration::days(1)));
    }

    #[tokio::test]
    async fn test_upsert_user_keeps_role() {
        let store = MemoryStore::new();
        let user = store.upsert_user("t@school.org", "Ms. T", now()).await.unwrap();
        store.set_user_role(user.id, UserRole::Admin, now()).await.unwrap();
        let again = store.upsert_user("t@school.org", "Ms. T", now()).await.unwrap();
        assert_eq!(again.id, user.id);
        assert!(again.is_admin());
    }

    #[tokio::test]
    async fn test_report_upsert_keeps_first_id() {
        let store = MemoryStore::new();
        let report = MonthlyReport {
            id: Uuid::new_v4(),
            month: "2025-02".to_string(),
            total_passes: 1,
            average_duration_minutes: 4.0,
            overtime_count: 0,
            unconfirmed_returns: 0,
            destination_breakdown: Default::default(),
            pbis_points_awarded: 0,
            passes_purchased: 0,
            top_users: vec![],
            generated_at: now(),
        };
        let first = store.upsert_monthly_report(&report).await.unwrap();
        let second = store
            .upsert_monthly_report(&MonthlyReport { id: Uuid::new_v4(), total_passes: 7, ..report })
            .await
            .unwrap();
        assert_eq!(first.id, second.id);
        assert_eq!(store.list_monthly_reports().await.unwrap().len(), 1);
        assert_eq!(store.find_monthly_report("2025-02").await.unwrap().unwrap().total_passes, 7);
    }

    #[tokio::test]
    async fn test_sessions_listed_newest_first() {
        let store = MemoryStore::new();
        store.create_session(new_session("a@school.org", now()), now()).await.unwrap();
        store
            .create_session(new_session("b@school.org", now() + Duration::minutes(5)), now())
            .await
            .unwrap();
        let recent = store.list_recent_sessions(10).await.unwrap();
        assert_eq!(recent[0].student_email, "b@school.org");
        assert_eq!(store.list_recent_sessions(1).await.unwrap().len(), 1);
    }
}
