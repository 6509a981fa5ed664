//! Daily attendance and parent absence alerts
//!
//! Students check in once per school day by answering the daily question.
//! Teachers read the roster and send absence alerts to parents who asked
//! for them. An alert goes out at most once per student per day.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::NaiveDate;
use tracing::{debug, info};
use uuid::Uuid;

use crate::config::Settings;
use crate::database::PassStore;
use crate::models::*;
use crate::utils::clock::Clock;
use crate::utils::errors::{Result, TeachersPetError};
use crate::utils::helpers::{is_valid_email, local_date, normalize_email, truncate_text};
use crate::utils::logging::{log_admin_action, log_api_error};

use super::email::EmailService;

/// Longest answer kept on a check-in
pub const MAX_ANSWER_LENGTH: usize = 500;

#[derive(Clone)]
pub struct AttendanceService {
    store: Arc<dyn PassStore>,
    clock: Arc<dyn Clock>,
    email: EmailService,
    settings: Settings,
}

impl AttendanceService {
    pub fn new(store: Arc<dyn PassStore>, clock: Arc<dyn Clock>, email: EmailService, settings: Settings) -> Self {
        Self {
            store,
            clock,
            email,
            settings,
        }
    }

    fn today(&self) -> NaiveDate {
        local_date(self.clock.now(), &self.settings.school_offset())
    }

    pub async fn check_in(&self, student: &User, request: CheckInRequest) -> Result<DailyAttendance> {
        let answer = request.student_answer.trim();
        if answer.is_empty() {
            return Err(TeachersPetError::InvalidInput("Please answer the question".to_string()));
        }

        let now = self.clock.now();
        let record = DailyAttendance {
            id: Uuid::new_v4(),
            student_name: student.full_name.clone(),
            student_email: student.email.clone(),
            check_in_date: self.today(),
            check_in_time: now,
            daily_question: DAILY_QUESTION.to_string(),
            student_answer: truncate_text(answer, MAX_ANSWER_LENGTH),
            status: AttendanceStatus::Present,
        };

        let record = self.store.create_attendance(record).await?;
        debug!(student = %record.student_email, date = %record.check_in_date, "Checked in");
        Ok(record)
    }

    pub async fn todays_check_in(&self, student: &User) -> Result<Option<DailyAttendance>> {
        self.store.find_attendance(&student.email, self.today()).await
    }

    /// Every known student for `date` (default today), absent unless checked in
    pub async fn roster(&self, date: Option<NaiveDate>) -> Result<AttendanceRoster> {
        let date = date.unwrap_or_else(|| self.today());
        let mut checked_in: HashMap<String, DailyAttendance> = self
            .store
            .list_attendance_for_date(date)
            .await?
            .into_iter()
            .map(|a| (a.student_email.clone(), a))
            .collect();

        let mut entries = Vec::new();
        for student in self.store.list_student_data().await? {
            let record = checked_in.remove(&student.student_email);
            entries.push(roster_entry(student.student_name, student.student_email, record));
        }
        // check-ins from students without pass data yet
        for (email, record) in checked_in {
            entries.push(roster_entry(record.student_name.clone(), email, Some(record)));
        }
        entries.sort_by(|a, b| a.student_name.cmp(&b.student_name));

        let present = entries.iter().filter(|e| e.status == AttendanceStatus::Present).count();
        Ok(AttendanceRoster {
            date,
            present,
            absent: entries.len() - present,
            entries,
        })
    }

    pub async fn save_parent_preference(
        &self,
        teacher: &User,
        request: SaveParentPreferenceRequest,
    ) -> Result<ParentContactPreference> {
        let student_email = normalize_email(&request.student_email);
        let parent_email = normalize_email(&request.parent_email);
        if !is_valid_email(&student_email) {
            return Err(TeachersPetError::InvalidInput(format!("Invalid student email: {}", student_email)));
        }
        if !is_valid_email(&parent_email) {
            return Err(TeachersPetError::InvalidInput(format!("Invalid parent email: {}", parent_email)));
        }

        let student_name = match request.student_name.filter(|n| !n.trim().is_empty()) {
            Some(name) => name.trim().to_string(),
            None => self
                .store
                .find_student_data(&student_email)
                .await?
                .map(|d| d.student_name)
                .unwrap_or_default(),
        };

        let now = self.clock.now();
        let preference = ParentContactPreference {
            id: Uuid::new_v4(),
            student_name,
            student_email,
            parent_email,
            parent_phone: request.parent_phone.filter(|p| !p.trim().is_empty()),
            notify_on_absence: request.notify_on_absence,
            notify_on_referral: request.notify_on_referral,
            notify_on_failing: request.notify_on_failing,
            notify_on_updates: request.notify_on_updates,
            preferred_contact_method: request.preferred_contact_method,
            last_absence_notice: None,
            created_at: now,
            updated_at: now,
        };

        let saved = self.store.upsert_parent_preference(&preference).await?;
        log_admin_action(
            &teacher.email,
            "save_parent_preference",
            Some(saved.student_email.as_str()),
            Some(saved.parent_email.as_str()),
        );
        Ok(saved)
    }

    pub async fn parent_preference(&self, student_email: &str) -> Result<ParentContactPreference> {
        let email = normalize_email(student_email);
        self.store
            .find_parent_preference(&email)
            .await?
            .ok_or_else(|| TeachersPetError::not_found("parent contact preference", email))
    }

    /// Email the parents of every student who has not checked in today
    pub async fn notify_absences(&self, teacher: &User) -> Result<AbsenceSweepSummary> {
        let date = self.today();
        let preferences = self.store.list_parent_preferences().await?;
        let present: Vec<String> = self
            .store
            .list_attendance_for_date(date)
            .await?
            .into_iter()
            .map(|a| a.student_email)
            .collect();

        let mut results = Vec::new();
        for preference in &preferences {
            if !preference.notify_on_absence || present.contains(&preference.student_email) {
                continue;
            }
            if !self.store.claim_absence_notice(preference.id, date).await? {
                debug!(student = %preference.student_email, "Absence alert already sent today");
                continue;
            }

            let subject = format!("Absence Alert: {}", preference.student_name);
            let body = absence_body(&preference.student_name, date);
            let notice = match self.email.send(&preference.parent_email, &subject, &body).await {
                Ok(()) => AbsenceNotice {
                    student_email: preference.student_email.clone(),
                    parent_email: preference.parent_email.clone(),
                    status: NoticeStatus::Sent,
                    error: None,
                },
                Err(e) => {
                    let error = e.to_string();
                    log_api_error("email", &error, Some(preference.student_email.as_str()));
                    AbsenceNotice {
                        student_email: preference.student_email.clone(),
                        parent_email: preference.parent_email.clone(),
                        status: NoticeStatus::Failed,
                        error: Some(error),
                    }
                }
            };
            results.push(notice);
        }

        let notifications_sent = results.iter().filter(|r| r.status == NoticeStatus::Sent).count();
        log_admin_action(
            &teacher.email,
            "notify_absences",
            None,
            Some(format!("{} checked, {} sent", preferences.len(), notifications_sent).as_str()),
        );
        info!(%date, checked = preferences.len(), notifications_sent, "Absence alerts finished");

        Ok(AbsenceSweepSummary {
            date,
            checked: preferences.len(),
            notifications_sent,
            results,
        })
    }
}

fn roster_entry(student_name: String, student_email: String, record: Option<DailyAttendance>) -> RosterEntry {
    match record {
        Some(record) => RosterEntry {
            student_name,
            student_email,
            status: record.status,
            check_in_time: Some(record.check_in_time),
            daily_question: Some(record.daily_question),
            student_answer: Some(record.student_answer),
        },
        None => RosterEntry {
            student_name,
            student_email,
            status: AttendanceStatus::Absent,
            check_in_time: None,
            daily_question: None,
            student_answer: None,
        },
    }
}

fn absence_body(student_name: &str, date: NaiveDate) -> String {
    format!(
        "Hello,\n\nThis is an automated notification that {} was marked absent today ({}).\n\n\
         If you have any questions, please contact the teacher.\n\nBest regards,\nTeacher's Pet Attendance System",
        student_name,
        date.format("%Y-%m-%d")
    )
}
