//! Student allowance service
//!
//! This service owns the allowance ledger, PBIS points, the monthly reset,
//! notification preferences and the pre-assigned pass workflow.

use std::sync::Arc;

use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::config::Settings;
use crate::database::PassStore;
use crate::models::*;
use crate::pass::ledger;
use crate::state::StudentLocks;
use crate::utils::clock::Clock;
use crate::utils::errors::{Result, TeachersPetError};
use crate::utils::helpers::{is_valid_email, local_date, normalize_email};
use crate::utils::logging::{log_admin_action, log_allowance_change};

/// Student service for allowance and PBIS operations
#[derive(Clone)]
pub struct StudentService {
    store: Arc<dyn PassStore>,
    clock: Arc<dyn Clock>,
    locks: StudentLocks,
    settings: Settings,
}

impl StudentService {
    pub fn new(store: Arc<dyn PassStore>, clock: Arc<dyn Clock>, locks: StudentLocks, settings: Settings) -> Self {
        Self {
            store,
            clock,
            locks,
            settings,
        }
    }

    pub fn summarize(data: StudentPassData) -> PassDataSummary {
        PassDataSummary {
            remaining_passes: ledger::remaining(&data),
            total_allowance: ledger::total_allowance(&data),
            can_purchase: ledger::can_purchase(&data),
            data,
        }
    }

    /// The student's pass data, created with the default allowance on first access
    pub async fn pass_data(&self, student: &User) -> Result<StudentPassData> {
        if let Some(data) = self.store.find_student_data(&student.email).await? {
            return Ok(data);
        }

        let now = self.clock.now();
        let request = CreateStudentPassData {
            student_name: student.full_name.clone(),
            student_email: student.email.clone(),
            monthly_pass_allowance: self.settings.school.default_monthly_allowance,
            last_reset_date: local_date(now, &self.settings.school_offset()),
        };
        let data = self.store.get_or_create_student_data(request, now).await?;
        info!(student = %student.email, allowance = data.monthly_pass_allowance, "Created student pass data");
        Ok(data)
    }

    /// Spend PBIS points on one extra pass this month
    pub async fn purchase_pass(&self, student: &User) -> Result<PassDataSummary> {
        let _guard = self.locks.lock(&student.email).await;
        let mut data = self.pass_data(student).await?;
        let now = self.clock.now();

        let transaction = ledger::apply_purchase(&mut data, now)?;
        let data = self.store.save_student_data(&data).await?;
        self.store.record_pbis_transaction(transaction, now).await?;

        log_allowance_change(&student.email, "pass_purchase", -ledger::PURCHASE_COST, data.pbis_points_balance);
        Ok(Self::summarize(data))
    }

    /// Teacher-awarded PBIS points
    pub async fn award_points(&self, teacher: &User, request: AwardPointsRequest) -> Result<PassDataSummary> {
        let email = normalize_email(&request.student_email);
        let _guard = self.locks.lock(&email).await;
        let mut data = self
            .store
            .find_student_data(&email)
            .await?
            .ok_or_else(|| TeachersPetError::not_found("student pass data", &email))?;
        let now = self.clock.now();

        let transaction = ledger::apply_award(&mut data, request.points, &request.reason, now)?;
        let data = self.store.save_student_data(&data).await?;
        self.store.record_pbis_transaction(transaction, now).await?;

        log_allowance_change(&email, "teacher_award", request.points, data.pbis_points_balance);
        log_admin_action(&teacher.email, "award_points", Some(email.as_str()), Some(request.reason.as_str()));
        Ok(Self::summarize(data))
    }

    /// Close out the month for every student
    pub async fn monthly_reset(&self, teacher: &User) -> Result<Vec<ResetOutcome>> {
        let now = self.clock.now();
        let today = local_date(now, &self.settings.school_offset());
        let students = self.store.list_student_data().await?;
        let mut outcomes = Vec::with_capacity(students.len());

        for student in students {
            let _guard = self.locks.lock(&student.student_email).await;
            // reread under the lock
            let mut data = match self.store.find_student_data(&student.student_email).await? {
                Some(data) => data,
                None => continue,
            };

            let (outcome, transaction) = ledger::apply_monthly_reset(&mut data, today, now);
            let data = self.store.save_student_data(&data).await?;
            if let Some(transaction) = transaction {
                self.store.record_pbis_transaction(transaction, now).await?;
            }
            log_allowance_change(
                &data.student_email,
                "unused_pass_trade_in",
                outcome.points_credited,
                data.pbis_points_balance,
            );
            outcomes.push(outcome);
        }

        let total: i32 = outcomes.iter().map(|o| o.points_credited).sum();
        log_admin_action(
            &teacher.email,
            "monthly_reset",
            None,
            Some(format!("{} students, {} points credited", outcomes.len(), total).as_str()),
        );
        Ok(outcomes)
    }

    pub async fn list_students(&self) -> Result<Vec<PassDataSummary>> {
        let students = self.store.list_student_data().await?;
        Ok(students.into_iter().map(Self::summarize).collect())
    }

    pub async fn transactions(&self, email: &str) -> Result<Vec<PbisTransaction>> {
        self.store.list_pbis_transactions(email).await
    }

    /// Stored preferences, or defaults when the student never saved any
    pub async fn notification_settings(&self, student: &User) -> Result<NotificationSettings> {
        if let Some(settings) = self.store.find_notification_settings(&student.email).await? {
            return Ok(settings);
        }
        Ok(NotificationSettings {
            id: Uuid::new_v4(),
            student_name: student.full_name.clone(),
            student_email: student.email.clone(),
            custom_reminder_minutes: self.settings.school.default_reminder_minutes,
            enable_push_notifications: true,
            enable_sound_alerts: true,
            updated_at: self.clock.now(),
        })
    }

    pub async fn update_notification_settings(
        &self,
        student: &User,
        request: UpdateNotificationSettingsRequest,
    ) -> Result<NotificationSettings> {
        let mut settings = self.notification_settings(student).await?;

        if let Some(minutes) = request.custom_reminder_minutes {
            if !(MIN_REMINDER_MINUTES..=MAX_REMINDER_MINUTES).contains(&minutes) {
                return Err(TeachersPetError::InvalidInput(format!(
                    "Reminder must be between {} and {} minutes",
                    MIN_REMINDER_MINUTES, MAX_REMINDER_MINUTES
                )));
            }
            settings.custom_reminder_minutes = minutes;
        }
        if let Some(push) = request.enable_push_notifications {
            settings.enable_push_notifications = push;
        }
        if let Some(sound) = request.enable_sound_alerts {
            settings.enable_sound_alerts = sound;
        }
        settings.updated_at = self.clock.now();

        debug!(student = %student.email, reminder = settings.custom_reminder_minutes, "Saving notification settings");
        self.store.save_notification_settings(&settings).await
    }

    /// Minutes before the time warning fires for this student
    pub async fn reminder_minutes(&self, email: &str) -> i32 {
        match self.store.find_notification_settings(email).await {
            Ok(Some(settings)) => settings.custom_reminder_minutes,
            Ok(None) => self.settings.school.default_reminder_minutes,
            Err(e) => {
                warn!(student = %email, error = %e, "Falling back to default reminder");
                self.settings.school.default_reminder_minutes
            }
        }
    }

    pub async fn create_pre_assigned(&self, teacher: &User, mut request: CreatePreAssignedRequest) -> Result<PreAssignedPass> {
        request.student_email = normalize_email(&request.student_email);
        if !is_valid_email(&request.student_email) {
            return Err(TeachersPetError::InvalidInput(format!("Invalid student email: {}", request.student_email)));
        }
        if request.student_name.trim().is_empty() {
            return Err(TeachersPetError::InvalidInput("Student name is required".to_string()));
        }

        let pass = self.store.create_pre_assigned(request, self.clock.now()).await?;
        log_admin_action(
            &teacher.email,
            "create_pre_assigned",
            Some(pass.student_email.as_str()),
            Some(format!("{} on {}", pass.destination, pass.scheduled_date).as_str()),
        );
        Ok(pass)
    }

    pub async fn list_pre_assigned(&self) -> Result<Vec<PreAssignedPass>> {
        self.store.list_pre_assigned().await
    }

    /// Approve or deny a pending pre-assigned pass
    pub async fn review_pre_assigned(&self, teacher: &User, id: Uuid, request: ReviewPreAssignedRequest) -> Result<PreAssignedPass> {
        let pass = self
            .store
            .find_pre_assigned(id)
            .await?
            .ok_or_else(|| TeachersPetError::not_found("pre-assigned pass", id))?;

        if !pass.status.can_review_to(request.status) {
            return Err(TeachersPetError::InvalidStateTransition {
                from: pass.status.to_string(),
                to: request.status.to_string(),
            });
        }

        let updated = self.store.update_pre_assigned_status(id, request.status, request.notes).await?;
        log_admin_action(&teacher.email, "review_pre_assigned", Some(updated.student_email.as_str()), Some(updated.status.as_str()));
        Ok(updated)
    }

    /// Approved passes scheduled for today in the school's time zone
    pub async fn todays_pre_assigned(&self, student: &User) -> Result<Vec<PreAssignedPass>> {
        let today = local_date(self.clock.now(), &self.settings.school_offset());
        let passes = self.store.list_pre_assigned_for_student(&student.email).await?;
        Ok(passes
            .into_iter()
            .filter(|p| p.status == PreAssignedStatus::Approved && p.scheduled_date == today)
            .collect())
    }
}
