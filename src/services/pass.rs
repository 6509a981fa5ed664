//! Pass service
//!
//! Orchestrates the pass lifecycle: authorization against the allowance
//! ledger, persistence, the active pass index with its timers, and the live
//! feed teachers watch.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::config::Settings;
use crate::database::PassStore;
use crate::models::*;
use crate::pass::lifecycle::{self, PassAuthorization};
use crate::pass::{ledger, PassTimer, ReturnCode, RotatingCodeGenerator, TimerThresholds};
use crate::state::{ActivePassIndex, PassEvent, PassFeed, StudentLocks};
use crate::utils::clock::Clock;
use crate::utils::errors::{Result, TeachersPetError};
use crate::utils::helpers::{format_elapsed, is_four_digit_code, local_date};
use crate::utils::logging::{log_admin_action, log_pass_event};

use super::student::StudentService;

const RECENT_LIMIT: i64 = 50;

#[derive(Clone)]
pub struct PassService {
    store: Arc<dyn PassStore>,
    clock: Arc<dyn Clock>,
    index: ActivePassIndex,
    feed: PassFeed,
    locks: StudentLocks,
    students: StudentService,
    codes: RotatingCodeGenerator,
    settings: Settings,
}

impl PassService {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        store: Arc<dyn PassStore>,
        clock: Arc<dyn Clock>,
        index: ActivePassIndex,
        feed: PassFeed,
        locks: StudentLocks,
        students: StudentService,
        settings: Settings,
    ) -> Self {
        Self {
            codes: RotatingCodeGenerator::new(settings.school_offset()),
            store,
            clock,
            index,
            feed,
            locks,
            students,
            settings,
        }
    }

    /// Code currently displayed in the classroom
    pub fn return_code(&self) -> ReturnCode {
        self.codes.current(self.clock.now())
    }

    /// Start a pass for `student`.
    ///
    /// The student's index slot is reserved for the whole operation, so a
    /// concurrent second start fails with `ActivePassExists` instead of
    /// racing.
    pub async fn start_pass(&self, student: &User, request: StartPassRequest) -> Result<PassSession> {
        let reservation = self.index.reserve(&student.email)?;
        if self.store.find_open_session(&student.email).await?.is_some() {
            return Err(TeachersPetError::ActivePassExists { student: student.email.clone() });
        }

        let _guard = self.locks.lock(&student.email).await;
        let mut data = self.students.pass_data(student).await?;
        let now = self.clock.now();

        let pre_assigned = match request.pre_assigned_id {
            Some(id) => Some(
                self.store
                    .find_pre_assigned(id)
                    .await?
                    .ok_or_else(|| TeachersPetError::not_found("pre-assigned pass", id))?,
            ),
            None => None,
        };
        let today = local_date(now, &self.settings.school_offset());
        let (authorization, destination) =
            lifecycle::authorize_start(&data, pre_assigned.as_ref(), request.destination, today)?;

        let session = self
            .store
            .create_session(
                NewPassSession {
                    student_name: student.full_name.clone(),
                    student_email: student.email.clone(),
                    destination,
                    start_time: now,
                    pre_assigned_pass_id: pre_assigned.as_ref().map(|p| p.id),
                },
                now,
            )
            .await?;

        match authorization {
            PassAuthorization::Allowance => {
                ledger::record_use(&mut data, now);
                let data = self.store.save_student_data(&data).await?;
                debug!(student = %student.email, remaining = ledger::remaining(&data), "Allowance pass used");
            }
            PassAuthorization::PreAssigned(id) => {
                self.store.mark_pre_assigned_used(id, session.id, now).await?;
            }
        }

        let reminder = self.students.reminder_minutes(&student.email).await;
        let timer = self.spawn_timer(&session, reminder);
        reservation.commit(session.clone(), Some(timer));

        log_pass_event(&student.email, &session.id.to_string(), "started", Some(session.destination.as_str()));
        self.feed.publish(PassEvent::Started { session: session.clone() });
        Ok(session)
    }

    pub async fn active_pass(&self, student: &User) -> Result<Option<PassSession>> {
        if let Some(session) = self.index.get(&student.email) {
            return Ok(Some(session));
        }
        self.store.find_open_session(&student.email).await
    }

    /// End the student's open pass with the code they read off the board
    pub async fn end_pass(&self, student: &User, code: &str) -> Result<PassSession> {
        let code = code.trim();
        if !is_four_digit_code(code) {
            return Err(TeachersPetError::InvalidInput("Return code must be 4 digits".to_string()));
        }

        let session = self.active_pass(student).await?.ok_or(TeachersPetError::NoActivePass)?;
        let now = self.clock.now();
        let closure = lifecycle::end_with_code(&session, code, &self.codes, now)?;
        let closed = self.store.close_session(session.id, closure).await?;
        self.index.remove(&student.email);

        log_pass_event(
            &student.email,
            &closed.id.to_string(),
            closed.status.as_str(),
            Some(&format!("{} minutes, overtime {}", closed.duration_minutes.unwrap_or(0), closed.overtime)),
        );
        self.feed.publish(PassEvent::Ended { session: closed.clone() });
        Ok(closed)
    }

    /// Close every open pass older than the configured threshold
    pub async fn auto_close_stale(&self) -> Result<Vec<PassSession>> {
        let now = self.clock.now();
        let after = self.settings.passes.auto_close_after_minutes;
        let mut closed = Vec::new();

        for session in self.store.list_open_sessions().await? {
            if !lifecycle::is_stale(&session, now, after) {
                continue;
            }
            let closure = lifecycle::auto_close(&session, now)?;
            match self.store.close_session(session.id, closure).await {
                Ok(updated) => {
                    self.index.remove(&updated.student_email);
                    log_pass_event(&updated.student_email, &updated.id.to_string(), "auto_closed", None);
                    self.feed.publish(PassEvent::AutoClosed { session: updated.clone() });
                    closed.push(updated);
                }
                // ended by the student since the listing
                Err(TeachersPetError::InvalidStateTransition { .. }) => continue,
                Err(e) => return Err(e),
            }
        }

        if !closed.is_empty() {
            info!(count = closed.len(), "Auto-closed stale passes");
        }
        Ok(closed)
    }

    pub async fn set_notes(&self, teacher: &User, id: Uuid, notes: &str) -> Result<PassSession> {
        let session = self.store.set_session_notes(id, notes).await?;
        log_admin_action(&teacher.email, "pass_notes", Some(session.student_email.as_str()), None);
        Ok(session)
    }

    pub async fn open_passes(&self) -> Result<Vec<PassSession>> {
        self.store.list_open_sessions().await
    }

    pub async fn recent_passes(&self, limit: Option<i64>) -> Result<Vec<PassSession>> {
        let limit = limit.unwrap_or(RECENT_LIMIT).clamp(1, 500);
        self.store.list_recent_sessions(limit).await
    }

    /// Rebuild the active pass index from the store after a restart
    pub async fn restore_active_passes(&self) -> Result<usize> {
        let mut restored = 0;
        for session in self.store.list_open_sessions().await? {
            let reminder = self.students.reminder_minutes(&session.student_email).await;
            let timer = self.spawn_timer(&session, reminder);
            if self.index.restore(session, Some(timer)) {
                restored += 1;
            }
        }
        info!(restored, "Active passes restored");
        Ok(restored)
    }

    pub fn index(&self) -> &ActivePassIndex {
        &self.index
    }

    fn spawn_timer(&self, session: &PassSession, reminder_minutes: i32) -> PassTimer {
        let warning_feed = self.feed.clone();
        let overtime_feed = self.feed.clone();
        let (warning_id, overtime_id) = (session.id, session.id);
        let warning_name = session.student_name.clone();
        let overtime_name = session.student_name.clone();

        PassTimer::start(
            session.start_time,
            self.clock.now(),
            TimerThresholds::with_reminder_minutes(reminder_minutes),
            move |elapsed| {
                debug!(session_id = %warning_id, elapsed = %format_elapsed(elapsed), "Pass time warning");
                warning_feed.publish(PassEvent::TimeWarning {
                    session_id: warning_id,
                    student_name: warning_name,
                    elapsed_seconds: elapsed,
                });
            },
            move |elapsed| {
                warn!(session_id = %overtime_id, student = %overtime_name, "Pass is overtime");
                overtime_feed.publish(PassEvent::Overtime {
                    session_id: overtime_id,
                    student_name: overtime_name,
                    elapsed_seconds: elapsed,
                });
            },
        )
    }

    pub fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }
}
