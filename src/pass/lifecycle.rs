//! Pass session state machine
//!
//! `NoActivePass --start--> OPEN --end(code)--> CLOSED | RETURN_UNCONFIRMED`
//! and `OPEN --auto-close--> AUTO_CLOSED`. Terminal states never transition.

use chrono::{DateTime, NaiveDate, Utc};
use uuid::Uuid;

use crate::models::{Destination, PassSession, PassStatus, PreAssignedPass, PreAssignedStatus, StudentPassData};
use crate::utils::errors::{Result, TeachersPetError};
use crate::utils::helpers::whole_minutes_between;

use super::code::RotatingCodeGenerator;
use super::{ledger, OVERTIME_MINUTES};

/// What pays for a new pass
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PassAuthorization {
    /// Counts against the monthly allowance
    Allowance,
    /// Consumes an approved pre-assigned pass
    PreAssigned(Uuid),
}

/// Decide whether `data`'s student may start a pass and what it consumes.
///
/// A pre-assigned pass must belong to the student, be approved and be
/// scheduled for `today`; it then bypasses the allowance check and fixes the
/// destination.
pub fn authorize_start(
    data: &StudentPassData,
    pre_assigned: Option<&PreAssignedPass>,
    requested: Option<Destination>,
    today: NaiveDate,
) -> Result<(PassAuthorization, Destination)> {
    if let Some(pass) = pre_assigned {
        if pass.student_email != data.student_email {
            return Err(TeachersPetError::PermissionDenied(
                "Pre-assigned pass belongs to another student".to_string(),
            ));
        }
        if pass.status != PreAssignedStatus::Approved {
            return Err(TeachersPetError::InvalidStateTransition {
                from: pass.status.to_string(),
                to: PreAssignedStatus::Used.to_string(),
            });
        }
        if pass.scheduled_date != today {
            return Err(TeachersPetError::InvalidInput(format!(
                "Pre-assigned pass is scheduled for {}",
                pass.scheduled_date
            )));
        }
        return Ok((PassAuthorization::PreAssigned(pass.id), pass.destination));
    }

    let destination = requested
        .ok_or_else(|| TeachersPetError::InvalidInput("Destination is required".to_string()))?;

    if ledger::remaining(data) <= 0 {
        return Err(TeachersPetError::InsufficientAllowance);
    }

    Ok((PassAuthorization::Allowance, destination))
}

/// Fields written when a session leaves OPEN
#[derive(Debug, Clone, PartialEq)]
pub struct PassClosure {
    pub end_time: DateTime<Utc>,
    pub duration_minutes: i32,
    pub overtime: bool,
    pub status: PassStatus,
    pub return_code_entered: Option<String>,
    pub return_code_validated: bool,
}

impl PassClosure {
    pub fn apply(self, session: &mut PassSession) {
        session.end_time = Some(self.end_time);
        session.duration_minutes = Some(self.duration_minutes);
        session.overtime = self.overtime;
        session.status = self.status;
        session.return_code_entered = self.return_code_entered;
        session.return_code_validated = self.return_code_validated;
    }
}

pub fn is_overtime(duration_minutes: i64) -> bool {
    duration_minutes >= OVERTIME_MINUTES
}

fn ensure_open(session: &PassSession, to: PassStatus) -> Result<()> {
    if session.status.is_terminal() {
        return Err(TeachersPetError::InvalidStateTransition {
            from: session.status.to_string(),
            to: to.to_string(),
        });
    }
    Ok(())
}

fn duration_at(session: &PassSession, now: DateTime<Utc>) -> i64 {
    whole_minutes_between(session.start_time, now)
}

/// End an open pass with the code the student entered.
///
/// Only the code of the window containing `now` is accepted; a wrong code
/// still ends the pass, as RETURN_UNCONFIRMED, for teacher follow-up.
pub fn end_with_code(
    session: &PassSession,
    entered: &str,
    generator: &RotatingCodeGenerator,
    now: DateTime<Utc>,
) -> Result<PassClosure> {
    let validated = generator.verify(entered, now);
    let status = if validated { PassStatus::Closed } else { PassStatus::ReturnUnconfirmed };
    ensure_open(session, status)?;

    let duration = duration_at(session, now);
    Ok(PassClosure {
        end_time: now,
        duration_minutes: duration as i32,
        overtime: is_overtime(duration),
        status,
        return_code_entered: Some(entered.to_string()),
        return_code_validated: validated,
    })
}

/// Close a pass the student never ended
pub fn auto_close(session: &PassSession, now: DateTime<Utc>) -> Result<PassClosure> {
    ensure_open(session, PassStatus::AutoClosed)?;

    let duration = duration_at(session, now);
    Ok(PassClosure {
        end_time: now,
        duration_minutes: duration as i32,
        overtime: is_overtime(duration),
        status: PassStatus::AutoClosed,
        return_code_entered: None,
        return_code_validated: false,
    })
}

/// Whether an open pass has outlived the auto-close threshold
pub fn is_stale(session: &PassSession, now: DateTime<Utc>, after_minutes: i64) -> bool {
    session.status == PassStatus::Open && duration_at(session, now) >= after_minutes
}
