//! Index of passes currently out of the room
//!
//! At most one entry exists per student email. Starting a pass first takes a
//! [`Reservation`]; while it is held no other start for that student can
//! proceed, and dropping it without committing frees the slot again. A
//! committed entry owns the pass's timer, so removing the entry stops the
//! timer.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use crate::models::PassSession;
use crate::pass::PassTimer;
use crate::utils::errors::{Result, TeachersPetError};

#[derive(Debug)]
pub struct ActivePass {
    pub session: PassSession,
    timer: Option<PassTimer>,
}

impl ActivePass {
    pub fn has_timer(&self) -> bool {
        self.timer.is_some()
    }
}

#[derive(Debug)]
enum Slot {
    Reserved,
    Active(ActivePass),
}

type Slots = Arc<Mutex<HashMap<String, Slot>>>;

fn lock(slots: &Slots) -> MutexGuard<'_, HashMap<String, Slot>> {
    slots.lock().unwrap_or_else(|e| e.into_inner())
}

#[derive(Debug, Clone, Default)]
pub struct ActivePassIndex {
    slots: Slots,
}

impl ActivePassIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Claim the student's slot, failing if a pass is open or being started
    pub fn reserve(&self, email: &str) -> Result<Reservation> {
        let mut slots = lock(&self.slots);
        if slots.contains_key(email) {
            return Err(TeachersPetError::ActivePassExists { student: email.to_string() });
        }
        slots.insert(email.to_string(), Slot::Reserved);
        Ok(Reservation {
            slots: self.slots.clone(),
            email: email.to_string(),
            committed: false,
        })
    }

    /// Track a pass found in the store at startup; an occupied slot is left alone
    pub fn restore(&self, session: PassSession, timer: Option<PassTimer>) -> bool {
        let mut slots = lock(&self.slots);
        if slots.contains_key(&session.student_email) {
            return false;
        }
        slots.insert(session.student_email.clone(), Slot::Active(ActivePass { session, timer }));
        true
    }

    /// Stop tracking the student's pass and cancel its timer
    pub fn remove(&self, email: &str) -> Option<PassSession> {
        let mut slots = lock(&self.slots);
        match slots.get(email) {
            Some(Slot::Active(_)) => match slots.remove(email) {
                Some(Slot::Active(active)) => {
                    if let Some(timer) = &active.timer {
                        timer.cancel();
                    }
                    Some(active.session)
                }
                _ => None,
            },
            _ => None,
        }
    }

    pub fn get(&self, email: &str) -> Option<PassSession> {
        match lock(&self.slots).get(email) {
            Some(Slot::Active(active)) => Some(active.session.clone()),
            _ => None,
        }
    }

    pub fn is_reserved(&self, email: &str) -> bool {
        matches!(lock(&self.slots).get(email), Some(Slot::Reserved))
    }

    pub fn has_timer(&self, email: &str) -> bool {
        matches!(lock(&self.slots).get(email), Some(Slot::Active(active)) if active.has_timer())
    }

    /// Open passes, oldest first
    pub fn sessions(&self) -> Vec<PassSession> {
        let mut sessions: Vec<PassSession> = lock(&self.slots)
            .values()
            .filter_map(|slot| match slot {
                Slot::Active(active) => Some(active.session.clone()),
                Slot::Reserved => None,
            })
            .collect();
        sessions.sort_by(|a, b| a.start_time.cmp(&b.start_time));
        sessions
    }

    pub fn len(&self) -> usize {
        lock(&self.slots)
            .values()
            .filter(|slot| matches!(slot, Slot::Active(_)))
            .count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Exclusive claim on one student's slot
#[derive(Debug)]
pub struct Reservation {
    slots: Slots,
    email: String,
    committed: bool,
}

impl Reservation {
    pub fn email(&self) -> &str {
        &self.email
    }

    /// Turn the reservation into an active entry
    pub fn commit(mut self, session: PassSession, timer: Option<PassTimer>) {
        let mut slots = lock(&self.slots);
        slots.insert(self.email.clone(), Slot::Active(ActivePass { session, timer }));
        self.committed = true;
    }
}

impl Drop for Reservation {
    fn drop(&mut self) {
        if self.committed {
            return;
        }
        let mut slots = lock(&self.slots);
        if matches!(slots.get(&self.email), Some(Slot::Reserved)) {
            slots.remove(&self.email);
        }
    }
}
