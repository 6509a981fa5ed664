//! Test data generators

use std::sync::atomic::{AtomicUsize, Ordering};

use fake::faker::name::en::Name;
use fake::Fake;

static NEXT_STUDENT: AtomicUsize = AtomicUsize::new(1);

/// A unique student email with a generated display name
pub fn fake_student() -> (String, String) {
    let n = NEXT_STUDENT.fetch_add(1, Ordering::Relaxed);
    let name: String = Name().fake();
    (format!("student{}@school.edu", n), name)
}

pub fn fake_teacher() -> (String, String) {
    let n = NEXT_STUDENT.fetch_add(1, Ordering::Relaxed);
    let name: String = Name().fake();
    (format!("teacher{}@school.edu", n), format!("Mx. {}", name))
}
