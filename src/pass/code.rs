//! Rotating return codes
//!
//! A return code is a 4-digit string derived from the school's local
//! hour and two-minute window. It is a classroom deterrent against guessing,
//! not a security control: anyone who knows the formula can compute it.

use chrono::{DateTime, FixedOffset, TimeZone, Timelike, Utc};
use serde::{Deserialize, Serialize};

/// Length of one code window
pub const WINDOW_SECONDS: u32 = 120;

/// Code for the window containing `t`, in `t`'s own time zone
pub fn code_at<Tz: TimeZone>(t: &DateTime<Tz>) -> String {
    let seed = t.minute() / 2 + t.hour() * 30;
    (1000 + (seed * 1234) % 9000).to_string()
}

/// Seconds until the window containing `t` rolls over
pub fn seconds_remaining_at<Tz: TimeZone>(t: &DateTime<Tz>) -> u32 {
    WINDOW_SECONDS - ((t.minute() % 2) * 60 + t.second())
}

/// The code currently shown to the class
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReturnCode {
    pub code: String,
    pub seconds_remaining: u32,
}

/// Code generator bound to the school's time zone
#[derive(Debug, Clone, Copy)]
pub struct RotatingCodeGenerator {
    offset: FixedOffset,
}

impl RotatingCodeGenerator {
    pub fn new(offset: FixedOffset) -> Self {
        Self { offset }
    }

    pub fn code(&self, t: DateTime<Utc>) -> String {
        code_at(&t.with_timezone(&self.offset))
    }

    pub fn current(&self, t: DateTime<Utc>) -> ReturnCode {
        let local = t.with_timezone(&self.offset);
        ReturnCode {
            code: code_at(&local),
            seconds_remaining: seconds_remaining_at(&local),
        }
    }

    /// Accepts only the code of the window containing `t`
    pub fn verify(&self, entered: &str, t: DateTime<Utc>) -> bool {
        entered == self.code(t)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use proptest::prelude::*;

    fn at(h: u32, m: u32, s: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 3, 3, h, m, s).unwrap()
    }

    #[test]
    fn test_known_codes() {
        // seed = 10 * 30 + 0 = 300; 300 * 1234 % 9000 = 1200
        assert_eq!(code_at(&at(10, 0, 0)), "2200");
        // seed = 301; 371434 % 9000 = 2434
        assert_eq!(code_at(&at(10, 2, 0)), "3434");
        assert_eq!(code_at(&at(0, 0, 0)), "1000");
    }

    #[test]
    fn test_codes_are_four_digits() {
        let mut t = at(0, 0, 0);
        for _ in 0..720 {
            let code = code_at(&t);
            assert_eq!(code.len(), 4);
            assert!(code.chars().all(|c| c.is_ascii_digit()));
            t += Duration::minutes(2);
        }
    }

    #[test]
    fn test_window_boundary_rejects_previous_code() {
        let generator = RotatingCodeGenerator::new(FixedOffset::east_opt(0).unwrap());
        let last_second = at(10, 1, 59);
        let rollover = at(10, 2, 0);
        let code = generator.code(last_second);

        assert!(generator.verify(&code, last_second));
        assert!(!generator.verify(&code, rollover));
    }

    #[test]
    fn test_seconds_remaining() {
        assert_eq!(seconds_remaining_at(&at(10, 0, 0)), 120);
        assert_eq!(seconds_remaining_at(&at(10, 1, 59)), 1);
        assert_eq!(seconds_remaining_at(&at(10, 3, 30)), 30);
    }

    #[test]
    fn test_generator_uses_school_offset() {
        // 15:00 UTC is 10:00 at UTC-5
        let generator = RotatingCodeGenerator::new(FixedOffset::west_opt(5 * 3600).unwrap());
        assert_eq!(generator.code(at(15, 0, 0)), "2200");
        assert_eq!(generator.current(at(15, 1, 0)).seconds_remaining, 60);
    }

    #[test]
    fn test_midnight_rollover_changes_code() {
        assert_ne!(code_at(&at(23, 59, 59)), code_at(&at(0, 0, 0)));
    }

    proptest! {
        #[test]
        fn same_window_same_code(window in 0u32..720, a in 0u32..120, b in 0u32..120) {
            let base = at(0, 0, 0) + Duration::seconds(i64::from(window * WINDOW_SECONDS));
            let t1 = base + Duration::seconds(i64::from(a));
            let t2 = base + Duration::seconds(i64::from(b));
            prop_assert_eq!(code_at(&t1), code_at(&t2));
        }

        #[test]
        fn adjacent_windows_differ(window in 0u32..719) {
            let base = at(0, 0, 0) + Duration::seconds(i64::from(window * WINDOW_SECONDS));
            let next = base + Duration::seconds(i64::from(WINDOW_SECONDS));
            prop_assert_ne!(code_at(&base), code_at(&next));
        }
    }
}
