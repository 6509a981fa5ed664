//! Monthly pass usage aggregation

use std::collections::BTreeMap;

use chrono::{DateTime, FixedOffset, NaiveDate, Utc};
use uuid::Uuid;

use crate::models::{MonthlyReport, PassSession, PassStatus, StudentPassData, TopUser};
use crate::utils::helpers::{local_date, month_start, next_month, previous_month, round2};

use super::ledger::POINTS_PER_UNUSED_PASS;

const TOP_USER_LIMIT: usize = 10;

/// One calendar month in the school's local time, half-open
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReportWindow {
    pub first_day: NaiveDate,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl ReportWindow {
    pub fn for_month(first_day: NaiveDate, offset: &FixedOffset) -> Self {
        Self {
            first_day,
            start: month_start(first_day, offset),
            end: month_start(next_month(first_day), offset),
        }
    }

    /// The month before the one containing `now`
    pub fn previous_month(now: DateTime<Utc>, offset: &FixedOffset) -> Self {
        Self::for_month(previous_month(local_date(now, offset)), offset)
    }

    /// `YYYY-MM` key the report is stored under
    pub fn month_key(&self) -> String {
        self.first_day.format("%Y-%m").to_string()
    }

    pub fn contains(&self, t: DateTime<Utc>) -> bool {
        t >= self.start && t < self.end
    }
}

/// Rank students by pass count, keeping first-seen order for ties
fn top_users(sessions: &[&PassSession]) -> Vec<TopUser> {
    let mut counts: Vec<TopUser> = Vec::new();
    for session in sessions {
        match counts.iter_mut().find(|u| u.name == session.student_name) {
            Some(user) => user.count += 1,
            None => counts.push(TopUser {
                name: session.student_name.clone(),
                count: 1,
            }),
        }
    }
    // sort_by is stable
    counts.sort_by(|a, b| b.count.cmp(&a.count));
    counts.truncate(TOP_USER_LIMIT);
    counts
}

/// Summarize the sessions that started inside `window`.
///
/// `sessions` should be in fetch order (newest first); that order breaks
/// ranking ties.
pub fn aggregate(
    window: &ReportWindow,
    sessions: &[PassSession],
    students: &[StudentPassData],
    id: Uuid,
    generated_at: DateTime<Utc>,
) -> MonthlyReport {
    let in_window: Vec<&PassSession> = sessions.iter().filter(|s| window.contains(s.start_time)).collect();
    let total = in_window.len() as i64;

    let average = if total > 0 {
        let sum: i64 = in_window
            .iter()
            .map(|s| i64::from(s.duration_minutes.unwrap_or(0)))
            .sum();
        round2(sum as f64 / total as f64)
    } else {
        0.0
    };

    let mut destination_breakdown = BTreeMap::new();
    for session in &in_window {
        *destination_breakdown
            .entry(session.destination.to_string())
            .or_insert(0) += 1;
    }

    MonthlyReport {
        id,
        month: window.month_key(),
        total_passes: total,
        average_duration_minutes: average,
        overtime_count: in_window.iter().filter(|s| s.overtime).count() as i64,
        unconfirmed_returns: in_window
            .iter()
            .filter(|s| s.status == PassStatus::ReturnUnconfirmed)
            .count() as i64,
        destination_breakdown,
        pbis_points_awarded: students
            .iter()
            .map(|s| i64::from(s.unused_passes_last_month * POINTS_PER_UNUSED_PASS))
            .sum(),
        passes_purchased: students.iter().map(|s| i64::from(s.purchased_passes_this_month)).sum(),
        top_users: top_users(&in_window),
        generated_at,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};
    use crate::models::{CreateStudentPassData, Destination, NewPassSession};

    fn utc() -> FixedOffset {
        FixedOffset::east_opt(0).unwrap()
    }

    fn session(name: &str, start: DateTime<Utc>, minutes: Option<i32>, status: PassStatus) -> PassSession {
        let mut s = NewPassSession {
            student_name: name.to_string(),
            student_email: format!("{}@school.org", name.to_lowercase()),
            destination: Destination::Restroom,
            start_time: start,
            pre_assigned_pass_id: None,
        }
        .into_session(Uuid::new_v4(), start);
        s.duration_minutes = minutes;
        s.status = status;
        s.overtime = minutes.map_or(false, |m| m >= 10);
        s
    }

    fn march(day: u32, h: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 3, day, h, 0, 0).unwrap()
    }

    #[test]
    fn test_previous_month_window() {
        let window = ReportWindow::previous_month(Utc.with_ymd_and_hms(2025, 4, 2, 12, 0, 0).unwrap(), &utc());
        assert_eq!(window.month_key(), "2025-03");
        assert!(window.contains(march(1, 0)));
        assert!(window.contains(Utc.with_ymd_and_hms(2025, 3, 31, 23, 59, 59).unwrap()));
        assert!(!window.contains(Utc.with_ymd_and_hms(2025, 4, 1, 0, 0, 0).unwrap()));
        assert!(!window.contains(march(1, 0) - Duration::seconds(1)));
    }

    #[test]
    fn test_january_reports_december() {
        let window = ReportWindow::previous_month(Utc.with_ymd_and_hms(2026, 1, 15, 9, 0, 0).unwrap(), &utc());
        assert_eq!(window.month_key(), "2025-12");
    }

    #[test]
    fn test_window_follows_school_offset() {
        // 2025-04-01 03:00 UTC is still March 31st at UTC-5
        let offset = FixedOffset::west_opt(5 * 3600).unwrap();
        let window = ReportWindow::for_month(NaiveDate::from_ymd_opt(2025, 3, 1).unwrap(), &offset);
        assert!(window.contains(Utc.with_ymd_and_hms(2025, 4, 1, 3, 0, 0).unwrap()));
        assert!(!window.contains(Utc.with_ymd_and_hms(2025, 3, 1, 3, 0, 0).unwrap()));
    }

    #[test]
    fn test_aggregate_counts() {
        let window = ReportWindow::for_month(NaiveDate::from_ymd_opt(2025, 3, 1).unwrap(), &utc());
        let sessions = vec![
            session("Ava", march(20, 10), Some(12), PassStatus::Closed),
            session("Ben", march(19, 10), Some(3), PassStatus::ReturnUnconfirmed),
            session("Ava", march(18, 10), None, PassStatus::Open),
            session("Cal", Utc.with_ymd_and_hms(2025, 2, 28, 10, 0, 0).unwrap(), Some(50), PassStatus::Closed),
        ];

        let report = aggregate(&window, &sessions, &[], Uuid::new_v4(), march(31, 0));
        assert_eq!(report.month, "2025-03");
        assert_eq!(report.total_passes, 3);
        // (12 + 3 + 0) / 3
        assert_eq!(report.average_duration_minutes, 5.0);
        assert_eq!(report.overtime_count, 1);
        assert_eq!(report.unconfirmed_returns, 1);
        assert_eq!(report.destination_breakdown.get("Restroom"), Some(&3));
        assert_eq!(report.top_users[0], TopUser { name: "Ava".to_string(), count: 2 });
    }

    #[test]
    fn test_average_rounds_to_two_decimals() {
        let window = ReportWindow::for_month(NaiveDate::from_ymd_opt(2025, 3, 1).unwrap(), &utc());
        let sessions = vec![
            session("Ava", march(3, 10), Some(1), PassStatus::Closed),
            session("Ben", march(4, 10), Some(1), PassStatus::Closed),
            session("Cal", march(5, 10), Some(2), PassStatus::Closed),
        ];
        let report = aggregate(&window, &sessions, &[], Uuid::new_v4(), march(31, 0));
        assert_eq!(report.average_duration_minutes, 1.33);
    }

    #[test]
    fn test_empty_month() {
        let window = ReportWindow::for_month(NaiveDate::from_ymd_opt(2025, 3, 1).unwrap(), &utc());
        let report = aggregate(&window, &[], &[], Uuid::new_v4(), march(31, 0));
        assert_eq!(report.total_passes, 0);
        assert_eq!(report.average_duration_minutes, 0.0);
        assert!(report.top_users.is_empty());
        assert!(report.destination_breakdown.is_empty());
    }

    #[test]
    fn test_top_users_ties_keep_fetch_order_and_limit() {
        let window = ReportWindow::for_month(NaiveDate::from_ymd_opt(2025, 3, 1).unwrap(), &utc());
        let mut sessions = Vec::new();
        for (i, name) in ["Zoe", "Ann", "Max", "Kim", "Lee", "Ray", "Sue", "Tom", "Uma", "Vic", "Wes", "Xia"]
            .iter()
            .enumerate()
        {
            sessions.push(session(name, march(10, 8 + (i as u32 % 8)), Some(2), PassStatus::Closed));
        }
        sessions.push(session("Xia", march(11, 9), Some(2), PassStatus::Closed));

        let report = aggregate(&window, &sessions, &[], Uuid::new_v4(), march(31, 0));
        let names: Vec<&str> = report.top_users.iter().map(|u| u.name.as_str()).collect();
        assert_eq!(names.len(), 10);
        assert_eq!(names[0], "Xia");
        assert_eq!(&names[1..4], &["Zoe", "Ann", "Max"]);
        assert!(!names.contains(&"Wes"));
    }

    #[test]
    fn test_pbis_totals_from_students() {
        let window = ReportWindow::for_month(NaiveDate::from_ymd_opt(2025, 3, 1).unwrap(), &utc());
        let mut students = Vec::new();
        for (unused, purchased) in [(3, 1), (0, 2), (4, 0)] {
            let mut data = CreateStudentPassData {
                student_name: "S".to_string(),
                student_email: format!("s{}@school.org", unused),
                monthly_pass_allowance: 4,
                last_reset_date: NaiveDate::from_ymd_opt(2025, 3, 1).unwrap(),
            }
            .into_record(Uuid::new_v4(), march(1, 0));
            data.unused_passes_last_month = unused;
            data.purchased_passes_this_month = purchased;
            students.push(data);
        }
        let report = aggregate(&window, &[], &students, Uuid::new_v4(), march(31, 0));
        assert_eq!(report.pbis_points_awarded, 35);
        assert_eq!(report.passes_purchased, 3);
    }
}
