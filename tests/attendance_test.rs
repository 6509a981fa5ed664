//! Attendance check-in and parent absence alert tests

mod helpers;

use assert_matches::assert_matches;
use axum::http::{Method, StatusCode};
use chrono::Duration;
use helpers::*;
use serde_json::json;
use tower::ServiceExt;
use wiremock::matchers::{body_partial_json, method, path};
use wiremock::{Mock, ResponseTemplate};

use TeachersPet::models::*;
use TeachersPet::TeachersPetError;

fn preference(student_email: &str, student_name: &str, parent_email: &str) -> SaveParentPreferenceRequest {
    SaveParentPreferenceRequest {
        student_email: student_email.to_string(),
        student_name: Some(student_name.to_string()),
        parent_email: parent_email.to_string(),
        parent_phone: None,
        notify_on_absence: true,
        notify_on_referral: true,
        notify_on_failing: true,
        notify_on_updates: false,
        preferred_contact_method: ContactMethod::Email,
    }
}

fn answer(text: &str) -> CheckInRequest {
    CheckInRequest {
        student_answer: text.to_string(),
    }
}

#[tokio::test]
async fn test_check_in_once_per_day() {
    let ctx = TestContext::new().await;
    let student = ctx.student("ava@school.edu", "Ava Reyes").await;

    assert!(ctx.services.attendance.todays_check_in(&student).await.unwrap().is_none());

    let record = ctx
        .services
        .attendance
        .check_in(&student, answer("  Robotics club  "))
        .await
        .unwrap();
    assert_eq!(record.status, AttendanceStatus::Present);
    assert_eq!(record.student_answer, "Robotics club");
    assert_eq!(record.daily_question, DAILY_QUESTION);
    assert_eq!(record.check_in_date, school_morning().date_naive());

    assert_matches!(
        ctx.services.attendance.check_in(&student, answer("Again")).await,
        Err(TeachersPetError::Conflict(_))
    );

    // the next school day starts fresh
    ctx.advance_minutes(24 * 60);
    assert!(ctx.services.attendance.todays_check_in(&student).await.unwrap().is_none());
    ctx.services.attendance.check_in(&student, answer("Lab day")).await.unwrap();
}

#[tokio::test]
async fn test_check_in_requires_answer() {
    let ctx = TestContext::new().await;
    let student = ctx.student("ava@school.edu", "Ava Reyes").await;

    assert_matches!(
        ctx.services.attendance.check_in(&student, answer("   ")).await,
        Err(TeachersPetError::InvalidInput(_))
    );
}

#[tokio::test]
async fn test_roster_marks_missing_students_absent() {
    let ctx = TestContext::new().await;
    let ava = ctx.student("ava@school.edu", "Ava Reyes").await;
    let ben = ctx.student("ben@school.edu", "Ben Ortiz").await;
    ctx.services.students.pass_data(&ava).await.unwrap();
    ctx.services.students.pass_data(&ben).await.unwrap();

    ctx.services.attendance.check_in(&ava, answer("Reading")).await.unwrap();

    let roster = ctx.services.attendance.roster(None).await.unwrap();
    assert_eq!(roster.present, 1);
    assert_eq!(roster.absent, 1);
    assert_eq!(roster.entries[0].student_email, "ava@school.edu");
    assert_eq!(roster.entries[0].status, AttendanceStatus::Present);
    assert_eq!(roster.entries[1].student_email, "ben@school.edu");
    assert_eq!(roster.entries[1].status, AttendanceStatus::Absent);
    assert!(roster.entries[1].check_in_time.is_none());

    let yesterday = school_morning().date_naive() - Duration::days(1);
    let earlier = ctx.services.attendance.roster(Some(yesterday)).await.unwrap();
    assert_eq!(earlier.present, 0);
    assert_eq!(earlier.absent, 2);
}

#[tokio::test]
async fn test_parent_preference_upsert_keeps_identity() {
    let ctx = TestContext::new().await;
    let teacher = ctx.teacher("teach@school.edu", "Ms. Park").await;

    let first = ctx
        .services
        .attendance
        .save_parent_preference(&teacher, preference(" Ava@School.edu ", "Ava Reyes", "mom@home.org"))
        .await
        .unwrap();
    assert_eq!(first.student_email, "ava@school.edu");

    let mut changed = preference("ava@school.edu", "Ava Reyes", "dad@home.org");
    changed.notify_on_absence = false;
    let second = ctx
        .services
        .attendance
        .save_parent_preference(&teacher, changed)
        .await
        .unwrap();
    assert_eq!(second.id, first.id);
    assert_eq!(second.parent_email, "dad@home.org");
    assert!(!second.notify_on_absence);

    assert_matches!(
        ctx.services
            .attendance
            .save_parent_preference(&teacher, preference("ava@school.edu", "Ava Reyes", "nope"))
            .await,
        Err(TeachersPetError::InvalidInput(_))
    );
    assert_matches!(
        ctx.services.attendance.parent_preference("nobody@school.edu").await,
        Err(TeachersPetError::NotFound { .. })
    );
}

#[tokio::test]
async fn test_absence_alerts_go_only_to_opted_in_parents_of_absent_students() {
    let ctx = TestContext::with_integrations().await;
    let teacher = ctx.teacher("teach@school.edu", "Ms. Park").await;
    let ava = ctx.student("ava@school.edu", "Ava Reyes").await;

    let attendance = &ctx.services.attendance;
    attendance
        .save_parent_preference(&teacher, preference("ava@school.edu", "Ava Reyes", "ava.parent@home.org"))
        .await
        .unwrap();
    attendance
        .save_parent_preference(&teacher, preference("ben@school.edu", "Ben Ortiz", "ben.parent@home.org"))
        .await
        .unwrap();
    let mut quiet = preference("cam@school.edu", "Cam Lee", "cam.parent@home.org");
    quiet.notify_on_absence = false;
    attendance.save_parent_preference(&teacher, quiet).await.unwrap();

    attendance.check_in(&ava, answer("Art")).await.unwrap();

    Mock::given(method("POST"))
        .and(path("/emails"))
        .and(body_partial_json(json!({
            "to": "ben.parent@home.org",
            "subject": "Absence Alert: Ben Ortiz"
        })))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(ctx.email_server.as_ref().unwrap())
        .await;

    let summary = attendance.notify_absences(&teacher).await.unwrap();
    assert_eq!(summary.checked, 3);
    assert_eq!(summary.notifications_sent, 1);
    assert_eq!(summary.results.len(), 1);
    assert_eq!(summary.results[0].student_email, "ben@school.edu");
    assert_eq!(summary.results[0].status, NoticeStatus::Sent);

    let requests = ctx.email_server.as_ref().unwrap().received_requests().await.unwrap();
    assert_eq!(requests.len(), 1);
    let body: serde_json::Value = serde_json::from_slice(&requests[0].body).unwrap();
    let text = body["text"].as_str().unwrap();
    assert!(text.contains("Ben Ortiz was marked absent today (2025-03-14)"), "{}", text);

    // a second run the same day sends nothing new
    let again = attendance.notify_absences(&teacher).await.unwrap();
    assert_eq!(again.checked, 3);
    assert_eq!(again.notifications_sent, 0);
    assert!(again.results.is_empty());
}

#[tokio::test]
async fn test_absence_alert_failure_is_reported() {
    let ctx = TestContext::with_integrations().await;
    let teacher = ctx.teacher("teach@school.edu", "Ms. Park").await;

    ctx.services
        .attendance
        .save_parent_preference(&teacher, preference("ben@school.edu", "Ben Ortiz", "ben.parent@home.org"))
        .await
        .unwrap();

    Mock::given(method("POST"))
        .and(path("/emails"))
        .respond_with(ResponseTemplate::new(503).set_body_string("try later"))
        .mount(ctx.email_server.as_ref().unwrap())
        .await;

    let summary = ctx.services.attendance.notify_absences(&teacher).await.unwrap();
    assert_eq!(summary.notifications_sent, 0);
    assert_eq!(summary.results[0].status, NoticeStatus::Failed);
    assert!(summary.results[0].error.as_deref().unwrap().contains("HTTP 503"));
}

#[tokio::test]
async fn test_attendance_routes_over_http() {
    let ctx = TestContext::new().await;
    let (email, name) = fake_student();
    let student_token = ctx.token(&email, &name);
    let (teacher_email, teacher_name) = fake_teacher();
    ctx.teacher(&teacher_email, &teacher_name).await;
    let teacher_token = ctx.token(&teacher_email, &teacher_name);
    let router = ctx.router();

    let response = router
        .clone()
        .oneshot(ctx.request(
            Method::POST,
            "/api/attendance/check-in",
            Some(&student_token),
            Some(json!({ "student_answer": "Science fair" })),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    assert_eq!(body_json(response).await["status"], "present");

    let response = router
        .clone()
        .oneshot(ctx.request(
            Method::POST,
            "/api/attendance/check-in",
            Some(&student_token),
            Some(json!({ "student_answer": "Twice" })),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CONFLICT);

    let response = router
        .clone()
        .oneshot(ctx.request(Method::GET, "/api/attendance/today", Some(&student_token), None))
        .await
        .unwrap();
    assert_eq!(body_json(response).await["student_answer"], "Science fair");

    for (method, uri) in [
        (Method::GET, "/api/attendance/roster"),
        (Method::POST, "/api/attendance/notify"),
    ] {
        let response = router
            .clone()
            .oneshot(ctx.request(method, uri, Some(&student_token), None))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::FORBIDDEN, "{}", uri);
    }

    let response = router
        .clone()
        .oneshot(ctx.request(
            Method::PUT,
            "/api/attendance/parent-preferences",
            Some(&teacher_token),
            Some(json!({ "student_email": email, "parent_email": "family@home.org" })),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let saved = body_json(response).await;
    assert_eq!(saved["notify_on_absence"], true);
    assert_eq!(saved["preferred_contact_method"], "email");

    let uri = format!("/api/attendance/parent-preferences/{}", email);
    let response = router
        .clone()
        .oneshot(ctx.request(Method::GET, &uri, Some(&teacher_token), None))
        .await
        .unwrap();
    assert_eq!(body_json(response).await["parent_email"], "family@home.org");

    let response = router
        .oneshot(ctx.request(Method::GET, "/api/attendance/roster?date=2025-03-14", Some(&teacher_token), None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["present"], 1);
}
