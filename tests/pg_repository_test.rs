//! PostgreSQL store tests
//!
//! These run only when `TEST_DATABASE_URL` points at a disposable database.

use assert_matches::assert_matches;
use chrono::{Duration, TimeZone, Utc};
use serial_test::serial;
use uuid::Uuid;

use TeachersPet::database::{create_pool, run_migrations, DatabaseConfig, PassStore, PgStore};
use TeachersPet::models::*;
use TeachersPet::TeachersPetError;

async fn pg_store() -> Option<PgStore> {
    let url = std::env::var("TEST_DATABASE_URL").ok()?;
    let config = DatabaseConfig {
        url,
        max_connections: 2,
        ..DatabaseConfig::default()
    };
    let pool = create_pool(&config).await.expect("test database should connect");
    run_migrations(&pool).await.expect("migrations should apply");
    Some(PgStore::new(pool))
}

fn unique_email(prefix: &str) -> String {
    format!("{}-{}@school.edu", prefix, Uuid::new_v4().simple())
}

fn new_session(email: &str, start: chrono::DateTime<Utc>) -> NewPassSession {
    NewPassSession {
        student_name: "Pat Doe".to_string(),
        student_email: email.to_string(),
        destination: Destination::Restroom,
        start_time: start,
        pre_assigned_pass_id: None,
    }
}

#[tokio::test]
#[serial]
async fn test_pg_one_open_session_per_student() {
    let Some(store) = pg_store().await else {
        return;
    };
    let email = unique_email("pg-open");
    let start = Utc.with_ymd_and_hms(2025, 3, 14, 10, 0, 0).unwrap();

    let session = store.create_session(new_session(&email, start), start).await.unwrap();
    assert_eq!(session.status, PassStatus::Open);

    assert_matches!(
        store.create_session(new_session(&email, start), start).await,
        Err(TeachersPetError::ActivePassExists { .. })
    );

    let open = store.find_open_session(&email).await.unwrap().unwrap();
    assert_eq!(open.id, session.id);
}

#[tokio::test]
#[serial]
async fn test_pg_user_upsert_and_role() {
    let Some(store) = pg_store().await else {
        return;
    };
    let email = unique_email("pg-user");
    let now = Utc.with_ymd_and_hms(2025, 3, 14, 10, 0, 0).unwrap();

    let created = store.upsert_user(&email, "First Name", now).await.unwrap();
    assert_eq!(created.role, UserRole::User);

    let renamed = store.upsert_user(&email, "Second Name", now + Duration::minutes(1)).await.unwrap();
    assert_eq!(renamed.id, created.id);
    assert_eq!(renamed.full_name, "Second Name");

    let admin = store.set_user_role(created.id, UserRole::Admin, now).await.unwrap();
    assert!(admin.is_admin());
    assert_eq!(store.find_user_by_email(&email).await.unwrap().unwrap().role, UserRole::Admin);
}

#[tokio::test]
#[serial]
async fn test_pg_scheduled_message_lifecycle() {
    let Some(store) = pg_store().await else {
        return;
    };
    let now = Utc.with_ymd_and_hms(2025, 3, 14, 10, 0, 0).unwrap();
    let parent = unique_email("pg-parent");

    let message = store
        .create_scheduled_message(
            CreateScheduledMessageRequest {
                student_name: "Pat Doe".to_string(),
                parent_email: parent.clone(),
                subject: "Update".to_string(),
                message_content: "All good".to_string(),
                scheduled_date: now - Duration::minutes(5),
            },
            now,
        )
        .await
        .unwrap();

    let due = store.list_due_messages(now).await.unwrap();
    assert!(due.iter().any(|m| m.id == message.id));

    // unclaimed messages cannot be finished
    assert_matches!(
        store.mark_message_sent(message.id, now).await,
        Err(TeachersPetError::InvalidStateTransition { .. })
    );
    assert!(store.claim_message(message.id).await.unwrap());
    assert!(!store.claim_message(message.id).await.unwrap());
    assert!(!store.list_due_messages(now).await.unwrap().iter().any(|m| m.id == message.id));

    store.mark_message_failed(message.id, "HTTP 500").await.unwrap();
    let failed = store.find_scheduled_message(message.id).await.unwrap().unwrap();
    assert_eq!(failed.status, MessageStatus::Failed);
    assert_eq!(failed.error.as_deref(), Some("HTTP 500"));
    assert!(!store.list_due_messages(now).await.unwrap().iter().any(|m| m.id == message.id));
}

#[tokio::test]
#[serial]
async fn test_pg_attendance_one_check_in_per_day() {
    let Some(store) = pg_store().await else {
        return;
    };
    let now = Utc.with_ymd_and_hms(2025, 3, 14, 10, 0, 0).unwrap();
    let email = unique_email("pg-attendance");
    let record = DailyAttendance {
        id: Uuid::new_v4(),
        student_name: "Pat Doe".to_string(),
        student_email: email.clone(),
        check_in_date: now.date_naive(),
        check_in_time: now,
        daily_question: DAILY_QUESTION.to_string(),
        student_answer: "Chemistry".to_string(),
        status: AttendanceStatus::Present,
    };

    store.create_attendance(record.clone()).await.unwrap();
    assert_matches!(
        store
            .create_attendance(DailyAttendance {
                id: Uuid::new_v4(),
                ..record.clone()
            })
            .await,
        Err(TeachersPetError::Conflict(_))
    );
    assert_eq!(
        store.find_attendance(&email, now.date_naive()).await.unwrap().unwrap().id,
        record.id
    );

    let preference = store
        .upsert_parent_preference(&ParentContactPreference {
            id: Uuid::new_v4(),
            student_name: "Pat Doe".to_string(),
            student_email: email,
            parent_email: unique_email("pg-guardian"),
            parent_phone: None,
            notify_on_absence: true,
            notify_on_referral: false,
            notify_on_failing: false,
            notify_on_updates: false,
            preferred_contact_method: ContactMethod::Both,
            last_absence_notice: None,
            created_at: now,
            updated_at: now,
        })
        .await
        .unwrap();
    assert!(store.claim_absence_notice(preference.id, now.date_naive()).await.unwrap());
    assert!(!store.claim_absence_notice(preference.id, now.date_naive()).await.unwrap());
}
