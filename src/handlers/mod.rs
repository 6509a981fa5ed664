//! HTTP handlers module
//!
//! Routes are grouped by audience:
//! - student routes for the pass workflow and allowance
//! - teacher routes for monitoring, PBIS and pre-assigned passes
//! - attendance check-in for students, roster and absence alerts for teachers
//! - reports, scheduled messages and the writing assistant (teachers only)

pub mod assistant;
pub mod attendance;
pub mod feed;
pub mod health;
pub mod reports;
pub mod scheduled;
pub mod student;
pub mod teacher;

use std::sync::Arc;

use axum::routing::{get, post, put};
use axum::{middleware, Router};
use tokio::sync::watch;

use crate::middleware::log_requests;
use crate::services::AppServices;

/// Shared handler state
#[derive(Clone)]
pub struct AppState {
    pub services: AppServices,
    shutdown: Arc<watch::Sender<bool>>,
}

impl AppState {
    pub fn new(services: AppServices) -> Self {
        let (shutdown, _) = watch::channel(false);
        Self {
            services,
            shutdown: Arc::new(shutdown),
        }
    }

    /// End long-lived responses so graceful shutdown can finish
    pub fn close_streams(&self) {
        self.shutdown.send_replace(true);
    }

    pub(crate) fn shutdown_receiver(&self) -> watch::Receiver<bool> {
        self.shutdown.subscribe()
    }
}

/// Assemble the full application router
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health))
        .nest("/api", api_routes())
        .layer(middleware::from_fn(log_requests))
        .with_state(state)
}

fn api_routes() -> Router<AppState> {
    Router::new()
        .route("/me", get(student::me))
        .route("/auth/elevate", post(student::elevate))
        .route("/student/pass-data", get(student::pass_data))
        .route("/student/passes", post(student::start_pass))
        .route("/student/passes/active", get(student::active_pass))
        .route("/student/passes/end", post(student::end_pass))
        .route("/student/purchase", post(student::purchase_pass))
        .route("/student/pre-assigned", get(student::todays_pre_assigned))
        .route(
            "/student/notification-settings",
            get(student::notification_settings).put(student::update_notification_settings),
        )
        .route("/teacher/return-code", get(teacher::return_code))
        .route("/teacher/passes/open", get(teacher::open_passes))
        .route("/teacher/passes/recent", get(teacher::recent_passes))
        .route("/teacher/passes/:id/notes", put(teacher::set_notes))
        .route("/teacher/students", get(teacher::list_students))
        .route("/teacher/students/:email/transactions", get(teacher::student_transactions))
        .route("/teacher/monthly-reset", post(teacher::monthly_reset))
        .route("/teacher/points", post(teacher::award_points))
        .route(
            "/teacher/pre-assigned",
            get(teacher::list_pre_assigned).post(teacher::create_pre_assigned),
        )
        .route("/teacher/pre-assigned/:id", put(teacher::review_pre_assigned))
        .route("/teacher/feed", get(feed::pass_feed))
        .route(
            "/reports/monthly",
            get(reports::list_reports).post(reports::generate_report),
        )
        .route("/reports/monthly/:month", get(reports::find_report))
        .route("/messages/scheduled", post(scheduled::schedule_message))
        .route("/messages/scheduled/:id", get(scheduled::find_message))
        .route("/messages/sweep", post(scheduled::sweep))
        .route("/assistant/feedback", post(assistant::grading_feedback))
        .route("/assistant/parent-message", post(assistant::parent_message))
        .route("/attendance/check-in", post(attendance::check_in))
        .route("/attendance/today", get(attendance::today))
        .route("/attendance/roster", get(attendance::roster))
        .route("/attendance/parent-preferences", put(attendance::save_parent_preference))
        .route("/attendance/parent-preferences/:email", get(attendance::parent_preference))
        .route("/attendance/notify", post(attendance::notify_absences))
}
