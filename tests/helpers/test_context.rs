//! Test context for unified test setup

use std::sync::Arc;

use axum::body::Body;
use axum::http::{Method, Request};
use axum::Router;
use chrono::{DateTime, Duration, TimeZone, Utc};
use wiremock::MockServer;

use TeachersPet::config::Settings;
use TeachersPet::database::{MemoryStore, PassStore};
use TeachersPet::models::User;
use TeachersPet::pass::RotatingCodeGenerator;
use TeachersPet::services::{AppServices, Claims};
use TeachersPet::utils::clock::{Clock, FixedClock};
use TeachersPet::{build_router, AppState};

pub const TEACHER_CODE: &str = "apple-42";

/// Friday 2025-03-14 10:00 UTC, a school-day morning
pub fn school_morning() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 3, 14, 10, 0, 0).unwrap()
}

pub fn test_settings() -> Settings {
    let mut settings = Settings::default();
    settings.database.url = "memory://".to_string();
    settings.auth.jwt_secret = "test-secret".to_string();
    settings.auth.teacher_code = Some(TEACHER_CODE.to_string());
    settings.scheduler.enabled = false;
    settings.logging.directory = String::new();
    settings
}

/// Unified test context that manages all test components
pub struct TestContext {
    pub settings: Settings,
    pub clock: Arc<FixedClock>,
    pub store: Arc<MemoryStore>,
    pub services: AppServices,
    pub state: AppState,
    pub email_server: Option<MockServer>,
    pub llm_server: Option<MockServer>,
}

impl TestContext {
    /// Context without external integrations
    pub async fn new() -> Self {
        Self::build(test_settings(), false).await
    }

    pub async fn with_settings(customize: impl FnOnce(&mut Settings)) -> Self {
        let mut settings = test_settings();
        customize(&mut settings);
        Self::build(settings, false).await
    }

    /// Context whose email and LLM endpoints point at wiremock servers
    pub async fn with_integrations() -> Self {
        Self::build(test_settings(), true).await
    }

    async fn build(mut settings: Settings, integrations: bool) -> Self {
        let _ = tracing_subscriber::fmt().with_test_writer().try_init();

        let (email_server, llm_server) = if integrations {
            let email = MockServer::start().await;
            let llm = MockServer::start().await;
            settings.integrations.email_api_url = Some(format!("{}/emails", email.uri()));
            settings.integrations.llm_api_url = Some(format!("{}/v1/chat/completions", llm.uri()));
            settings.integrations.timeout_seconds = 2;
            (Some(email), Some(llm))
        } else {
            (None, None)
        };
        settings.validate().expect("test settings should be valid");

        let clock = Arc::new(FixedClock::new(school_morning()));
        let store = Arc::new(MemoryStore::new());
        let services = AppServices::new(
            store.clone() as Arc<dyn PassStore>,
            clock.clone() as Arc<dyn Clock>,
            &settings,
        )
        .expect("services should build");
        let state = AppState::new(services.clone());

        Self {
            settings,
            clock,
            store,
            services,
            state,
            email_server,
            llm_server,
        }
    }

    pub fn router(&self) -> Router {
        build_router(self.state.clone())
    }

    /// Bearer token the identity provider would issue for this person
    pub fn token(&self, email: &str, name: &str) -> String {
        let claims = Claims {
            sub: format!("idp|{}", email),
            email: email.to_string(),
            name: Some(name.to_string()),
            // token expiry is checked against the real clock
            exp: Utc::now().timestamp() + 3600,
        };
        self.services.auth.issue_token(&claims).expect("token should sign")
    }

    pub async fn student(&self, email: &str, name: &str) -> User {
        self.services
            .auth
            .authenticate(&self.token(email, name))
            .await
            .expect("student should authenticate")
    }

    pub async fn teacher(&self, email: &str, name: &str) -> User {
        let user = self.student(email, name).await;
        self.services
            .auth
            .elevate(&user, TEACHER_CODE)
            .await
            .expect("teacher code should elevate")
    }

    /// The code on the classroom display right now
    pub fn current_code(&self) -> String {
        RotatingCodeGenerator::new(self.settings.school_offset()).code(self.clock.now())
    }

    pub fn advance_minutes(&self, minutes: i64) {
        self.clock.advance(Duration::minutes(minutes));
    }

    pub fn advance_seconds(&self, seconds: i64) {
        self.clock.advance(Duration::seconds(seconds));
    }

    pub fn request(&self, method: Method, uri: &str, token: Option<&str>, body: Option<serde_json::Value>) -> Request<Body> {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header("authorization", format!("Bearer {}", token));
        }
        match body {
            Some(json) => builder
                .header("content-type", "application/json")
                .body(Body::from(json.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        }
    }
}

/// Collect a response body as JSON
pub async fn body_json(response: axum::response::Response) -> serde_json::Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body should read");
    serde_json::from_slice(&bytes).expect("body should be JSON")
}
