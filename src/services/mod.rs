//! Services module
//!
//! This module contains business logic services

pub mod assistant;
pub mod attendance;
pub mod auth;
pub mod email;
pub mod llm;
pub mod messaging;
pub mod pass;
pub mod report;
pub mod scheduler;
pub mod student;

// Re-export commonly used services
pub use assistant::AssistantService;
pub use attendance::AttendanceService;
pub use auth::{AuthService, Claims};
pub use email::EmailService;
pub use llm::LlmService;
pub use messaging::MessagingService;
pub use pass::PassService;
pub use report::ReportService;
pub use scheduler::Scheduler;
pub use student::StudentService;

use std::sync::Arc;

use serde::Serialize;

use crate::config::Settings;
use crate::database::PassStore;
use crate::state::{ActivePassIndex, PassFeed, StudentLocks};
use crate::utils::clock::Clock;
use crate::utils::errors::Result;

/// Service container for creating and sharing all services
#[derive(Clone)]
pub struct AppServices {
    pub store: Arc<dyn PassStore>,
    pub auth: AuthService,
    pub students: StudentService,
    pub passes: PassService,
    pub reports: ReportService,
    pub messaging: MessagingService,
    pub assistant: AssistantService,
    pub attendance: AttendanceService,
    pub feed: PassFeed,
    email: EmailService,
    llm: LlmService,
}

impl AppServices {
    /// Wire every service over one store and clock
    pub fn new(store: Arc<dyn PassStore>, clock: Arc<dyn Clock>, settings: &Settings) -> Result<Self> {
        let locks = StudentLocks::new();
        let feed = PassFeed::new(settings.passes.feed_capacity);
        let email = EmailService::new(&settings.integrations)?;
        let llm = LlmService::new(&settings.integrations)?;

        let students = StudentService::new(store.clone(), clock.clone(), locks.clone(), settings.clone());
        let passes = PassService::new(
            store.clone(),
            clock.clone(),
            ActivePassIndex::new(),
            feed.clone(),
            locks,
            students.clone(),
            settings.clone(),
        );

        Ok(Self {
            auth: AuthService::new(store.clone(), clock.clone(), &settings.auth),
            reports: ReportService::new(store.clone(), clock.clone(), settings.clone()),
            messaging: MessagingService::new(store.clone(), clock.clone(), email.clone(), settings.features.clone()),
            attendance: AttendanceService::new(store.clone(), clock, email.clone(), settings.clone()),
            assistant: AssistantService::new(store.clone(), llm.clone(), settings.features.clone()),
            students,
            passes,
            feed,
            store,
            email,
            llm,
        })
    }

    /// Health check for the store and integrations
    pub async fn health_check(&self) -> ServiceHealthStatus {
        let store_healthy = match self.store.health_check().await {
            Ok(()) => true,
            Err(e) => {
                tracing::error!(error = %e, "Store health check failed");
                false
            }
        };

        ServiceHealthStatus {
            store_healthy,
            email_enabled: self.email.is_enabled(),
            llm_enabled: self.llm.is_enabled(),
            active_passes: self.passes.index().len(),
            feed_subscribers: self.feed.subscriber_count(),
        }
    }
}

/// Health status for all services
#[derive(Debug, Clone, Serialize)]
pub struct ServiceHealthStatus {
    pub store_healthy: bool,
    pub email_enabled: bool,
    pub llm_enabled: bool,
    pub active_passes: usize,
    pub feed_subscribers: usize,
}

impl ServiceHealthStatus {
    /// Only the store is critical; integrations degrade individual features
    pub fn is_healthy(&self) -> bool {
        self.store_healthy
    }

    pub fn get_issues(&self) -> Vec<String> {
        let mut issues = Vec::new();

        if !self.store_healthy {
            issues.push("Store connection failed".to_string());
        }
        if !self.email_enabled {
            issues.push("Email integration not configured".to_string());
        }
        if !self.llm_enabled {
            issues.push("LLM integration not configured".to_string());
        }

        issues
    }
}
