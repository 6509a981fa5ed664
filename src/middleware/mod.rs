//! Middleware module
//!
//! Request extractors for identity, per-user rate limiting and request logging

pub mod auth;
pub mod logging;
pub mod rate_limit;

// Re-export commonly used middleware
pub use auth::{AuthContext, TeacherContext};
pub use logging::log_requests;
pub use rate_limit::KeyedLimiter;
