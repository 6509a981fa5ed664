//! Teacher's Pet
//!
//! Hall-pass tracking backend for classrooms. Students start and end passes
//! against a monthly allowance and a rotating return code; teachers watch
//! open passes live, award PBIS points, pre-assign passes and generate
//! monthly usage reports.

#![allow(non_snake_case)]

pub mod config;
pub mod database;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod pass;
pub mod services;
pub mod state;
pub mod utils;

// Re-export commonly used types
pub use config::Settings;
pub use utils::errors::{Result, TeachersPetError};

// Re-export main components for easy access
pub use database::{open_store, MemoryStore, PassStore, PgStore};
pub use handlers::{build_router, AppState};
pub use services::{AppServices, Scheduler};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Library name
pub const NAME: &str = env!("CARGO_PKG_NAME");

/// Get library information
pub fn info() -> String {
    format!("{} v{}", NAME, VERSION)
}
