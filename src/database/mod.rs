//! Database module
//!
//! This module handles the store boundary and its PostgreSQL and in-memory
//! implementations

pub mod connection;
pub mod memory;
pub mod repositories;
pub mod service;
pub mod store;

use std::sync::Arc;

use crate::config::DatabaseConfig as DatabaseSettings;
use crate::utils::errors::Result;

// Re-export commonly used database components
pub use connection::{DatabasePool, DatabaseConfig, create_pool, run_migrations, health_check, is_memory_url};
pub use memory::MemoryStore;
pub use service::PgStore;
pub use store::PassStore;

/// Open the store selected by the database URL, migrating PostgreSQL first
pub async fn open_store(settings: &DatabaseSettings) -> Result<Arc<dyn PassStore>> {
    if is_memory_url(&settings.url) {
        tracing::warn!("Using in-memory store; data is lost on restart");
        return Ok(Arc::new(MemoryStore::new()));
    }

    let pool = create_pool(&DatabaseConfig::from(settings)).await?;
    run_migrations(&pool).await?;
    Ok(Arc::new(PgStore::new(pool)))
}
