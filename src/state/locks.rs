//! Per-student serialization of ledger updates

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};

/// One async lock per student email; read-modify-write of a student's
/// counters happens under it
#[derive(Debug, Clone, Default)]
pub struct StudentLocks {
    locks: Arc<Mutex<HashMap<String, Arc<AsyncMutex<()>>>>>,
}

impl StudentLocks {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn lock(&self, email: &str) -> OwnedMutexGuard<()> {
        let lock = {
            let mut locks = self.locks.lock().unwrap_or_else(|e| e.into_inner());
            locks.entry(email.to_string()).or_default().clone()
        };
        lock.lock_owned().await
    }
}
