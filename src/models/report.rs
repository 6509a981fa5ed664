//! Monthly report model

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use chrono::{DateTime, Utc};
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TopUser {
    pub name: String,
    pub count: i64,
}

/// Aggregated statistics for one calendar month, keyed by `YYYY-MM`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct MonthlyReport {
    pub id: Uuid,
    pub month: String,
    pub total_passes: i64,
    pub average_duration_minutes: f64,
    pub overtime_count: i64,
    pub unconfirmed_returns: i64,
    #[sqlx(json)]
    pub destination_breakdown: BTreeMap<String, i64>,
    pub pbis_points_awarded: i64,
    pub passes_purchased: i64,
    #[sqlx(json)]
    pub top_users: Vec<TopUser>,
    pub generated_at: DateTime<Utc>,
}
