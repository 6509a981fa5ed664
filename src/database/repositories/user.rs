//! User repository implementation

use sqlx::PgPool;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::models::user::{User, UserRole};
use crate::utils::errors::{Result, TeachersPetError};

const USER_COLUMNS: &str = "id, email, full_name, role, created_at, updated_at";

#[derive(Clone)]
#[derive(Debug)]
pub struct UserRepository {
    pool: PgPool,
}

impl UserRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Insert on first sight, refresh the display name otherwise
    pub async fn upsert(&self, email: &str, full_name: &str, now: DateTime<Utc>) -> Result<User> {
        let user = sqlx::query_as::<_, User>(&format!(
            r#"
            INSERT INTO users (id, email, full_name, role, created_at, updated_at)
            VALUES ($1, $2, $3, 'user', $4, $4)
            ON CONFLICT (email) DO UPDATE
            SET full_name = EXCLUDED.full_name,
                updated_at = CASE WHEN users.full_name = EXCLUDED.full_name THEN users.updated_at ELSE EXCLUDED.updated_at END
            RETURNING {USER_COLUMNS}
            "#
        ))
        .bind(Uuid::new_v4())
        .bind(email)
        .bind(full_name)
        .bind(now)
        .fetch_one(&self.pool)
        .await?;

        Ok(user)
    }

    /// Find user by email
    pub async fn find_by_email(&self, email: &str) -> Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(&format!("SELECT {USER_COLUMNS} FROM users WHERE email = $1"))
            .bind(email)
            .fetch_optional(&self.pool)
            .await?;

        Ok(user)
    }

    /// Change a user's role
    pub async fn set_role(&self, id: Uuid, role: UserRole, now: DateTime<Utc>) -> Result<User> {
        sqlx::query_as::<_, User>(&format!(
            "UPDATE users SET role = $2, updated_at = $3 WHERE id = $1 RETURNING {USER_COLUMNS}"
        ))
        .bind(id)
        .bind(role.as_str())
        .bind(now)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| TeachersPetError::not_found("user", id))
    }
}
