//! Authentication service implementation
//!
//! Identity comes from an external provider as an HS256 bearer token. The
//! service verifies it, upserts the user and reads the role from the store.
//! Users become teachers by presenting the configured teacher code.

use std::sync::Arc;

use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::config::AuthConfig;
use crate::database::PassStore;
use crate::middleware::rate_limit::KeyedLimiter;
use crate::models::{User, UserRole};
use crate::utils::clock::Clock;
use crate::utils::errors::{Result, TeachersPetError};
use crate::utils::helpers::{is_valid_email, normalize_email};
use crate::utils::logging::log_admin_action;

/// Claims carried by identity-provider tokens
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    pub email: String,
    #[serde(default)]
    pub name: Option<String>,
    pub exp: i64,
}

#[derive(Clone)]
pub struct AuthService {
    store: Arc<dyn PassStore>,
    clock: Arc<dyn Clock>,
    decoding_key: DecodingKey,
    encoding_key: EncodingKey,
    teacher_code: Option<String>,
    elevation_limiter: KeyedLimiter,
}

impl AuthService {
    pub fn new(store: Arc<dyn PassStore>, clock: Arc<dyn Clock>, config: &AuthConfig) -> Self {
        Self {
            store,
            clock,
            decoding_key: DecodingKey::from_secret(config.jwt_secret.as_bytes()),
            encoding_key: EncodingKey::from_secret(config.jwt_secret.as_bytes()),
            teacher_code: config.teacher_code.clone(),
            elevation_limiter: KeyedLimiter::per_minute("elevation", config.elevation_attempts_per_minute),
        }
    }

    pub fn verify_token(&self, token: &str) -> Result<Claims> {
        let data = decode::<Claims>(token, &self.decoding_key, &Validation::new(Algorithm::HS256))?;
        Ok(data.claims)
    }

    /// Sign claims with the shared secret, for development tooling and tests
    pub fn issue_token(&self, claims: &Claims) -> Result<String> {
        Ok(encode(&Header::new(Algorithm::HS256), claims, &self.encoding_key)?)
    }

    /// Resolve a bearer token to a stored user, creating the user on first sight
    pub async fn authenticate(&self, token: &str) -> Result<User> {
        let claims = self.verify_token(token)?;
        let email = normalize_email(&claims.email);
        if !is_valid_email(&email) {
            return Err(TeachersPetError::Authentication(format!("Token email is invalid: {}", claims.email)));
        }

        let full_name = claims
            .name
            .as_deref()
            .map(str::trim)
            .filter(|n| !n.is_empty())
            .map(str::to_string)
            .unwrap_or_else(|| email.split('@').next().unwrap_or_default().to_string());

        let user = self.store.upsert_user(&email, &full_name, self.clock.now()).await?;
        debug!(user = %user.email, role = %user.role, subject = %claims.sub, "Authenticated");
        Ok(user)
    }

    /// Grant the teacher role to `user` when `code` matches the configured secret
    pub async fn elevate(&self, user: &User, code: &str) -> Result<User> {
        self.elevation_limiter.check(&user.email)?;

        let expected = self
            .teacher_code
            .as_deref()
            .ok_or_else(|| TeachersPetError::Config("Teacher code is not configured".to_string()))?;

        if code.trim() != expected {
            warn!(user = %user.email, "Rejected teacher code");
            return Err(TeachersPetError::InvalidInput("Invalid teacher code".to_string()));
        }

        if user.role == UserRole::Admin {
            return Ok(user.clone());
        }

        let updated = self.store.set_user_role(user.id, UserRole::Admin, self.clock.now()).await?;
        log_admin_action(&updated.email, "role_elevated", Some(updated.email.as_str()), None);
        info!(user = %updated.email, "User elevated to teacher");
        Ok(updated)
    }

    /// Require the teacher role
    pub fn require_teacher(&self, user: &User) -> Result<()> {
        if user.is_admin() {
            Ok(())
        } else {
            warn!(user = %user.email, "Teacher route denied");
            Err(TeachersPetError::PermissionDenied("Teacher access required".to_string()))
        }
    }

    pub fn cleanup_limiters(&self) {
        self.elevation_limiter.cleanup();
    }
}
