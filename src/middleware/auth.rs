//! Authentication extractors
//!
//! `AuthContext` resolves the bearer token on a request to a stored user.
//! `TeacherContext` additionally requires the teacher role and rejects
//! everyone else with 403.

use axum::extract::FromRequestParts;
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;

use crate::handlers::AppState;
use crate::models::User;
use crate::utils::errors::{Result, TeachersPetError};

/// Any authenticated user
#[derive(Debug, Clone)]
pub struct AuthContext(pub User);

/// An authenticated user holding the teacher role
#[derive(Debug, Clone)]
pub struct TeacherContext(pub User);

fn bearer_token(parts: &Parts) -> Result<String> {
    let value = parts
        .headers
        .get(AUTHORIZATION)
        .ok_or_else(|| TeachersPetError::Authentication("Missing authorization header".to_string()))?
        .to_str()
        .map_err(|_| TeachersPetError::Authentication("Malformed authorization header".to_string()))?;

    match value.split_once(' ') {
        Some((scheme, token)) if scheme.eq_ignore_ascii_case("bearer") && !token.trim().is_empty() => {
            Ok(token.trim().to_string())
        }
        _ => Err(TeachersPetError::Authentication("Expected a bearer token".to_string())),
    }
}

#[axum::async_trait]
impl FromRequestParts<AppState> for AuthContext {
    type Rejection = TeachersPetError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self> {
        // both extractors on one request authenticate once
        if let Some(user) = parts.extensions.get::<User>() {
            return Ok(Self(user.clone()));
        }

        let token = bearer_token(parts)?;
        let user = state.services.auth.authenticate(&token).await?;
        parts.extensions.insert(user.clone());
        Ok(Self(user))
    }
}

#[axum::async_trait]
impl FromRequestParts<AppState> for TeacherContext {
    type Rejection = TeachersPetError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self> {
        let AuthContext(user) = AuthContext::from_request_parts(parts, state).await?;
        state.services.auth.require_teacher(&user)?;
        Ok(Self(user))
    }
}
