//! Authentication extractors
//!
//! `AuthUser` verifies the bearer token and loads the caller's profile;
//! `RequireAdmin` additionally insists on the admin role. `CronAuth` guards
//! the scheduler endpoints with the shared cron secret.

use axum::extract::FromRequestParts;
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;
use tracing::warn;
use crate::models::Profile;
use crate::services::auth::cron_secret_matches;
use crate::state::AppState;
use crate::utils::errors::SkiClubError;

fn bearer_token(parts: &Parts) -> Result<&str, SkiClubError> {
    let header = parts
        .headers
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| SkiClubError::Unauthorized("Missing Authorization header".to_string()))?;

    header
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .ok_or_else(|| SkiClubError::Unauthorized("Expected: Bearer <token>".to_string()))
}

/// Authenticated caller with their stored profile
#[derive(Debug, Clone)]
pub struct AuthUser(pub Profile);

impl FromRequestParts<AppState> for AuthUser {
    type Rejection = SkiClubError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let token = bearer_token(parts)?;
        let profile = state.services.auth_service.authenticate(token).await?;
        Ok(AuthUser(profile))
    }
}

/// Authenticated caller with the admin role. Rejects with 403 otherwise.
#[derive(Debug, Clone)]
pub struct RequireAdmin(pub Profile);

impl FromRequestParts<AppState> for RequireAdmin {
    type Rejection = SkiClubError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let AuthUser(profile) = AuthUser::from_request_parts(parts, state).await?;
        if !profile.is_admin() {
            warn!(profile_id = %profile.id, path = %parts.uri.path(), "Admin route refused");
            return Err(SkiClubError::PermissionDenied("Admin role required".to_string()));
        }
        Ok(RequireAdmin(profile))
    }
}

/// Request from the external scheduler carrying the cron secret
#[derive(Debug, Clone, Copy)]
pub struct CronAuth;

impl FromRequestParts<AppState> for CronAuth {
    type Rejection = SkiClubError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let token = bearer_token(parts)?;
        if !cron_secret_matches(&state.settings.auth.cron_secret, token) {
            warn!(path = %parts.uri.path(), "Cron request with wrong secret");
            return Err(SkiClubError::Unauthorized("Invalid cron secret".to_string()));
        }
        Ok(CronAuth)
    }
}
