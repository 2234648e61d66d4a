//! Authentication service implementation
//!
//! Tokens are issued by the managed auth provider and signed with the shared
//! HS256 secret; this service only verifies them and maps the subject to a
//! profile. Role checks happen against the stored profile, never the token.

use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};
use uuid::Uuid;
use crate::config::settings::AuthConfig;
use crate::database::DatabaseService;
use crate::models::{Profile, Role};
use crate::utils::errors::{Result, SkiClubError};
use crate::utils::helpers::normalize_email;

/// Claims read from a provider-issued access token
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Auth user id; equals the profile id for accounts created on login
    pub sub: Uuid,
    #[serde(default)]
    pub email: Option<String>,
    pub exp: i64,
}

#[derive(Clone)]
pub struct AuthService {
    db: DatabaseService,
    decoding_key: DecodingKey,
    validation: Validation,
}

impl AuthService {
    pub fn new(db: DatabaseService, config: &AuthConfig) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        // provider tokens carry an audience we do not pin
        validation.validate_aud = false;

        Self {
            db,
            decoding_key: DecodingKey::from_secret(config.jwt_secret.as_bytes()),
            validation,
        }
    }

    /// Verify signature and expiry of a bearer token
    pub fn verify(&self, token: &str) -> Result<Claims> {
        let data = decode::<Claims>(token, &self.decoding_key, &self.validation).map_err(|e| {
            debug!(error = %e, "Token rejected");
            SkiClubError::Unauthorized("Invalid or expired token".to_string())
        })?;
        Ok(data.claims)
    }

    /// Profile behind verified claims.
    ///
    /// Looks up by id first, then by email (accounts created by the legacy
    /// import carry their own ids). A first login with an unknown email
    /// creates a parent profile.
    pub async fn resolve_profile(&self, claims: &Claims) -> Result<Profile> {
        if let Some(profile) = self.db.profiles.find_by_id(claims.sub).await? {
            return Ok(profile);
        }

        let email = claims.email.as_deref()
            .map(normalize_email)
            .filter(|email| !email.is_empty())
            .ok_or_else(|| SkiClubError::Unauthorized("Unknown account".to_string()))?;

        if let Some(profile) = self.db.profiles.find_by_email(&email).await? {
            debug!(profile_id = %profile.id, auth_id = %claims.sub, "Profile matched by email");
            return Ok(profile);
        }

        let profile = self.db.profiles.create(claims.sub, &email, "", "", None, Role::Parent).await?;
        info!(profile_id = %profile.id, "Parent profile created on first login");
        Ok(profile)
    }

    /// Verify a token and load its profile
    pub async fn authenticate(&self, token: &str) -> Result<Profile> {
        let claims = self.verify(token)?;
        self.resolve_profile(&claims).await
    }
}

/// Admins may touch anything; a parent only what they own
pub fn ensure_owner(actor: &Profile, owner_id: Uuid) -> Result<()> {
    if actor.is_admin() || actor.id == owner_id {
        Ok(())
    } else {
        warn!(profile_id = %actor.id, owner_id = %owner_id, "Access to another parent's data refused");
        Err(SkiClubError::PermissionDenied("Not your record".to_string()))
    }
}

/// Compare the cron bearer secret without short-circuiting on the first mismatch
pub fn cron_secret_matches(expected: &str, provided: &str) -> bool {
    if expected.is_empty() || expected.len() != provided.len() {
        return false;
    }
    expected
        .bytes()
        .zip(provided.bytes())
        .fold(0u8, |acc, (a, b)| acc | (a ^ b))
        == 0
}
