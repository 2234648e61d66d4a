//! Access tokens signed the way the auth provider signs them

use chrono::{Duration, Utc};
use jsonwebtoken::{encode, EncodingKey, Header};
use skiclub::services::Claims;
use uuid::Uuid;

pub const TEST_JWT_SECRET: &str = "test-jwt-secret";
pub const TEST_CRON_SECRET: &str = "test-cron-secret";

/// HS256 token for `sub` valid for an hour
pub fn token_for(sub: Uuid, email: &str) -> String {
    sign(sub, Some(email), Duration::hours(1), TEST_JWT_SECRET)
}

/// Token whose expiry lies in the past
pub fn expired_token_for(sub: Uuid, email: &str) -> String {
    sign(sub, Some(email), Duration::hours(-2), TEST_JWT_SECRET)
}

/// Token signed with a secret the server does not know
pub fn foreign_token_for(sub: Uuid, email: &str) -> String {
    sign(sub, Some(email), Duration::hours(1), "some-other-secret")
}

fn sign(sub: Uuid, email: Option<&str>, lifetime: Duration, secret: &str) -> String {
    let claims = Claims {
        sub,
        email: email.map(str::to_string),
        exp: (Utc::now() + lifetime).timestamp(),
    };

    encode(&Header::default(), &claims, &EncodingKey::from_secret(secret.as_bytes()))
        .expect("Failed to sign test token")
}
