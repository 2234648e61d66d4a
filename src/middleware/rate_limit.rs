//! Rate limiting
//!
//! Per-user limit for expensive endpoints (the AI trip parser), backed by a
//! keyed `governor` limiter.

use governor::{DefaultKeyedRateLimiter, Quota, RateLimiter};
use std::num::NonZeroU32;
use std::sync::Arc;
use tracing::{debug, warn};
use uuid::Uuid;
use crate::utils::errors::{Result, SkiClubError};

#[derive(Clone)]
pub struct UserRateLimiter {
    limiter: Arc<DefaultKeyedRateLimiter<Uuid>>,
    requests_per_minute: u32,
}

impl UserRateLimiter {
    /// Allow `requests_per_minute` requests per user; zero is treated as one
    pub fn per_minute(requests_per_minute: u32) -> Self {
        let per_minute = NonZeroU32::new(requests_per_minute).unwrap_or(NonZeroU32::MIN);

        Self {
            limiter: Arc::new(RateLimiter::keyed(Quota::per_minute(per_minute))),
            requests_per_minute: per_minute.get(),
        }
    }

    /// Check if user is rate limited
    pub fn check(&self, user_id: Uuid) -> Result<()> {
        match self.limiter.check_key(&user_id) {
            Ok(()) => {
                debug!(user_id = %user_id, "Rate limit check passed");
                Ok(())
            }
            Err(_) => {
                warn!(user_id = %user_id, limit = self.requests_per_minute, "Rate limit exceeded");
                Err(SkiClubError::RateLimitExceeded)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_limit_is_per_user() {
        let limiter = UserRateLimiter::per_minute(2);
        let alice = Uuid::new_v4();
        let bob = Uuid::new_v4();

        assert!(limiter.check(alice).is_ok());
        assert!(limiter.check(alice).is_ok());
        assert!(matches!(limiter.check(alice), Err(SkiClubError::RateLimitExceeded)));
        assert!(limiter.check(bob).is_ok());
    }

    #[test]
    fn test_zero_quota_allows_one() {
        let limiter = UserRateLimiter::per_minute(0);
        let user = Uuid::new_v4();
        assert!(limiter.check(user).is_ok());
        assert!(limiter.check(user).is_err());
    }
}
