//! Middleware module
//!
//! This module contains request extractors and middleware for request processing

pub mod auth;
pub mod logging;
pub mod rate_limit;

// Re-export commonly used middleware
pub use auth::{AuthUser, CronAuth, RequireAdmin};
pub use logging::log_errors;
pub use rate_limit::UserRateLimiter;
