//! SkiClub backend
//!
//! JSON API for a ski-trip club: parents and their children, groups, trips,
//! payment tracking with installments and season passes, contract generation
//! and acceptance, bulk email notifications, the legacy data import and the
//! daily payment reminder job.

pub mod config;
pub mod database;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod services;
pub mod state;
pub mod utils;

// Re-export commonly used types
pub use config::Settings;
pub use utils::errors::{SkiClubError, Result};

// Re-export main components for easy access
pub use database::DatabaseService;
pub use handlers::build_router;
pub use services::ServiceFactory;
pub use state::AppState;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Library name
pub const NAME: &str = env!("CARGO_PKG_NAME");

/// Get library information
pub fn info() -> String {
    format!("{} v{}", NAME, VERSION)
}
