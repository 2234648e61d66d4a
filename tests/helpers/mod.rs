//! Test helpers module
//!
//! Shared setup for the integration tests: settings and application state,
//! signed access tokens, request builders, a recording email transport and
//! the optional Postgres database.

#![allow(dead_code)]

pub mod app;
pub mod database;
pub mod email;
pub mod tokens;

pub use app::*;
pub use database::*;
pub use email::*;
pub use tokens::*;
