//! HTTP handlers module
//!
//! Handlers are grouped by resource; `build_router` wires every route and the
//! shared middleware stack so `main` and the integration tests serve the same
//! application.

pub mod admin;
pub mod contracts;
pub mod cron;
pub mod groups;
pub mod health;
pub mod import;
pub mod notifications;
pub mod participants;
pub mod payments;
pub mod profile;
pub mod registrations;
pub mod trips;

use axum::http::header::{AUTHORIZATION, CONTENT_TYPE};
use axum::http::Method;
use axum::routing::{delete, get, post, put};
use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer};
use tracing::Level;
use crate::config::settings::ServerConfig;
use crate::middleware::log_errors;
use crate::state::AppState;

/// Routes available to any authenticated profile
fn parent_routes() -> Router<AppState> {
    Router::new()
        .route("/api/profile", get(profile::get_profile).put(profile::update_profile))
        .route("/api/participants", get(participants::list_participants).post(participants::create_participant))
        .route(
            "/api/participants/{id}",
            get(participants::get_participant)
                .put(participants::update_participant)
                .delete(participants::delete_participant),
        )
        .route("/api/trips", get(trips::list_trips).post(trips::create_trip))
        .route(
            "/api/trips/{id}",
            get(trips::get_trip).put(trips::update_trip).delete(trips::delete_trip),
        )
        .route("/api/trips/{id}/registrations", post(registrations::register))
        .route("/api/registrations", get(registrations::list_own))
        .route("/api/registrations/{id}", delete(registrations::unregister))
        .route("/api/registrations/{id}/participation", put(registrations::set_participation))
        .route("/api/payments", get(payments::list_own))
        .route("/api/contracts", get(contracts::list_own))
        .route("/api/contracts/{id}/accept", post(contracts::accept))
}

/// Routes guarded by the admin role
fn admin_routes() -> Router<AppState> {
    Router::new()
        .route("/api/admin/profiles", get(profile::list_profiles))
        .route("/api/admin/profiles/{id}/role", put(profile::set_role))
        .route("/api/groups", get(groups::list_groups).post(groups::create_group))
        .route("/api/groups/{id}", put(groups::update_group).delete(groups::delete_group))
        .route("/api/admin/participants/{id}/group", put(participants::assign_group))
        .route("/api/trips/parse", post(trips::parse_trip))
        .route(
            "/api/trips/{id}/payment-templates",
            get(trips::list_templates).post(trips::create_template),
        )
        .route("/api/payment-templates/{id}", delete(trips::delete_template))
        .route("/api/admin/trips/{id}/registrations", get(registrations::list_for_trip))
        .route("/api/admin/payments", get(payments::list_payments))
        .route("/api/admin/payments/{id}", put(payments::update_payment))
        .route("/api/admin/payments/{id}/record", post(payments::record_payment))
        .route("/api/admin/trips/{id}/payment-summary", get(payments::trip_summary))
        .route(
            "/api/trips/{id}/contract-template",
            get(contracts::get_template).put(contracts::put_template),
        )
        .route("/api/trips/{id}/contracts/generate", post(contracts::generate))
        .route("/api/admin/trips/{id}/contracts", get(contracts::list_for_trip))
        .route(
            "/api/notifications",
            get(notifications::list_notifications).post(notifications::create_notification),
        )
        .route("/api/notifications/{id}", get(notifications::get_notification))
        .route("/api/notifications/{id}/send", post(notifications::send_notification))
        .route("/api/admin/import/children", post(import::import_children))
        .route("/api/admin/import/trips", post(import::import_trips))
        .route("/api/admin/import/{kind}/rows", get(import::list_rows))
        .route("/api/admin/stats", get(admin::stats))
}

/// Permissive CORS for development, same-origin otherwise
pub fn build_cors_layer(config: &ServerConfig) -> CorsLayer {
    if config.cors_permissive {
        return CorsLayer::permissive();
    }

    CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers([CONTENT_TYPE, AUTHORIZATION])
}

/// Build the full application router with all middleware layers
pub fn build_router(state: AppState) -> Router {
    let cors = build_cors_layer(&state.settings.server);

    Router::new()
        .route("/health", get(health::health))
        .route("/api/cron/payment-reminders", post(cron::payment_reminders))
        .merge(parent_routes())
        .merge(admin_routes())
        .layer(axum::middleware::from_fn(log_errors))
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        .layer(cors)
        .with_state(state)
}
