//! Shared application state handed to every request handler

use std::sync::Arc;
use crate::config::settings::Settings;
use crate::database::DatabaseService;
use crate::services::ServiceFactory;

#[derive(Clone)]
pub struct AppState {
    pub db: DatabaseService,
    pub services: Arc<ServiceFactory>,
    pub settings: Arc<Settings>,
}

impl AppState {
    pub fn new(db: DatabaseService, services: ServiceFactory, settings: Settings) -> Self {
        Self {
            db,
            services: Arc::new(services),
            settings: Arc::new(settings),
        }
    }
}
