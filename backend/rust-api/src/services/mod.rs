use std::sync::Arc;

use crate::config::Config;
use crate::store::Store;

/// Shared application state: configuration plus the injected store
/// capability. Services are constructed per request from this.
pub struct AppState {
    pub config: Config,
    pub store: Arc<dyn Store>,
}

impl AppState {
    pub fn new(config: Config, store: Arc<dyn Store>) -> Self {
        Self { config, store }
    }
}

pub mod auth_service;
pub mod catalog_service;
pub mod progress_service;
pub mod seed;
