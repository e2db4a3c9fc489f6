//! Application state for dependency injection.

use std::sync::Arc;

use crate::infra::Database;
use crate::service::{ServiceContainer, Services};

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    pub services: Arc<dyn ServiceContainer>,
    pub db: Database,
}

impl AppState {
    /// Create new app state.
    pub fn new(services: Arc<dyn ServiceContainer>, db: Database) -> Self {
        Self { services, db }
    }

    /// Build every service on top of the given database.
    pub fn from_database(db: Database) -> Self {
        let services = Arc::new(Services::from_connection(db.get_connection()));
        Self::new(services, db)
    }
}
