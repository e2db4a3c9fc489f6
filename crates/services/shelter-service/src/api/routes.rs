//! Route configuration.

use axum::Router;

use super::handlers::{check_in_routes, health_routes, person_routes, shelter_routes};
use super::state::AppState;

/// Create the main router with all routes.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .nest("/health", health_routes())
        .nest("/shelters", shelter_routes())
        .nest("/people", person_routes())
        .nest("/check-ins", check_in_routes())
        .with_state(state)
}
