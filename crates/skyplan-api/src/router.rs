use std::sync::Arc;

use axum::{routing::get, Router};

use crate::handlers;
use crate::state::AppState;

/// Create the API router with all routes
pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        // Health
        .route("/health", get(handlers::health_check))
        // Missions (project-scoped)
        .route(
            "/api/projects/{project_id}/missions",
            get(handlers::list_missions).post(handlers::create_mission),
        )
        .route(
            "/api/projects/{project_id}/missions/{mission_id}",
            get(handlers::get_mission)
                .patch(handlers::update_mission)
                .delete(handlers::delete_mission),
        )
        .with_state(state)
}
