pub mod entities;
pub mod entity;
pub mod health;
pub mod schema;

use axum::Router;

use crate::state::AppState;

/// Assemble the full router with all route groups.
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .merge(health::routes())
        .merge(schema::routes())
        .merge(entities::routes())
        .merge(entity::routes())
        .with_state(state)
}
