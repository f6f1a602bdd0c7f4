//! HTTP CRUD service for a single `tasks` table.

pub mod config;
pub mod error;
pub mod handlers;
pub mod store;
pub mod telemetry;

use axum::{routing::get, Router};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use handlers::{create_task, delete_task, get_task, home, list_tasks, update_task};
use store::SharedStore;

/// Builds the router with CORS and request tracing applied to every route.
pub fn app(store: SharedStore) -> Router {
    Router::new()
        .route("/", get(home))
        .route("/todos", get(list_tasks).post(create_task))
        .route("/todos/:id", get(get_task).put(update_task).delete(delete_task))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(store)
}
