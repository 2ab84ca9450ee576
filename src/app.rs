use std::sync::Arc;

use axum::routing::{get, post};
use axum::Router;
use tower_http::trace::TraceLayer;

use crate::api;
use crate::sync::service::SyncService;

/// Shared application state, cheaply cloneable.
#[derive(Clone)]
pub struct AppState {
    pub sync: Arc<SyncService>,
}

impl AppState {
    pub fn new(sync: SyncService) -> Self {
        Self {
            sync: Arc::new(sync),
        }
    }
}

/// Build the HTTP router: search, lifecycle hooks and the reindex task.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/search", get(api::search::search_handler))
        .route("/hooks/publish/{id}", post(api::hooks::publish_handler))
        .route("/hooks/unpublish/{id}", post(api::hooks::unpublish_handler))
        .route("/admin/reindex", post(api::hooks::reindex_handler))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
