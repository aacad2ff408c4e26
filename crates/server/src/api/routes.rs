use axum::{
    middleware,
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::trace::TraceLayer;

use super::{catalog, handlers, middleware::metrics_middleware, solved};
use crate::state::AppState;

pub fn create_router(state: Arc<AppState>) -> Router {
    // API routes
    let api_routes = Router::new()
        // Health and config
        .route("/health", get(handlers::health))
        .route("/config", get(handlers::get_config))
        // Catalog
        .route("/catalog", get(catalog::list_catalog))
        .route("/catalog/sync", post(catalog::sync_catalog))
        .route("/catalog/stats", get(catalog::get_stats))
        .route("/catalog/{slug}", get(catalog::get_entry))
        // Solved sets
        .route("/owners/{owner}/solved", get(solved::list_solved))
        .route("/owners/{owner}/solved/import", post(solved::import_snapshot))
        .route("/owners/{owner}/solved/enrich", post(solved::enrich))
        .route("/owners/{owner}/solved/stats", get(solved::get_stats));

    Router::new()
        .nest("/api/v1", api_routes)
        .route("/metrics", get(handlers::metrics))
        .with_state(state)
        .layer(middleware::from_fn(metrics_middleware))
        .layer(TraceLayer::new_for_http())
}
