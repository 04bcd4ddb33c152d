use axum::Router;
use axum::routing::get;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use super::AppState;
use super::handlers;

/// Builds the full dashboard router with all routes and shared state.
pub fn build(state: AppState) -> Router {
    Router::new()
        .route("/health", get(handlers::health))
        .route("/instruments", get(handlers::instruments))
        .route("/monthly", get(handlers::monthly))
        .route("/cumulative", get(handlers::cumulative))
        .route("/stats", get(handlers::stats))
        .route("/history/{instrument}", get(handlers::history))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
