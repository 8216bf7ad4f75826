use std::sync::Arc;

use axum::routing::{get, post};
use axum::Router;
use tipjar_sdk::TipJar;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::handler;

/// Build the axum router with all Tipjar endpoints.
///
/// CORS is permissive so a browser wallet front end can call the API directly.
pub fn build_router(jar: Arc<TipJar>) -> Router {
    Router::new()
        .route("/v1/health", get(handler::health_handler))
        .route("/v1/info", get(handler::info_handler))
        .route(
            "/v1/recipients",
            get(handler::list_recipients).post(handler::register_recipient),
        )
        .route("/v1/resolve", get(handler::resolve_recipient))
        .route("/v1/tips", post(handler::submit_tip))
        .route("/v1/tips/by-reference", post(handler::tip_by_reference))
        .route("/v1/accounts/:address/balance", get(handler::balance))
        .route("/v1/accounts/:address/stats", get(handler::stats))
        .route("/v1/accounts/:address/transactions", get(handler::transactions))
        .route("/v1/accounts/:address/withdrawals", post(handler::withdraw))
        .route("/v1/stats", get(handler::global_stats))
        .route("/v1/top", get(handler::top_recipients))
        .route("/v1/export", get(handler::export))
        .route("/v1/verify", get(handler::verify))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(jar)
}
