//! # Routes
//!
//! Axum router configuration for the link-gateway API.

use crate::handlers;
use crate::state::AppState;
use axum::{
    routing::{get, post},
    Router,
};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

/// Create the main application router
///
/// Routes:
/// - GET  /health - Liveness check
/// - GET  /config - Publishable key for client-side widget init
/// - POST /create-payment-intent - Create an intent (reads session cookie)
/// - GET  /payment/next - Post-confirmation redirect (may set session cookie)
/// - GET  /success - Completion page
/// - POST /webhook - Processor webhook handler (raw body)
pub fn create_router(state: AppState) -> Router {
    // The sample clients may be served from another origin during development
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(handlers::health))
        .route("/config", get(handlers::get_config))
        .route("/create-payment-intent", post(handlers::create_payment_intent))
        .route("/payment/next", get(handlers::payment_next))
        .route("/success", get(handlers::success_page))
        // Raw body: the webhook handler verifies the signature over the
        // exact bytes received, so nothing may parse them first
        .route("/webhook", post(handlers::webhook))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
