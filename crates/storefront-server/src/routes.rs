//! Router

use axum::{
    Router,
    routing::{get, post},
};
use tower_http::{
    cors::{Any, CorsLayer},
    services::ServeDir,
    trace::TraceLayer,
};

use crate::handlers::{create_checkout_session, health_check, session_status, stripe_webhook, submission_created};
use crate::state::AppState;

/// Build the application router.
///
/// The `/.netlify/functions/*` paths are kept for the deployed frontend.
pub fn router(state: AppState, static_dir: &str) -> Router {
    // CORS configuration
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        // Health
        .route("/health", get(health_check))
        // Payments
        .route("/api/checkout-session", post(create_checkout_session))
        .route("/api/stripe-webhook", post(stripe_webhook))
        .route("/api/session-status", get(session_status))
        // Forms
        .route("/api/submission-created", post(submission_created))
        // Legacy function paths
        .route("/.netlify/functions/create-checkout-session", post(create_checkout_session))
        .route("/.netlify/functions/stripe-webhook", post(stripe_webhook))
        .route("/.netlify/functions/session-status", get(session_status))
        .route("/.netlify/functions/submission-created", post(submission_created))
        // Static files (SPA build)
        .fallback_service(ServeDir::new(static_dir))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
