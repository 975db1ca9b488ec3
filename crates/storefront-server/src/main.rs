//! Storefront HTTP Server
//!
//! Axum-based server for the checkout, Stripe webhook, session status and
//! form submission endpoints. The SPA build is served for everything else.

mod config;
mod handlers;
mod routes;
mod state;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::Settings;
use crate::routes::router;
use crate::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info,tower_http=debug".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let settings = Settings::from_env();
    let bind_addr = settings.bind_addr.clone();
    let static_dir = settings.static_dir.clone();

    let state = AppState::from_settings(settings)?;

    if state.payments.is_some() {
        tracing::info!("✓ Stripe configured");
    } else {
        tracing::warn!("⚠ Stripe not configured - checkout and status disabled");
        tracing::warn!("  Set STRIPE_SECRET_KEY and PRICE_* in .env");
    }
    if state.webhook_verifier.is_none() {
        tracing::warn!("⚠ STRIPE_WEBHOOK_SECRET not set - webhooks will be rejected");
    }
    if state.mail.is_some() {
        tracing::info!("✓ Email configured");
    } else {
        tracing::warn!("⚠ Email not configured - set RESEND_API_KEY, FROM_EMAIL and TO_EMAIL");
    }

    let app = router(state, &static_dir);

    // Start server
    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;

    tracing::info!("══════════════════════════════════════════════════");
    tracing::info!("🚀 storefront server running on http://{}", bind_addr);
    tracing::info!("══════════════════════════════════════════════════");
    tracing::info!("Endpoints:");
    tracing::info!("  GET  /health                  - Health check");
    tracing::info!("  POST /api/checkout-session    - Create checkout session");
    tracing::info!("  POST /api/stripe-webhook      - Stripe events");
    tracing::info!("  GET  /api/session-status      - Session summary");
    tracing::info!("  POST /api/submission-created  - Form submissions");
    tracing::info!("  static files from {}", static_dir);

    axum::serve(listener, app).await?;

    Ok(())
}
