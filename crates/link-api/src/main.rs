//! # Link Gateway
//!
//! Payment gateway for the Link express-checkout flow.
//!
//! ## Usage
//!
//! ```bash
//! # Set environment variables
//! export STRIPE_SECRET_KEY=sk_test_...
//! export STRIPE_PUBLISHABLE_KEY=pk_test_...
//! export STRIPE_WEBHOOK_SECRET=whsec_...
//!
//! # Run the server
//! link-gateway
//! ```

use link_api::{routes, state::AppState};
use tracing::{info, Level};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(
            EnvFilter::builder()
                .with_default_directive(Level::INFO.into())
                .from_env_lossy(),
        )
        .init();

    // Initialize application state
    let state = AppState::new()?;

    let addr = state.config.socket_addr();
    let is_prod = state.config.is_production();

    info!("Environment: {}", state.config.environment);
    info!("Provider: {}", state.provider.provider_name());
    info!(
        "Checkout: {} {} -> {}",
        state.checkout.amount, state.checkout.currency, state.checkout.completion_path
    );

    // Create router
    let app = routes::create_router(state);

    // Start server
    info!("Link gateway starting on http://{}", addr);

    if !is_prod {
        info!("Config: GET http://{}/config", addr);
        info!("Intent: POST http://{}/create-payment-intent", addr);
        info!("Webhook: POST http://{}/webhook", addr);
    }

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
