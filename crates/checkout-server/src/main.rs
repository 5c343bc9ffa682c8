//! widget-checkout HTTP Server
//!
//! Axum server exposing the account service to the checkout frontend
//! and serving the compiled WASM app.

mod config;
mod handlers;
mod routes;
mod state;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use checkout_payments::ProcessorConfig;

use crate::config::ServerConfig;
use crate::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment before anything reads it, RUST_LOG included
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info,tower_http=debug".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let server_config = ServerConfig::from_env();

    // Initialize payments
    let accounts = match ProcessorConfig::from_env().and_then(|config| config.account_service()) {
        Ok(accounts) => {
            tracing::info!("✓ Payment processor: {}", accounts.processor_name());
            Some(accounts)
        }
        Err(e) => {
            tracing::warn!("⚠ {e} - payments disabled");
            tracing::warn!("  Set STRIPE_SECRET_KEY in .env, or PAYMENT_PROCESSOR=memory");
            None
        }
    };

    let app = routes::app(AppState::new(accounts), &server_config.static_dir);

    // Start server
    let addr = &server_config.bind_addr;
    let listener = tokio::net::TcpListener::bind(addr).await?;

    tracing::info!("══════════════════════════════════════════════════");
    tracing::info!("🚀 widget-checkout server running on http://{}", addr);
    tracing::info!("══════════════════════════════════════════════════");
    tracing::info!("");
    tracing::info!("Endpoints:");
    tracing::info!("  GET    /health                         - Health check");
    tracing::info!("  GET    /widgetprice                    - Widget price");
    tracing::info!("  POST   /setupintent                    - Create setup intent");
    tracing::info!("  POST   /paymentintent                  - Create payment intent");
    tracing::info!("  GET    /customers                      - List customers");
    tracing::info!("  GET    /customer/:id                   - Customer snapshot");
    tracing::info!("  POST   /customer                       - Create customer");
    tracing::info!("  GET    /paymentmethods?customerId=     - List cards");
    tracing::info!("  DELETE /paymentmethod/:id              - Detach card");
    tracing::info!("  POST   /paymentmethod/:cid/:pmid       - Attach card");
    tracing::info!("  POST   /defaultpaymentmethod/:cid/:pmid - Set default card");
    tracing::info!("  Static files served from {}/", server_config.static_dir);
    tracing::info!("");

    axum::serve(listener, app).await?;

    Ok(())
}
