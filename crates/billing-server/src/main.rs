//! product-sphere billing server
//!
//! Axum-based server exposing checkout, billing portal, payment status and
//! the Stripe webhook.

mod handlers;
mod session;
mod state;

use std::sync::Arc;

use axum::{
    Router,
    routing::{get, post},
};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use sphere_billing::{
    BillingConfig, BillingService, MemoryUserStore, PgUserStore, StripeClient, UserStore,
};

use crate::handlers::{
    create_checkout, create_portal_link, health_check, next_payment, stripe_webhook,
};
use crate::state::AppState;

fn router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(health_check))
        // Billing
        .route("/api/checkout", post(create_checkout))
        .route("/api/billing/portal", post(create_portal_link))
        .route("/api/billing/next-payment", get(next_payment))
        .route("/webhook/stripe", post(stripe_webhook))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn user_store() -> anyhow::Result<(Arc<dyn UserStore>, &'static str)> {
    match std::env::var("DATABASE_URL") {
        Ok(url) => {
            let store = PgUserStore::connect(&url).await?;
            tracing::info!("✓ Connected to Postgres user store");
            Ok((Arc::new(store), "postgres"))
        }
        Err(_) => {
            tracing::warn!("⚠ DATABASE_URL not set - using in-memory user store");
            Ok((Arc::new(MemoryUserStore::new()), "memory"))
        }
    }
}

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

    let (users, user_store) = user_store().await?;

    // A malformed key is fatal; a missing one only disables payments
    let billing = match BillingConfig::from_env() {
        Ok(config) => {
            tracing::info!(
                price_id = %config.price_id,
                policy = ?config.premium_policy,
                webhooks = config.webhook_secret.is_some(),
                "✓ Stripe configured"
            );
            let stripe = Arc::new(StripeClient::from_config(&config));
            Some(BillingService::new(stripe, users, config))
        }
        Err(e) if std::env::var_os("STRIPE_SECRET_KEY").is_some() => return Err(e.into()),
        Err(e) => {
            tracing::warn!("⚠ Stripe not configured - payments disabled ({})", e);
            tracing::warn!("  Set STRIPE_SECRET_KEY and STRIPE_PRICE_ID in .env");
            None
        }
    };

    let app = router(AppState {
        billing,
        user_store,
    });

    // Start server
    let addr = std::env::var("BIND_ADDR").unwrap_or_else(|_| "0.0.0.0:3000".into());
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    tracing::info!("billing server running on http://{}", addr);
    tracing::info!("Endpoints:");
    tracing::info!("  GET  /health                   - Health check");
    tracing::info!("  POST /api/checkout             - Create Stripe checkout");
    tracing::info!("  POST /api/billing/portal       - Billing portal link");
    tracing::info!("  GET  /api/billing/next-payment - Next payment details");
    tracing::info!("  POST /webhook/stripe           - Stripe webhook");

    axum::serve(listener, app).await?;

    Ok(())
}
