//! # sphere-billing
//!
//! Premium subscriptions for product-sphere, billed through Stripe.
//!
//! ## Flows
//!
//! ```text
//! ┌─────────────┐     ┌─────────────────┐     ┌──────────────────┐
//! │  Pricing    │────▶│  Stripe Hosted  │────▶│ /payment/success │
//! │  (checkout) │     │  Checkout Page  │     │ /payment/failed  │
//! └─────────────┘     └─────────────────┘     └──────────────────┘
//!
//! ┌─────────────┐     ┌─────────────────┐     ┌─────────────┐
//! │  Settings   │────▶│  Stripe Billing │────▶│  /settings  │
//! │  (manage)   │     │     Portal      │     │             │
//! └─────────────┘     └─────────────────┘     └─────────────┘
//! ```
//!
//! - **Checkout**: [`BillingService::create_checkout_session`] opens a
//!   subscription checkout for the configured price and flags the user as
//!   premium (see [`PremiumPolicy`] for when).
//! - **Portal**: [`BillingService::create_customer_portal_link`] mints a
//!   one-time self-service URL for the signed-in user's Stripe customer.
//! - **Status**: [`BillingService::next_payment_details`] reports the next
//!   billing date and amount of the first active subscription.
//! - **Webhooks**: [`WebhookHandler`] grants premium on completed checkouts
//!   and revokes it when a subscription is deleted.
//!
//! Every collaborator is injected: the [`PaymentProvider`] (Stripe or the
//! in-memory mock), the [`UserStore`] (Postgres or memory) and, per call,
//! the [`IdentityProvider`] that knows who is signed in.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use sphere_billing::{BillingConfig, BillingService, PgUserStore, StripeClient};
//!
//! let config = BillingConfig::from_env()?;
//! let stripe = Arc::new(StripeClient::from_config(&config));
//! let users = Arc::new(PgUserStore::connect(&database_url).await?);
//! let billing = BillingService::new(stripe, users, config);
//!
//! let session = billing.create_checkout_session("user@example.com").await?;
//! // Redirect user to: session.url
//! ```

mod checkout;
mod config;
mod error;
mod identity;
mod model;
mod portal;
mod provider;
mod service;
mod status;
mod users;
mod webhook;

pub use config::{BillingConfig, DEFAULT_APP_BASE_URL, PremiumPolicy};
pub use error::{BillingError, ErrorKind, Result};
pub use identity::{IdentityProvider, StaticIdentity};
pub use model::{
    CheckoutMode, CheckoutParams, CheckoutSession, Customer, LineItem, PaymentDetails, Price,
    Principal, Subscription, User, format_billing_date, minor_to_major,
};
pub use provider::{MockPaymentProvider, PaymentProvider, StripeClient};
pub use service::BillingService;
pub use users::{MemoryUserStore, PgUserStore, UserStore};
pub use webhook::{WebhookEvent, WebhookHandler};
