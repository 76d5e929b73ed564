//! Billing Configuration
//!
//! Read once at startup from the process environment.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{BillingError, Result};

/// Deployment the hosted pages redirect back to when `APP_BASE_URL` is unset
pub const DEFAULT_APP_BASE_URL: &str = "https://product-sphere.vercel.app";

/// When a user gets the premium flag
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PremiumPolicy {
    /// As soon as a checkout session is created, before any payment
    #[default]
    OnCheckoutCreated,
    /// Only once Stripe reports `checkout.session.completed`
    OnPaymentConfirmed,
}

impl PremiumPolicy {
    /// Parse from the `PREMIUM_POLICY` value (`checkout` or `payment`)
    pub fn parse(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "checkout" | "on_checkout_created" => Ok(PremiumPolicy::OnCheckoutCreated),
            "payment" | "on_payment_confirmed" => Ok(PremiumPolicy::OnPaymentConfirmed),
            other => Err(BillingError::Config(format!(
                "unknown PREMIUM_POLICY '{other}' (expected 'checkout' or 'payment')"
            ))),
        }
    }
}

/// Stripe credentials and checkout settings
#[derive(Clone)]
pub struct BillingConfig {
    /// Stripe secret (or restricted) API key
    pub secret_key: String,

    /// Price every checkout subscribes to
    pub price_id: String,

    /// Signing secret for `/webhook/stripe`; webhooks are rejected without it
    pub webhook_secret: Option<String>,

    /// Base for the success, cancel and portal return URLs
    pub app_base_url: String,

    pub premium_policy: PremiumPolicy,
}

impl BillingConfig {
    /// Build a config, validating the key and price id
    pub fn new(secret_key: impl Into<String>, price_id: impl Into<String>) -> Result<Self> {
        let secret_key = secret_key.into();
        let price_id = price_id.into();

        if !(secret_key.starts_with("sk_") || secret_key.starts_with("rk_")) {
            return Err(BillingError::Config(
                "STRIPE_SECRET_KEY must be a secret (sk_) or restricted (rk_) key".into(),
            ));
        }
        if price_id.trim().is_empty() {
            return Err(BillingError::Config("STRIPE_PRICE_ID is empty".into()));
        }

        Ok(Self {
            secret_key,
            price_id,
            webhook_secret: None,
            app_base_url: DEFAULT_APP_BASE_URL.to_string(),
            premium_policy: PremiumPolicy::default(),
        })
    }

    /// Create from environment variables
    pub fn from_env() -> Result<Self> {
        let secret_key = std::env::var("STRIPE_SECRET_KEY")
            .map_err(|_| BillingError::Config("STRIPE_SECRET_KEY not set".into()))?;
        let price_id = std::env::var("STRIPE_PRICE_ID")
            .map_err(|_| BillingError::Config("STRIPE_PRICE_ID not set".into()))?;

        let mut config = Self::new(secret_key, price_id)?;
        config.webhook_secret = std::env::var("STRIPE_WEBHOOK_SECRET")
            .ok()
            .filter(|s| !s.is_empty());
        if let Ok(base) = std::env::var("APP_BASE_URL") {
            config = config.with_base_url(base);
        }
        if let Ok(policy) = std::env::var("PREMIUM_POLICY") {
            config.premium_policy = PremiumPolicy::parse(&policy)?;
        }

        Ok(config)
    }

    pub fn with_base_url(mut self, base: impl Into<String>) -> Self {
        self.app_base_url = base.into().trim_end_matches('/').to_string();
        self
    }

    pub fn with_webhook_secret(mut self, secret: impl Into<String>) -> Self {
        self.webhook_secret = Some(secret.into());
        self
    }

    pub fn with_premium_policy(mut self, policy: PremiumPolicy) -> Self {
        self.premium_policy = policy;
        self
    }

    pub fn success_url(&self) -> String {
        format!("{}/payment/success", self.app_base_url)
    }

    pub fn cancel_url(&self) -> String {
        format!("{}/payment/failed", self.app_base_url)
    }

    pub fn portal_return_url(&self) -> String {
        format!("{}/settings", self.app_base_url)
    }
}

impl fmt::Debug for BillingConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BillingConfig")
            .field("secret_key", &"<redacted>")
            .field("price_id", &self.price_id)
            .field("webhook_secret", &self.webhook_secret.as_ref().map(|_| "<redacted>"))
            .field("app_base_url", &self.app_base_url)
            .field("premium_policy", &self.premium_policy)
            .finish()
    }
}
