//! Payment Provider Integration
//!
//! The billing flows talk to the payment processor only through
//! [`PaymentProvider`], so tests can swap Stripe for [`MockPaymentProvider`].

mod mock;
mod stripe_client;

pub use self::mock::MockPaymentProvider;
pub use self::stripe_client::StripeClient;

use async_trait::async_trait;

use crate::error::Result;
use crate::model::{CheckoutParams, CheckoutSession, Customer, Price, Subscription};

/// Payment provider client (Strategy pattern)
#[async_trait]
pub trait PaymentProvider: Send + Sync {
    /// Create a hosted checkout session
    async fn create_checkout_session(&self, params: &CheckoutParams) -> Result<CheckoutSession>;

    /// Customers registered under an email, in provider order
    async fn list_customers_by_email(&self, email: &str) -> Result<Vec<Customer>>;

    /// Fetch a single customer
    async fn retrieve_customer(&self, customer_id: &str) -> Result<Customer>;

    /// Create a billing portal session and return its URL
    async fn create_portal_session(&self, customer_id: &str, return_url: &str) -> Result<String>;

    /// Active subscriptions for a customer, in provider order
    async fn list_active_subscriptions(&self, customer_id: &str) -> Result<Vec<Subscription>>;

    /// Fetch a price; `None` if the provider has no such price
    async fn retrieve_price(&self, price_id: &str) -> Result<Option<Price>>;

    /// Provider name
    fn name(&self) -> &str;
}
