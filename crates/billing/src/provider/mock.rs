//! Mock Payment Provider
//!
//! For testing and local development. Serves customers, subscriptions and
//! prices from memory and records every mutating call.

use async_trait::async_trait;
use tokio::sync::Mutex;

use super::PaymentProvider;
use crate::error::{BillingError, Result};
use crate::model::{CheckoutParams, CheckoutSession, Customer, Price, Subscription};

/// In-memory stand-in for Stripe
#[derive(Default)]
pub struct MockPaymentProvider {
    customers: Vec<Customer>,
    subscriptions: Vec<Subscription>,
    prices: Vec<Price>,
    /// Every call fails with this message when set
    failure: Option<String>,
    checkout_calls: Mutex<Vec<CheckoutParams>>,
    portal_calls: Mutex<Vec<(String, String)>>,
}

impl MockPaymentProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_customer(mut self, customer: Customer) -> Self {
        self.customers.push(customer);
        self
    }

    /// Add an active subscription
    pub fn with_subscription(mut self, subscription: Subscription) -> Self {
        self.subscriptions.push(subscription);
        self
    }

    pub fn with_price(mut self, price: Price) -> Self {
        self.prices.push(price);
        self
    }

    /// Make every call fail as if the provider were unreachable
    pub fn failing(mut self, message: impl Into<String>) -> Self {
        self.failure = Some(message.into());
        self
    }

    /// Checkout sessions requested so far
    pub async fn checkout_calls(&self) -> Vec<CheckoutParams> {
        self.checkout_calls.lock().await.clone()
    }

    /// Portal sessions requested so far, as `(customer_id, return_url)`
    pub async fn portal_calls(&self) -> Vec<(String, String)> {
        self.portal_calls.lock().await.clone()
    }

    fn check_available(&self) -> Result<()> {
        match &self.failure {
            Some(message) => Err(BillingError::Provider(message.clone())),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl PaymentProvider for MockPaymentProvider {
    async fn create_checkout_session(&self, params: &CheckoutParams) -> Result<CheckoutSession> {
        self.check_available()?;
        self.checkout_calls.lock().await.push(params.clone());

        let id = format!("cs_test_{}", uuid::Uuid::new_v4().simple());
        Ok(CheckoutSession {
            url: format!("https://checkout.stripe.com/c/pay/{id}"),
            id,
            customer_email: params.customer_email.clone(),
        })
    }

    async fn list_customers_by_email(&self, email: &str) -> Result<Vec<Customer>> {
        self.check_available()?;
        Ok(self
            .customers
            .iter()
            .filter(|c| c.email.as_deref() == Some(email))
            .cloned()
            .collect())
    }

    async fn retrieve_customer(&self, customer_id: &str) -> Result<Customer> {
        self.check_available()?;
        self.customers
            .iter()
            .find(|c| c.id == customer_id)
            .cloned()
            .ok_or_else(|| BillingError::CustomerNotFound(customer_id.to_string()))
    }

    async fn create_portal_session(&self, customer_id: &str, return_url: &str) -> Result<String> {
        self.check_available()?;
        self.portal_calls
            .lock()
            .await
            .push((customer_id.to_string(), return_url.to_string()));

        Ok(format!("https://billing.stripe.com/p/session/test_{customer_id}"))
    }

    async fn list_active_subscriptions(&self, customer_id: &str) -> Result<Vec<Subscription>> {
        self.check_available()?;
        Ok(self
            .subscriptions
            .iter()
            .filter(|s| s.customer_id == customer_id)
            .cloned()
            .collect())
    }

    async fn retrieve_price(&self, price_id: &str) -> Result<Option<Price>> {
        self.check_available()?;
        Ok(self.prices.iter().find(|p| p.id == price_id).cloned())
    }

    fn name(&self) -> &str {
        "mock"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_customer_lookup_by_email() {
        let provider = MockPaymentProvider::new().with_customer(Customer {
            id: "cus_1".into(),
            email: Some("ada@example.com".into()),
        });

        let found = provider.list_customers_by_email("ada@example.com").await.unwrap();
        assert_eq!(found.len(), 1);
        assert!(provider.list_customers_by_email("bob@example.com").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_failing_provider() {
        let provider = MockPaymentProvider::new().failing("connection reset");
        let result = provider.retrieve_price("price_1").await;
        assert!(matches!(result, Err(BillingError::Provider(_))));
    }
}
