//! Stripe-backed [`PaymentProvider`]

use async_trait::async_trait;
use stripe::{
    BillingPortalSession, CheckoutSession as StripeCheckoutSession, CheckoutSessionMode, Client,
    CreateBillingPortalSession, CreateCheckoutSession, CreateCheckoutSessionLineItems,
    CreateCheckoutSessionPaymentMethodTypes, Customer as StripeCustomer, CustomerId, ListCustomers,
    ListSubscriptions, Price as StripePrice, PriceId, StripeError,
    Subscription as StripeSubscription, SubscriptionStatusFilter,
};

use super::PaymentProvider;
use crate::config::BillingConfig;
use crate::error::{BillingError, Result};
use crate::model::{CheckoutMode, CheckoutParams, CheckoutSession, Customer, Price, Subscription};

/// Stripe client wrapper
pub struct StripeClient {
    client: Client,
}

impl StripeClient {
    /// Create a new Stripe client
    pub fn new(secret_key: &str) -> Self {
        Self {
            client: Client::new(secret_key),
        }
    }

    pub fn from_config(config: &BillingConfig) -> Self {
        Self::new(&config.secret_key)
    }
}

fn parse_customer_id(customer_id: &str) -> Result<CustomerId> {
    customer_id
        .parse::<CustomerId>()
        .map_err(|e| BillingError::Provider(format!("Invalid customer ID '{customer_id}': {e}")))
}

impl From<StripeCustomer> for Customer {
    fn from(customer: StripeCustomer) -> Self {
        Self {
            id: customer.id.to_string(),
            email: customer.email,
        }
    }
}

impl From<StripeSubscription> for Subscription {
    fn from(sub: StripeSubscription) -> Self {
        let price_id = sub
            .items
            .data
            .first()
            .and_then(|item| item.price.as_ref())
            .map(|price| price.id.to_string());

        Self {
            id: sub.id.to_string(),
            customer_id: sub.customer.id().to_string(),
            current_period_end: sub.current_period_end,
            price_id,
        }
    }
}

impl From<StripePrice> for Price {
    fn from(price: StripePrice) -> Self {
        Self {
            id: price.id.to_string(),
            unit_amount: price.unit_amount,
            currency: price.currency.map(|c| c.to_string()),
        }
    }
}

#[async_trait]
impl PaymentProvider for StripeClient {
    async fn create_checkout_session(&self, request: &CheckoutParams) -> Result<CheckoutSession> {
        let mut params = CreateCheckoutSession::new();
        params.customer_email = Some(&request.customer_email);
        params.success_url = Some(&request.success_url);
        params.cancel_url = Some(&request.cancel_url);
        params.payment_method_types = Some(vec![CreateCheckoutSessionPaymentMethodTypes::Card]);
        params.mode = Some(match request.mode {
            CheckoutMode::Subscription => CheckoutSessionMode::Subscription,
        });
        params.line_items = Some(
            request
                .line_items
                .iter()
                .map(|item| CreateCheckoutSessionLineItems {
                    price: Some(item.price_id.clone()),
                    quantity: Some(item.quantity),
                    ..Default::default()
                })
                .collect(),
        );

        let session = StripeCheckoutSession::create(&self.client, params).await?;

        let url = session
            .url
            .ok_or_else(|| BillingError::Provider("No checkout URL returned".into()))?;

        Ok(CheckoutSession {
            id: session.id.to_string(),
            url,
            customer_email: session
                .customer_email
                .unwrap_or_else(|| request.customer_email.clone()),
        })
    }

    async fn list_customers_by_email(&self, email: &str) -> Result<Vec<Customer>> {
        let mut params = ListCustomers::new();
        params.email = Some(email);

        let customers = StripeCustomer::list(&self.client, &params).await?;
        Ok(customers.data.into_iter().map(Customer::from).collect())
    }

    async fn retrieve_customer(&self, customer_id: &str) -> Result<Customer> {
        let id = parse_customer_id(customer_id)?;
        let customer = StripeCustomer::retrieve(&self.client, &id, &[]).await?;
        Ok(customer.into())
    }

    async fn create_portal_session(&self, customer_id: &str, return_url: &str) -> Result<String> {
        let id = parse_customer_id(customer_id)?;

        let mut params = CreateBillingPortalSession::new(id);
        params.return_url = Some(return_url);

        let session = BillingPortalSession::create(&self.client, params).await?;
        Ok(session.url)
    }

    async fn list_active_subscriptions(&self, customer_id: &str) -> Result<Vec<Subscription>> {
        let mut params = ListSubscriptions::new();
        params.customer = Some(parse_customer_id(customer_id)?);
        params.status = Some(SubscriptionStatusFilter::Active);

        let subscriptions = StripeSubscription::list(&self.client, &params).await?;
        Ok(subscriptions.data.into_iter().map(Subscription::from).collect())
    }

    async fn retrieve_price(&self, price_id: &str) -> Result<Option<Price>> {
        let id = price_id
            .parse::<PriceId>()
            .map_err(|e| BillingError::Provider(format!("Invalid price ID '{price_id}': {e}")))?;

        match StripePrice::retrieve(&self.client, &id, &[]).await {
            Ok(price) => Ok(Some(price.into())),
            Err(StripeError::Stripe(err)) if err.http_status == 404 => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn name(&self) -> &str {
        "stripe"
    }
}
