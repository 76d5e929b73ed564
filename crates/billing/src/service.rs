//! Billing Service
//!
//! Holds the injected collaborators shared by the checkout, portal and
//! payment-status flows.

use std::sync::Arc;

use crate::config::BillingConfig;
use crate::error::{BillingError, Result};
use crate::identity::IdentityProvider;
use crate::model::{Customer, Principal};
use crate::provider::PaymentProvider;
use crate::users::UserStore;

/// Entry point for the billing flows
#[derive(Clone)]
pub struct BillingService {
    pub(crate) provider: Arc<dyn PaymentProvider>,
    pub(crate) users: Arc<dyn UserStore>,
    pub(crate) config: Arc<BillingConfig>,
}

impl BillingService {
    pub fn new(
        provider: Arc<dyn PaymentProvider>,
        users: Arc<dyn UserStore>,
        config: BillingConfig,
    ) -> Self {
        Self {
            provider,
            users,
            config: Arc::new(config),
        }
    }

    pub fn config(&self) -> &BillingConfig {
        &self.config
    }

    pub fn provider(&self) -> &dyn PaymentProvider {
        self.provider.as_ref()
    }

    pub fn users(&self) -> &dyn UserStore {
        self.users.as_ref()
    }

    /// Current principal, or `Unauthenticated`
    pub(crate) async fn require_principal(
        &self,
        identity: &dyn IdentityProvider,
    ) -> Result<Principal> {
        identity
            .current_principal()
            .await?
            .ok_or(BillingError::Unauthenticated("no session"))
    }

    /// First provider customer registered under `email`
    ///
    /// Several customers can share an email; the provider's first match wins.
    pub(crate) async fn first_customer(&self, email: &str) -> Result<Option<Customer>> {
        let customers = self.provider.list_customers_by_email(email).await?;
        if customers.len() > 1 {
            tracing::debug!(email, count = customers.len(), "Multiple customers for email, using first");
        }
        Ok(customers.into_iter().next())
    }
}
