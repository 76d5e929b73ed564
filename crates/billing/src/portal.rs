//! Stripe Billing Portal

use crate::error::{BillingError, Result};
use crate::identity::IdentityProvider;
use crate::service::BillingService;

impl BillingService {
    /// Create a billing portal session for the signed-in user and return its URL
    pub async fn create_customer_portal_link(
        &self,
        identity: &dyn IdentityProvider,
    ) -> Result<String> {
        let result = self.portal_link(identity).await;
        if let Err(ref e) = result {
            tracing::error!(error = %e, "Stripe error while accessing billing portal");
        }
        result
    }

    async fn portal_link(&self, identity: &dyn IdentityProvider) -> Result<String> {
        let principal = self.require_principal(identity).await?;
        if principal.id.is_none() {
            return Err(BillingError::Unauthenticated("user id missing"));
        }
        let email = principal
            .email
            .ok_or(BillingError::Unauthenticated("user email missing"))?;

        let customer = self
            .first_customer(&email)
            .await?
            .filter(|c| !c.id.is_empty())
            .ok_or_else(|| BillingError::CustomerNotFound(email.clone()))?;

        let url = self
            .provider
            .create_portal_session(&customer.id, &self.config.portal_return_url())
            .await?;

        tracing::info!(customer_id = %customer.id, "Created billing portal session");

        Ok(url)
    }
}
