//! Subscription Status
//!
//! Next billing date and amount for the signed-in user's active subscription.

use crate::error::{BillingError, Result};
use crate::identity::IdentityProvider;
use crate::model::{PaymentDetails, format_billing_date, minor_to_major};
use crate::service::BillingService;

impl BillingService {
    /// Next payment for the signed-in user
    ///
    /// Returns `Ok(None)` when the user has no billing customer or no active
    /// subscription. Missing sessions, incomplete prices and provider failures
    /// are errors; callers that render billing info may log and drop them.
    pub async fn next_payment_details(
        &self,
        identity: &dyn IdentityProvider,
    ) -> Result<Option<PaymentDetails>> {
        let result = self.payment_details(identity).await;
        match &result {
            Ok(None) => tracing::debug!("No active subscription"),
            Err(e) => tracing::error!(error = %e, "Error fetching payment details"),
            Ok(Some(_)) => {}
        }
        result
    }

    async fn payment_details(
        &self,
        identity: &dyn IdentityProvider,
    ) -> Result<Option<PaymentDetails>> {
        let principal = self.require_principal(identity).await?;
        let email = principal
            .email
            .ok_or(BillingError::Unauthenticated("user email missing"))?;

        let Some(customer) = self.first_customer(&email).await? else {
            return Ok(None);
        };

        let subscriptions = self.provider.list_active_subscriptions(&customer.id).await?;
        let Some(subscription) = subscriptions.into_iter().next() else {
            return Ok(None);
        };

        let next_payment_date = format_billing_date(subscription.current_period_end)?;

        let price_id = subscription
            .price_id
            .ok_or_else(|| BillingError::PriceNotFound(subscription.id.clone()))?;

        let price = self
            .provider
            .retrieve_price(&price_id)
            .await?
            .ok_or_else(|| BillingError::PriceNotFound(price_id.clone()))?;

        let (Some(unit_amount), Some(currency)) = (price.unit_amount, price.currency) else {
            return Err(BillingError::PriceNotFound(price_id));
        };

        Ok(Some(PaymentDetails {
            next_payment_date,
            amount: minor_to_major(unit_amount),
            currency,
        }))
    }
}
