//! Stripe Checkout Integration
//!
//! Hosted checkout for the premium subscription. The user is redirected to
//! the session URL and comes back to `/payment/success` or `/payment/failed`.

use crate::config::PremiumPolicy;
use crate::error::{BillingError, Result};
use crate::model::{CheckoutMode, CheckoutParams, CheckoutSession, LineItem};
use crate::service::BillingService;

impl BillingService {
    /// Create a subscription checkout session for `email` and mark the user premium
    ///
    /// Under [`PremiumPolicy::OnCheckoutCreated`] the flag is set as soon as the
    /// session exists, whether or not the customer goes on to pay. Under
    /// [`PremiumPolicy::OnPaymentConfirmed`] it is left to the webhook.
    pub async fn create_checkout_session(&self, email: &str) -> Result<CheckoutSession> {
        let result = self.checkout(email).await;
        if let Err(ref e) = result {
            tracing::error!(email, error = %e, "Error creating Stripe checkout session");
        }
        result
    }

    async fn checkout(&self, email: &str) -> Result<CheckoutSession> {
        let params = CheckoutParams {
            customer_email: email.to_string(),
            mode: CheckoutMode::Subscription,
            line_items: vec![LineItem {
                price_id: self.config.price_id.clone(),
                quantity: 1,
            }],
            success_url: self.config.success_url(),
            cancel_url: self.config.cancel_url(),
        };

        let session = self.provider.create_checkout_session(&params).await?;

        tracing::info!(
            session_id = %session.id,
            email,
            provider = self.provider.name(),
            "Created checkout session"
        );

        if self.config.premium_policy == PremiumPolicy::OnPaymentConfirmed {
            return Ok(session);
        }

        let user = self
            .users
            .find_by_email(email)
            .await?
            .ok_or_else(|| BillingError::UserNotFound(email.to_string()))?;

        self.users.set_premium(&user.id, true).await?;

        tracing::info!(user_id = %user.id, "Marked user premium");

        Ok(session)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use async_trait::async_trait;

    use super::*;
    use crate::config::BillingConfig;
    use crate::model::User;
    use crate::provider::MockPaymentProvider;
    use crate::users::{MemoryUserStore, UserStore};

    /// Counts premium writes on top of a memory store
    struct CountingUserStore {
        inner: MemoryUserStore,
        writes: AtomicUsize,
    }

    #[async_trait]
    impl UserStore for CountingUserStore {
        async fn find_by_email(&self, email: &str) -> Result<Option<User>> {
            self.inner.find_by_email(email).await
        }

        async fn set_premium(&self, user_id: &str, is_premium: bool) -> Result<()> {
            self.writes.fetch_add(1, Ordering::SeqCst);
            self.inner.set_premium(user_id, is_premium).await
        }
    }

    fn config() -> BillingConfig {
        BillingConfig::new("sk_test_123", "price_premium").unwrap()
    }

    fn store_with(users: Vec<User>) -> Arc<CountingUserStore> {
        Arc::new(CountingUserStore {
            inner: MemoryUserStore::with_users(users),
            writes: AtomicUsize::new(0),
        })
    }

    #[tokio::test]
    async fn test_checkout_requests_subscription_and_marks_premium() {
        let provider = Arc::new(MockPaymentProvider::new());
        let users = store_with(vec![User::new("u_1", "ada@example.com")]);
        let service = BillingService::new(provider.clone(), users.clone(), config());

        let session = service.create_checkout_session("ada@example.com").await.unwrap();
        assert!(session.id.starts_with("cs_test_"));
        assert_eq!(session.customer_email, "ada@example.com");

        let calls = provider.checkout_calls().await;
        assert_eq!(calls.len(), 1);
        let call = &calls[0];
        assert_eq!(call.mode, CheckoutMode::Subscription);
        assert_eq!(
            call.line_items,
            vec![LineItem {
                price_id: "price_premium".into(),
                quantity: 1
            }]
        );
        assert_eq!(call.success_url, "https://product-sphere.vercel.app/payment/success");
        assert_eq!(call.cancel_url, "https://product-sphere.vercel.app/payment/failed");

        assert_eq!(users.writes.load(Ordering::SeqCst), 1);
        assert!(users.inner.get("u_1").await.unwrap().is_premium);
    }

    #[tokio::test]
    async fn test_checkout_unknown_user_skips_update() {
        let provider = Arc::new(MockPaymentProvider::new());
        let users = store_with(vec![User::new("u_1", "ada@example.com")]);
        let service = BillingService::new(provider.clone(), users.clone(), config());

        let err = service.create_checkout_session("ghost@example.com").await.unwrap_err();
        assert!(matches!(err, BillingError::UserNotFound(_)));
        assert_eq!(users.writes.load(Ordering::SeqCst), 0);
        assert!(!users.inner.get("u_1").await.unwrap().is_premium);
    }

    #[tokio::test]
    async fn test_checkout_provider_failure_leaves_user_untouched() {
        let provider = Arc::new(MockPaymentProvider::new().failing("card network down"));
        let users = store_with(vec![User::new("u_1", "ada@example.com")]);
        let service = BillingService::new(provider, users.clone(), config());

        let err = service.create_checkout_session("ada@example.com").await.unwrap_err();
        assert!(err.is_retryable());
        assert_eq!(users.writes.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_checkout_payment_confirmed_policy_defers_premium() {
        let provider = Arc::new(MockPaymentProvider::new());
        let users = store_with(vec![User::new("u_1", "ada@example.com")]);
        let config = config().with_premium_policy(PremiumPolicy::OnPaymentConfirmed);
        let service = BillingService::new(provider.clone(), users.clone(), config);

        service.create_checkout_session("ada@example.com").await.unwrap();
        assert_eq!(provider.checkout_calls().await.len(), 1);
        assert_eq!(users.writes.load(Ordering::SeqCst), 0);
    }
}
