//! Stripe Webhook Handling
//!
//! Keeps the premium flag in step with the subscription lifecycle.
//!
//! Only the event envelope and the few object fields used here are
//! deserialized, so payloads from newer Stripe API versions still parse.

use chrono::Utc;
use hmac::{Hmac, Mac};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use sha2::Sha256;

use crate::error::{BillingError, Result};
use crate::service::BillingService;

type HmacSha256 = Hmac<Sha256>;

/// Maximum age of a signed payload, in seconds
pub const SIGNATURE_TOLERANCE_SECS: i64 = 300;

/// A verified Stripe event
#[derive(Clone, Debug, Deserialize)]
pub struct Event {
    pub id: String,

    #[serde(rename = "type")]
    pub event_type: String,

    pub data: EventData,
}

#[derive(Clone, Debug, Deserialize)]
pub struct EventData {
    pub object: serde_json::Value,
}

#[derive(Deserialize)]
struct CheckoutSessionObject {
    id: String,
    customer_email: Option<String>,
    customer_details: Option<CustomerDetails>,
}

#[derive(Deserialize)]
struct CustomerDetails {
    email: Option<String>,
}

#[derive(Deserialize)]
struct SubscriptionObject {
    id: String,
    customer: CustomerRef,
}

/// `customer` is an id, or the full object when expanded
#[derive(Deserialize)]
#[serde(untagged)]
enum CustomerRef {
    Id(String),
    Expanded { id: String },
}

impl CustomerRef {
    fn into_id(self) -> String {
        match self {
            CustomerRef::Id(id) | CustomerRef::Expanded { id } => id,
        }
    }
}

/// Parsed webhook event
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum WebhookEvent {
    /// Checkout completed - the customer paid
    CheckoutCompleted {
        session_id: String,
        customer_email: Option<String>,
    },

    /// Subscription ended - revoke premium
    SubscriptionCancelled {
        subscription_id: String,
        customer_id: String,
    },

    /// Unhandled event type
    Other { event_type: String },
}

/// Check a `stripe-signature` header against the raw payload
///
/// The header carries `t=<unix seconds>` and one or more `v1=<hex hmac>`
/// entries; any matching `v1` within the tolerance window is accepted.
pub fn verify_signature(payload: &str, header: &str, secret: &str, now: i64) -> Result<()> {
    let mut timestamp = None;
    let mut signatures = Vec::new();

    for part in header.split(',') {
        match part.trim().split_once('=') {
            Some(("t", value)) => timestamp = value.parse::<i64>().ok(),
            Some(("v1", value)) => signatures.push(value),
            _ => {}
        }
    }

    let timestamp = timestamp
        .ok_or_else(|| BillingError::WebhookSignature("missing timestamp".into()))?;
    if signatures.is_empty() {
        return Err(BillingError::WebhookSignature("missing v1 signature".into()));
    }
    if (now - timestamp).abs() > SIGNATURE_TOLERANCE_SECS {
        return Err(BillingError::WebhookSignature(format!(
            "timestamp {timestamp} outside tolerance"
        )));
    }

    let mut mac = HmacSha256::new_from_slice(secret.as_bytes())
        .map_err(|e| BillingError::Config(format!("invalid webhook secret: {e}")))?;
    mac.update(format!("{timestamp}.{payload}").as_bytes());

    let matched = signatures.iter().any(|sig| {
        hex::decode(sig).is_ok_and(|bytes| mac.clone().verify_slice(&bytes).is_ok())
    });

    if matched {
        Ok(())
    } else {
        Err(BillingError::WebhookSignature("no matching v1 signature".into()))
    }
}

/// Build the `stripe-signature` header Stripe would send for `payload`
///
/// Used to replay captured events against a local server.
pub fn signature_header(payload: &str, secret: &str, timestamp: i64) -> Result<String> {
    let mut mac = HmacSha256::new_from_slice(secret.as_bytes())
        .map_err(|e| BillingError::Config(format!("invalid webhook secret: {e}")))?;
    mac.update(format!("{timestamp}.{payload}").as_bytes());
    Ok(format!(
        "t={timestamp},v1={}",
        hex::encode(mac.finalize().into_bytes())
    ))
}

/// Webhook handler
pub struct WebhookHandler {
    service: BillingService,
}

impl WebhookHandler {
    pub fn new(service: BillingService) -> Self {
        Self { service }
    }

    /// Verify webhook signature and parse event
    pub fn parse_event(&self, payload: &str, signature: &str) -> Result<Event> {
        let secret = self
            .service
            .config()
            .webhook_secret
            .as_deref()
            .ok_or_else(|| BillingError::Config("STRIPE_WEBHOOK_SECRET not set".into()))?;

        verify_signature(payload, signature, secret, Utc::now().timestamp())?;

        serde_json::from_str(payload).map_err(|e| BillingError::WebhookParse(e.to_string()))
    }

    /// Process a verified webhook event
    pub async fn handle(&self, event: Event) -> Result<WebhookEvent> {
        tracing::info!(event_id = %event.id, event_type = %event.event_type, "Processing Stripe webhook");

        let parsed = parse_webhook_event(&event)?;
        self.apply(&parsed).await?;
        Ok(parsed)
    }

    /// Apply a parsed event to the user directory
    pub async fn apply(&self, event: &WebhookEvent) -> Result<()> {
        match event {
            WebhookEvent::CheckoutCompleted {
                session_id,
                customer_email,
            } => {
                let Some(email) = customer_email else {
                    tracing::warn!(session_id = %session_id, "Completed checkout has no customer email");
                    return Ok(());
                };
                self.set_premium_by_email(email, true).await?;
            }

            WebhookEvent::SubscriptionCancelled {
                subscription_id,
                customer_id,
            } => {
                let provider = self.service.provider();

                let remaining = provider.list_active_subscriptions(customer_id).await?;
                if !remaining.is_empty() {
                    tracing::info!(
                        subscription_id = %subscription_id,
                        customer_id = %customer_id,
                        active = remaining.len(),
                        "Customer still has an active subscription, keeping premium"
                    );
                    return Ok(());
                }

                let customer = provider.retrieve_customer(customer_id).await?;
                let Some(email) = customer.email else {
                    tracing::warn!(
                        subscription_id = %subscription_id,
                        customer_id = %customer_id,
                        "Cancelled subscription's customer has no email"
                    );
                    return Ok(());
                };
                self.set_premium_by_email(&email, false).await?;
            }

            WebhookEvent::Other { event_type } => {
                tracing::debug!(event_type = %event_type, "Unhandled webhook event");
            }
        }

        Ok(())
    }

    async fn set_premium_by_email(&self, email: &str, is_premium: bool) -> Result<()> {
        let users = self.service.users();
        match users.find_by_email(email).await? {
            Some(user) => {
                users.set_premium(&user.id, is_premium).await?;
                tracing::info!(user_id = %user.id, is_premium, "Updated premium flag");
            }
            None => {
                // Stripe customers can exist without a local account
                tracing::warn!(email, "No user for webhook customer email");
            }
        }
        Ok(())
    }
}

/// Deserialize the event's object, checking its `object` tag first
fn event_object<T: DeserializeOwned>(event: &Event, expected: &str) -> Result<T> {
    let kind = event.data.object.get("object").and_then(serde_json::Value::as_str);
    if kind != Some(expected) {
        return Err(BillingError::WebhookParse(format!(
            "{} carries a {} object, expected {expected}",
            event.event_type,
            kind.unwrap_or("untyped")
        )));
    }

    T::deserialize(&event.data.object).map_err(|e| BillingError::WebhookParse(e.to_string()))
}

/// Parse Stripe event into our event type
fn parse_webhook_event(event: &Event) -> Result<WebhookEvent> {
    match event.event_type.as_str() {
        "checkout.session.completed" => {
            let session: CheckoutSessionObject = event_object(event, "checkout.session")?;
            let customer_email = session
                .customer_email
                .or_else(|| session.customer_details.and_then(|details| details.email));

            Ok(WebhookEvent::CheckoutCompleted {
                session_id: session.id,
                customer_email,
            })
        }

        "customer.subscription.deleted" => {
            let sub: SubscriptionObject = event_object(event, "subscription")?;
            Ok(WebhookEvent::SubscriptionCancelled {
                subscription_id: sub.id,
                customer_id: sub.customer.into_id(),
            })
        }

        other => Ok(WebhookEvent::Other {
            event_type: other.to_string(),
        }),
    }
}
