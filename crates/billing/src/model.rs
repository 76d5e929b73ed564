//! Billing Domain Types
//!
//! Provider-agnostic views of the Stripe objects the billing flows touch,
//! plus the local `User` record.

use chrono::DateTime;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::{BillingError, Result};

/// A local user account
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: String,
    pub email: String,
    pub is_premium: bool,
}

impl User {
    pub fn new(id: impl Into<String>, email: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            email: email.into(),
            is_premium: false,
        }
    }
}

/// The authenticated caller, as reported by the session
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Principal {
    pub id: Option<String>,
    pub email: Option<String>,
}

impl Principal {
    pub fn new(id: impl Into<String>, email: impl Into<String>) -> Self {
        Self {
            id: Some(id.into()),
            email: Some(email.into()),
        }
    }
}

/// Checkout session mode
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CheckoutMode {
    Subscription,
}

/// One priced line of a checkout
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineItem {
    pub price_id: String,
    pub quantity: u64,
}

/// Parameters for a hosted checkout session
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckoutParams {
    pub customer_email: String,
    pub mode: CheckoutMode,
    pub line_items: Vec<LineItem>,
    pub success_url: String,
    pub cancel_url: String,
}

/// A created hosted checkout session
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutSession {
    /// Stripe session ID
    pub id: String,

    /// URL to redirect user to
    pub url: String,

    pub customer_email: String,
}

/// A provider-side customer record
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Customer {
    pub id: String,
    pub email: Option<String>,
}

/// A provider-side subscription
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Subscription {
    pub id: String,
    pub customer_id: String,

    /// End of the current billing period, epoch seconds
    pub current_period_end: i64,

    /// Price of the first line item
    pub price_id: Option<String>,
}

/// A provider-side price
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Price {
    pub id: String,

    /// Amount in minor currency units (cents)
    pub unit_amount: Option<i64>,

    /// ISO currency code, lowercase
    pub currency: Option<String>,
}

/// Next charge for the caller's active subscription
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentDetails {
    /// `MM/DD/YYYY`
    pub next_payment_date: String,

    /// Major currency units
    #[serde(with = "rust_decimal::serde::float")]
    pub amount: Decimal,

    pub currency: String,
}

/// Format an epoch-seconds timestamp as a zero-padded `MM/DD/YYYY` UTC date
pub fn format_billing_date(epoch_seconds: i64) -> Result<String> {
    let date = DateTime::from_timestamp(epoch_seconds, 0).ok_or_else(|| {
        BillingError::Provider(format!("period end {epoch_seconds} is out of range"))
    })?;
    Ok(date.format("%m/%d/%Y").to_string())
}

/// Convert minor currency units to major units (1999 -> 19.99)
pub fn minor_to_major(unit_amount: i64) -> Decimal {
    Decimal::new(unit_amount, 2)
}
