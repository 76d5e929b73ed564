//! Billing Error Types

use thiserror::Error;

/// Result type alias
pub type Result<T> = std::result::Result<T, BillingError>;

/// Coarse classification of a [`BillingError`]
///
/// Callers branch on the kind to decide whether to surface or suppress a
/// failure; the full error (and its source) stays available for logging.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ErrorKind {
    /// No authenticated principal, or the principal is incomplete
    Unauthenticated,
    /// A user, customer, subscription or price does not exist
    NotFound,
    /// Payment provider or network failure
    Provider,
    /// User database failure
    Store,
    /// Missing or malformed configuration
    Config,
    /// Webhook signature or payload rejected
    Webhook,
}

impl ErrorKind {
    pub fn as_str(self) -> &'static str {
        match self {
            ErrorKind::Unauthenticated => "UNAUTHENTICATED",
            ErrorKind::NotFound => "NOT_FOUND",
            ErrorKind::Provider => "PROVIDER_ERROR",
            ErrorKind::Store => "STORE_ERROR",
            ErrorKind::Config => "CONFIG_ERROR",
            ErrorKind::Webhook => "WEBHOOK_ERROR",
        }
    }
}

/// Billing-related errors
#[derive(Error, Debug)]
pub enum BillingError {
    /// No principal in the session, or it lacks the field the operation needs
    #[error("User not authenticated: {0}")]
    Unauthenticated(&'static str),

    /// No local user record for the email
    #[error("User not found: {0}")]
    UserNotFound(String),

    /// No provider customer for the email
    #[error("Customer not found: {0}")]
    CustomerNotFound(String),

    /// Customer has no active subscription
    #[error("No active subscription for customer {0}")]
    SubscriptionNotFound(String),

    /// Price missing, or missing its amount or currency
    #[error("Price not found: {0}")]
    PriceNotFound(String),

    /// Stripe API error
    #[error("Stripe error: {0}")]
    Stripe(#[from] stripe::StripeError),

    /// Provider returned something unusable
    #[error("Provider error: {0}")]
    Provider(String),

    /// Database error
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Storage error outside the database driver
    #[error("Storage error: {0}")]
    Storage(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Webhook signature verification failed
    #[error("Webhook signature invalid: {0}")]
    WebhookSignature(String),

    /// Webhook payload parsing failed
    #[error("Webhook parse error: {0}")]
    WebhookParse(String),
}

impl BillingError {
    /// Classify this error
    pub fn kind(&self) -> ErrorKind {
        match self {
            BillingError::Unauthenticated(_) => ErrorKind::Unauthenticated,
            BillingError::UserNotFound(_)
            | BillingError::CustomerNotFound(_)
            | BillingError::SubscriptionNotFound(_)
            | BillingError::PriceNotFound(_) => ErrorKind::NotFound,
            BillingError::Stripe(_) | BillingError::Provider(_) => ErrorKind::Provider,
            BillingError::Database(_) | BillingError::Storage(_) => ErrorKind::Store,
            BillingError::Config(_) => ErrorKind::Config,
            BillingError::WebhookSignature(_) | BillingError::WebhookParse(_) => ErrorKind::Webhook,
        }
    }

    /// Check if this error is retryable
    pub fn is_retryable(&self) -> bool {
        matches!(self.kind(), ErrorKind::Provider | ErrorKind::Store)
    }

    /// Get user-friendly message
    pub fn user_message(&self) -> &str {
        match self {
            BillingError::Unauthenticated(_) => "Please sign in to manage billing.",
            BillingError::UserNotFound(_) => "No account found for this email.",
            BillingError::CustomerNotFound(_) => "No billing account found.",
            BillingError::SubscriptionNotFound(_) => "No active subscription found.",
            BillingError::PriceNotFound(_) => "Pricing information is unavailable.",
            BillingError::Stripe(_) | BillingError::Provider(_) => {
                "Payment processing failed. Please try again."
            }
            BillingError::Config(_) => "Service configuration error.",
            _ => "An error occurred processing your request.",
        }
    }
}

#[cfg(feature = "axum-handlers")]
mod response {
    use axum::{
        Json,
        http::StatusCode,
        response::{IntoResponse, Response},
    };
    use serde::Serialize;

    use super::{BillingError, ErrorKind};

    #[derive(Serialize)]
    struct ErrorBody<'a> {
        error: &'a str,
        code: &'static str,
    }

    impl ErrorKind {
        pub fn status(self) -> StatusCode {
            match self {
                ErrorKind::Unauthenticated => StatusCode::UNAUTHORIZED,
                ErrorKind::NotFound => StatusCode::NOT_FOUND,
                ErrorKind::Provider => StatusCode::BAD_GATEWAY,
                ErrorKind::Webhook => StatusCode::BAD_REQUEST,
                ErrorKind::Store | ErrorKind::Config => StatusCode::INTERNAL_SERVER_ERROR,
            }
        }
    }

    impl IntoResponse for BillingError {
        fn into_response(self) -> Response {
            let kind = self.kind();
            let body = ErrorBody {
                error: self.user_message(),
                code: kind.as_str(),
            };
            (kind.status(), Json(body)).into_response()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_found_kinds() {
        assert_eq!(BillingError::UserNotFound("a@b.c".into()).kind(), ErrorKind::NotFound);
        assert_eq!(BillingError::PriceNotFound("price_1".into()).kind(), ErrorKind::NotFound);
        assert!(!BillingError::CustomerNotFound("a@b.c".into()).is_retryable());
    }

    #[test]
    fn test_provider_errors_are_retryable() {
        let err = BillingError::Provider("timeout".into());
        assert_eq!(err.kind(), ErrorKind::Provider);
        assert!(err.is_retryable());
        assert_eq!(err.kind().as_str(), "PROVIDER_ERROR");
    }

    #[cfg(feature = "axum-handlers")]
    #[test]
    fn test_kind_status() {
        use axum::http::StatusCode;

        let kind = BillingError::Unauthenticated("no session").kind();
        assert_eq!(kind.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(kind.as_str(), "UNAUTHENTICATED");
        assert_eq!(ErrorKind::Webhook.status(), StatusCode::BAD_REQUEST);
        assert_eq!(ErrorKind::Provider.status(), StatusCode::BAD_GATEWAY);
    }
}
