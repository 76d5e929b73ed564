//! HTTP Handlers

use axum::{
    Json,
    extract::State,
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};

use sphere_billing::{BillingService, PaymentDetails, WebhookHandler};

use crate::session::SessionIdentity;
use crate::state::AppState;

// ============================================================================
// Response Types
// ============================================================================

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
    pub stripe_configured: bool,
    pub user_store: &'static str,
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub code: String,
}

#[derive(Debug, Deserialize)]
pub struct CheckoutRequest {
    pub email: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutResponse {
    pub session_id: String,
    pub url: String,
}

#[derive(Debug, Serialize)]
pub struct PortalResponse {
    pub url: String,
}

fn error_response(status: StatusCode, error: &str, code: &str) -> Response {
    (
        status,
        Json(ErrorResponse {
            error: error.into(),
            code: code.into(),
        }),
    )
        .into_response()
}

fn billing(state: &AppState) -> Result<&BillingService, Response> {
    state.billing.as_ref().ok_or_else(|| {
        error_response(
            StatusCode::SERVICE_UNAVAILABLE,
            "Payments not configured",
            "PAYMENTS_DISABLED",
        )
    })
}

// ============================================================================
// Handlers
// ============================================================================

/// Health check endpoint
pub async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy",
        version: env!("CARGO_PKG_VERSION"),
        stripe_configured: state.billing.is_some(),
        user_store: state.user_store,
    })
}

/// Create Stripe checkout session
pub async fn create_checkout(
    State(state): State<AppState>,
    Json(payload): Json<CheckoutRequest>,
) -> Result<Json<CheckoutResponse>, Response> {
    let billing = billing(&state)?;

    let email = payload.email.trim();
    if email.is_empty() {
        return Err(error_response(
            StatusCode::BAD_REQUEST,
            "Email is required",
            "INVALID_EMAIL",
        ));
    }

    let session = billing
        .create_checkout_session(email)
        .await
        .map_err(IntoResponse::into_response)?;

    Ok(Json(CheckoutResponse {
        session_id: session.id,
        url: session.url,
    }))
}

/// Billing portal link for the signed-in user
pub async fn create_portal_link(
    State(state): State<AppState>,
    SessionIdentity(identity): SessionIdentity,
) -> Result<Json<PortalResponse>, Response> {
    let billing = billing(&state)?;

    let url = billing
        .create_customer_portal_link(&identity)
        .await
        .map_err(IntoResponse::into_response)?;

    Ok(Json(PortalResponse { url }))
}

/// Next payment for the signed-in user
///
/// Renders `null` for anything short of an active subscription with a
/// complete price, including failures (already logged by the service).
pub async fn next_payment(
    State(state): State<AppState>,
    SessionIdentity(identity): SessionIdentity,
) -> Json<Option<PaymentDetails>> {
    let Some(billing) = state.billing.as_ref() else {
        return Json(None);
    };

    Json(billing.next_payment_details(&identity).await.ok().flatten())
}

/// Stripe webhook handler
pub async fn stripe_webhook(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: String,
) -> Result<StatusCode, Response> {
    let billing = billing(&state)?;

    let signature = headers
        .get("stripe-signature")
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| {
            error_response(
                StatusCode::BAD_REQUEST,
                "Missing Stripe signature",
                "MISSING_SIGNATURE",
            )
        })?;

    let handler = WebhookHandler::new(billing.clone());

    let event = handler.parse_event(&body, signature).map_err(|e| {
        tracing::warn!("Webhook signature failed: {}", e);
        e.into_response()
    })?;

    handler.handle(event).await.map_err(|e| {
        tracing::error!("Webhook processing error: {}", e);
        e.into_response()
    })?;

    Ok(StatusCode::OK)
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use axum::{
        Router,
        body::{Body, to_bytes},
        http::{Method, Request},
    };
    use serde_json::{Value, json};
    use sphere_billing::{
        BillingConfig, Customer, MemoryUserStore, MockPaymentProvider, Price, Subscription, User,
    };
    use tower::ServiceExt;

    use super::*;
    use crate::router;
    use crate::session::{USER_EMAIL_HEADER, USER_ID_HEADER};

    fn provider() -> MockPaymentProvider {
        MockPaymentProvider::new()
            .with_customer(Customer {
                id: "cus_ada".into(),
                email: Some("ada@example.com".into()),
            })
            .with_subscription(Subscription {
                id: "sub_1".into(),
                customer_id: "cus_ada".into(),
                current_period_end: 1_717_200_000,
                price_id: Some("price_premium".into()),
            })
            .with_price(Price {
                id: "price_premium".into(),
                unit_amount: Some(1999),
                currency: Some("usd".into()),
            })
    }

    fn app(provider: MockPaymentProvider) -> (Router, Arc<MemoryUserStore>) {
        let users = Arc::new(MemoryUserStore::with_users([User::new("u_1", "ada@example.com")]));
        let config = BillingConfig::new("sk_test_123", "price_premium").unwrap();
        let state = AppState {
            billing: Some(BillingService::new(Arc::new(provider), users.clone(), config)),
            user_store: "memory",
        };
        (router(state), users)
    }

    fn signed_in(method: Method, uri: &str) -> Request<Body> {
        Request::builder()
            .method(method)
            .uri(uri)
            .header(USER_ID_HEADER, "u_1")
            .header(USER_EMAIL_HEADER, "ada@example.com")
            .body(Body::empty())
            .unwrap()
    }

    async fn json_body(response: Response) -> Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_health() {
        let state = AppState {
            billing: None,
            user_store: "memory",
        };
        let response = router(state)
            .oneshot(Request::get("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = json_body(response).await;
        assert_eq!(body["stripe_configured"], false);
    }

    #[tokio::test]
    async fn test_checkout_marks_premium() {
        let (app, users) = app(provider());
        let request = Request::post("/api/checkout")
            .header("content-type", "application/json")
            .body(Body::from(json!({ "email": "ada@example.com" }).to_string()))
            .unwrap();

        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let body = json_body(response).await;
        assert!(body["sessionId"].as_str().unwrap().starts_with("cs_test_"));
        assert!(users.get("u_1").await.unwrap().is_premium);
    }

    #[tokio::test]
    async fn test_checkout_unknown_user_is_not_found() {
        let (app, _) = app(provider());
        let request = Request::post("/api/checkout")
            .header("content-type", "application/json")
            .body(Body::from(json!({ "email": "ghost@example.com" }).to_string()))
            .unwrap();

        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_eq!(json_body(response).await["code"], "NOT_FOUND");
    }

    #[tokio::test]
    async fn test_portal_requires_session() {
        let (app, _) = app(provider());
        let request = Request::post("/api/billing/portal").body(Body::empty()).unwrap();

        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_portal_link() {
        let (app, _) = app(provider());

        let response = app
            .oneshot(signed_in(Method::POST, "/api/billing/portal"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert!(json_body(response).await["url"].as_str().unwrap().contains("cus_ada"));
    }

    #[tokio::test]
    async fn test_next_payment() {
        let (app, _) = app(provider());

        let response = app
            .oneshot(signed_in(Method::GET, "/api/billing/next-payment"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            json_body(response).await,
            json!({ "nextPaymentDate": "06/01/2024", "amount": 19.99, "currency": "usd" })
        );
    }

    #[tokio::test]
    async fn test_next_payment_failure_renders_null() {
        let (app, _) = app(MockPaymentProvider::new().failing("503"));

        let response = app
            .oneshot(signed_in(Method::GET, "/api/billing/next-payment"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(json_body(response).await, Value::Null);
    }

    #[tokio::test]
    async fn test_webhook_requires_signature() {
        let (app, _) = app(provider());
        let request = Request::post("/webhook/stripe").body(Body::from("{}")).unwrap();

        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }
}
