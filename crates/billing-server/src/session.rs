//! Session Principal Extraction
//!
//! Authentication runs in front of this service; the auth proxy forwards the
//! signed-in user as `x-user-id` / `x-user-email`.

use std::convert::Infallible;

use axum::{extract::FromRequestParts, http::request::Parts};
use sphere_billing::{Principal, StaticIdentity};

pub const USER_ID_HEADER: &str = "x-user-id";
pub const USER_EMAIL_HEADER: &str = "x-user-email";

/// Principal of the current request, anonymous when neither header is present
pub struct SessionIdentity(pub StaticIdentity);

fn header(parts: &Parts, name: &str) -> Option<String> {
    parts
        .headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(String::from)
}

impl<S> FromRequestParts<S> for SessionIdentity
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let id = header(parts, USER_ID_HEADER);
        let email = header(parts, USER_EMAIL_HEADER);

        let principal = (id.is_some() || email.is_some()).then_some(Principal { id, email });
        Ok(Self(principal.into()))
    }
}
