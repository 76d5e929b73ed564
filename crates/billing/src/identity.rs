//! Session Identity
//!
//! Who is calling. Authentication itself happens upstream; the billing
//! flows only ask for the current principal.

use async_trait::async_trait;

use crate::error::Result;
use crate::model::Principal;

/// Source of the current principal
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// The authenticated principal, or `None` for an anonymous caller
    async fn current_principal(&self) -> Result<Option<Principal>>;
}

/// A principal resolved ahead of time (per request, or fixed in tests)
#[derive(Clone, Debug, Default)]
pub struct StaticIdentity(Option<Principal>);

impl StaticIdentity {
    pub fn authenticated(principal: Principal) -> Self {
        Self(Some(principal))
    }

    pub fn anonymous() -> Self {
        Self(None)
    }
}

impl From<Option<Principal>> for StaticIdentity {
    fn from(principal: Option<Principal>) -> Self {
        Self(principal)
    }
}

#[async_trait]
impl IdentityProvider for StaticIdentity {
    async fn current_principal(&self) -> Result<Option<Principal>> {
        Ok(self.0.clone())
    }
}
