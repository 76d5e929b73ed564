//! Application State

use sphere_billing::BillingService;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    /// Billing flows (optional - None if Stripe is not configured)
    pub billing: Option<BillingService>,

    /// Which user directory backs the billing flows
    pub user_store: &'static str,
}
