//! Payment Gateway Adapter
//!
//! The gateway is an external system of record consumed through a narrow
//! trait: create a charge intent, look up a coupon. Concrete adapter:
//! Stripe over HTTPS (`stripe::StripeGateway`).

pub mod stripe;

pub use stripe::StripeGateway;

use async_trait::async_trait;

use crate::shared::error::Result;

/// An in-progress, not-yet-confirmed payment at the gateway.
///
/// The client secret is the opaque handle the caller uses to complete the
/// charge out of band.
#[derive(Debug, Clone)]
pub struct ChargeIntent {
    pub client_secret: String,
}

/// Coupon state as the gateway reports it.
#[derive(Debug, Clone)]
pub struct GatewayCoupon {
    pub valid: bool,
    pub percent_off: Option<f64>,
}

/// Gateway operations used by the payment workflow.
///
/// Implementations may be called concurrently without coordination; every
/// call should be bounded by a timeout and map transport failures to
/// `PlatformError::Upstream`.
#[async_trait]
pub trait PaymentGateway: Send + Sync {
    /// Create a charge intent for the given amount in cents.
    async fn create_charge_intent(&self, amount_cents: i64) -> Result<ChargeIntent>;

    /// Look up a coupon by code. `Ok(None)` means the gateway does not know
    /// the code; transport/API failures are errors.
    async fn retrieve_coupon(&self, code: &str) -> Result<Option<GatewayCoupon>>;
}
