//! Coupon & Charge-Intent Workflow
//!
//! Server-side half of the payment flow: coupon validation and charge-intent
//! creation. The coupon is always revalidated here; a client-asserted
//! discount is never trusted.

use std::sync::Arc;

use crate::gateway::{ChargeIntent, PaymentGateway};
use crate::shared::error::{PlatformError, Result};

/// Result of a coupon check, as exposed to clients.
#[derive(Debug, Clone, PartialEq)]
pub struct CouponValidation {
    pub valid: bool,
    pub discount_percent: Option<f64>,
}

impl CouponValidation {
    fn invalid() -> Self {
        Self { valid: false, discount_percent: None }
    }
}

pub struct PaymentService {
    gateway: Arc<dyn PaymentGateway>,
}

impl PaymentService {
    pub fn new(gateway: Arc<dyn PaymentGateway>) -> Self {
        Self { gateway }
    }

    /// Check a coupon code against the gateway.
    ///
    /// Never fails toward the caller: an unknown code, an invalid coupon, or
    /// a gateway failure all come back as `{valid: false}`.
    pub async fn validate_coupon(&self, code: &str) -> CouponValidation {
        match self.gateway.retrieve_coupon(code).await {
            Ok(Some(coupon)) if coupon.valid => CouponValidation {
                valid: true,
                discount_percent: coupon.percent_off,
            },
            Ok(_) => CouponValidation::invalid(),
            Err(e) => {
                tracing::warn!(coupon = %code, error = %e, "Coupon validation failed upstream");
                CouponValidation::invalid()
            }
        }
    }

    /// Create a charge intent for `amount_cents`, applying `coupon` if given.
    ///
    /// A supplied coupon is revalidated against the gateway first; an invalid
    /// code fails with `InvalidCoupon` before any intent is created. The
    /// validated discount is applied server-side to the supplied amount.
    pub async fn create_charge_intent(
        &self,
        amount_cents: i64,
        coupon: Option<&str>,
    ) -> Result<ChargeIntent> {
        if amount_cents <= 0 {
            return Err(PlatformError::validation("Amount must be positive"));
        }

        let mut charge_amount = amount_cents;
        if let Some(code) = coupon {
            let validation = self.validate_coupon(code).await;
            if !validation.valid {
                return Err(PlatformError::invalid_coupon(code));
            }
            if let Some(percent) = validation.discount_percent {
                charge_amount = apply_discount(amount_cents, percent);
            }
        }

        self.gateway.create_charge_intent(charge_amount).await
    }
}

/// Discounted amount in cents, rounded down, floored at zero.
fn apply_discount(amount_cents: i64, percent_off: f64) -> i64 {
    let discounted = (amount_cents as f64) * (1.0 - percent_off / 100.0);
    (discounted.floor() as i64).max(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gateway::GatewayCoupon;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Scripted gateway that counts intent calls.
    struct MockGateway {
        coupon: Result<Option<GatewayCoupon>>,
        intent_calls: AtomicUsize,
    }

    impl MockGateway {
        fn with_coupon(coupon: Result<Option<GatewayCoupon>>) -> Self {
            Self { coupon, intent_calls: AtomicUsize::new(0) }
        }
    }

    #[async_trait]
    impl PaymentGateway for MockGateway {
        async fn create_charge_intent(&self, amount_cents: i64) -> Result<ChargeIntent> {
            self.intent_calls.fetch_add(1, Ordering::SeqCst);
            Ok(ChargeIntent { client_secret: format!("pi_secret_{}", amount_cents) })
        }

        async fn retrieve_coupon(&self, _code: &str) -> Result<Option<GatewayCoupon>> {
            match &self.coupon {
                Ok(c) => Ok(c.clone()),
                Err(_) => Err(PlatformError::upstream("gateway down")),
            }
        }
    }

    #[tokio::test]
    async fn test_validate_coupon_valid() {
        let gateway = Arc::new(MockGateway::with_coupon(Ok(Some(GatewayCoupon {
            valid: true,
            percent_off: Some(25.0),
        }))));
        let service = PaymentService::new(gateway);

        let result = service.validate_coupon("SAVE25").await;
        assert!(result.valid);
        assert_eq!(result.discount_percent, Some(25.0));
    }

    #[tokio::test]
    async fn test_validate_coupon_unknown_code() {
        let gateway = Arc::new(MockGateway::with_coupon(Ok(None)));
        let service = PaymentService::new(gateway);

        let result = service.validate_coupon("NOPE").await;
        assert!(!result.valid);
        assert_eq!(result.discount_percent, None);
    }

    #[tokio::test]
    async fn test_validate_coupon_swallows_gateway_failure() {
        let gateway = Arc::new(MockGateway::with_coupon(Err(PlatformError::upstream("down"))));
        let service = PaymentService::new(gateway);

        let result = service.validate_coupon("SAVE25").await;
        assert!(!result.valid);
    }

    #[tokio::test]
    async fn test_invalid_coupon_blocks_intent_creation() {
        let gateway = Arc::new(MockGateway::with_coupon(Ok(Some(GatewayCoupon {
            valid: false,
            percent_off: Some(25.0),
        }))));
        let service = PaymentService::new(gateway.clone());

        let err = service.create_charge_intent(1000, Some("EXPIRED")).await.unwrap_err();
        assert!(matches!(err, PlatformError::InvalidCoupon { .. }));
        assert_eq!(gateway.intent_calls.load(Ordering::SeqCst), 0, "no intent may be created");
    }

    #[tokio::test]
    async fn test_valid_coupon_discounts_server_side() {
        let gateway = Arc::new(MockGateway::with_coupon(Ok(Some(GatewayCoupon {
            valid: true,
            percent_off: Some(25.0),
        }))));
        let service = PaymentService::new(gateway.clone());

        let intent = service.create_charge_intent(1000, Some("SAVE25")).await.unwrap();
        assert_eq!(intent.client_secret, "pi_secret_750");
        assert_eq!(gateway.intent_calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_intent_without_coupon() {
        let gateway = Arc::new(MockGateway::with_coupon(Ok(None)));
        let service = PaymentService::new(gateway.clone());

        let intent = service.create_charge_intent(500, None).await.unwrap();
        assert_eq!(intent.client_secret, "pi_secret_500");
    }

    #[tokio::test]
    async fn test_rejects_non_positive_amount() {
        let gateway = Arc::new(MockGateway::with_coupon(Ok(None)));
        let service = PaymentService::new(gateway.clone());

        assert!(service.create_charge_intent(0, None).await.is_err());
        assert!(service.create_charge_intent(-100, None).await.is_err());
        assert_eq!(gateway.intent_calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_apply_discount_rounding() {
        assert_eq!(apply_discount(1000, 25.0), 750);
        assert_eq!(apply_discount(999, 33.0), 669);
        assert_eq!(apply_discount(100, 100.0), 0);
        assert_eq!(apply_discount(100, 0.0), 100);
    }
}
