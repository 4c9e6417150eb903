//! Stripe Gateway Adapter
//!
//! Thin HTTPS client over the two Stripe endpoints the platform uses:
//! `POST /v1/payment_intents` and `GET /v1/coupons/{code}`.

use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;

use crate::shared::error::{PlatformError, Result};
use super::{ChargeIntent, GatewayCoupon, PaymentGateway};

const STRIPE_API_BASE: &str = "https://api.stripe.com";

pub struct StripeGateway {
    http: reqwest::Client,
    secret_key: String,
    base_url: String,
}

#[derive(Debug, Deserialize)]
struct PaymentIntentResponse {
    client_secret: String,
}

#[derive(Debug, Deserialize)]
struct CouponResponse {
    #[serde(default)]
    valid: bool,
    percent_off: Option<f64>,
}

impl StripeGateway {
    /// `timeout` bounds every gateway call; a timeout surfaces as a
    /// retryable upstream failure, never hangs a request.
    pub fn new(secret_key: impl Into<String>, timeout: Duration) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| PlatformError::internal(format!("HTTP client init failed: {}", e)))?;
        Ok(Self {
            http,
            secret_key: secret_key.into(),
            base_url: STRIPE_API_BASE.to_string(),
        })
    }

    /// Point the adapter at a different base URL (local gateway stub).
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }
}

#[async_trait]
impl PaymentGateway for StripeGateway {
    async fn create_charge_intent(&self, amount_cents: i64) -> Result<ChargeIntent> {
        let params = [
            ("amount", amount_cents.to_string()),
            ("currency", "usd".to_string()),
            ("payment_method_types[]", "card".to_string()),
        ];

        let response = self.http
            .post(format!("{}/v1/payment_intents", self.base_url))
            .bearer_auth(&self.secret_key)
            .form(&params)
            .send()
            .await
            .map_err(|e| PlatformError::upstream(format!("Payment gateway unreachable: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            return Err(PlatformError::upstream(format!(
                "Payment intent creation failed with status {}", status
            )));
        }

        let intent: PaymentIntentResponse = response.json().await
            .map_err(|e| PlatformError::upstream(format!("Malformed gateway response: {}", e)))?;

        Ok(ChargeIntent { client_secret: intent.client_secret })
    }

    async fn retrieve_coupon(&self, code: &str) -> Result<Option<GatewayCoupon>> {
        let response = self.http
            .get(format!("{}/v1/coupons/{}", self.base_url, code))
            .bearer_auth(&self.secret_key)
            .send()
            .await
            .map_err(|e| PlatformError::upstream(format!("Payment gateway unreachable: {}", e)))?;

        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !response.status().is_success() {
            let status = response.status();
            return Err(PlatformError::upstream(format!(
                "Coupon lookup failed with status {}", status
            )));
        }

        let coupon: CouponResponse = response.json().await
            .map_err(|e| PlatformError::upstream(format!("Malformed gateway response: {}", e)))?;

        Ok(Some(GatewayCoupon {
            valid: coupon.valid,
            percent_off: coupon.percent_off,
        }))
    }
}
