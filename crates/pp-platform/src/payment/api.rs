//! Payments API
//!
//! Coupon validation, charge-intent creation, the payment ledger and the
//! reconciliation listing. The ledger append trusts the client-reported
//! transaction; reconciliation is how the gap gets audited.

use axum::{
    extract::{State, Path},
    Json,
};
use utoipa_axum::{router::OpenApiRouter, routes};
use utoipa::ToSchema;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::sync::Arc;
use chrono::{DateTime, Utc};

use crate::payment::entity::Payment;
use crate::payment::repository::PaymentRepository;
use crate::payment::service::PaymentService;
use crate::user::repository::UserRepository;
use crate::auth::admin_gate::require_admin;
use crate::shared::error::PlatformError;
use crate::shared::api_common::CreatedResponse;
use crate::shared::middleware::Authenticated;

/// Coupon validation request
#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ValidateCouponRequest {
    pub code: String,
}

/// Coupon validation response
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ValidateCouponResponse {
    pub valid: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub discount_percent: Option<f64>,
}

/// Charge-intent request
#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateIntentRequest {
    /// Amount in cents, before any discount
    pub amount: i64,

    pub coupon: Option<String>,
}

/// Charge-intent response
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateIntentResponse {
    pub client_secret: String,
}

/// Ledger append request. The payer is the authenticated caller; a body
/// email is not honored.
#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SavePaymentRequest {
    /// Amount charged, in cents
    pub amount: i64,

    /// Gateway transaction reference
    pub transaction_id: String,

    pub coupon: Option<String>,

    pub discount_percent: Option<f64>,

    /// Completion time reported by the client; a late confirmation keeps
    /// the charge date instead of the receipt date
    pub date: Option<DateTime<Utc>>,
}

/// Payment response DTO
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PaymentResponse {
    pub id: String,
    pub user_email: String,
    pub amount: i64,
    pub transaction_id: String,
    pub coupon: Option<String>,
    pub discount_percent: Option<f64>,
    pub date: String,
}

impl From<Payment> for PaymentResponse {
    fn from(p: Payment) -> Self {
        Self {
            id: p.id,
            user_email: p.user_email,
            amount: p.amount,
            transaction_id: p.transaction_id,
            coupon: p.coupon,
            discount_percent: p.discount_percent,
            date: p.date.to_rfc3339(),
        }
    }
}

/// One reconciliation finding: a ledger entry whose user record does not
/// reflect the payment.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ReconciliationEntry {
    pub payment: PaymentResponse,
    /// "missing-user" or "not-subscribed"
    pub finding: String,
}

/// Payments service state
#[derive(Clone)]
pub struct PaymentsState {
    pub payment_service: Arc<PaymentService>,
    pub payment_repo: Arc<PaymentRepository>,
    pub user_repo: Arc<UserRepository>,
}

/// Validate a coupon code
///
/// Always answers 200; an unknown code or an unreachable gateway yields
/// `{valid: false}`.
#[utoipa::path(
    post,
    path = "/validate-coupon",
    tag = "payments",
    operation_id = "postValidateCoupon",
    request_body = ValidateCouponRequest,
    responses(
        (status = 200, description = "Validation result", body = ValidateCouponResponse)
    ),
    security(("bearer_auth" = []))
)]
pub async fn validate_coupon(
    State(state): State<PaymentsState>,
    _auth: Authenticated,
    Json(req): Json<ValidateCouponRequest>,
) -> Result<Json<ValidateCouponResponse>, PlatformError> {
    let result = state.payment_service.validate_coupon(&req.code).await;
    Ok(Json(ValidateCouponResponse {
        valid: result.valid,
        discount_percent: result.discount_percent,
    }))
}

/// Create a charge intent
///
/// A supplied coupon is revalidated server-side; an invalid code is
/// rejected before any intent exists at the gateway.
#[utoipa::path(
    post,
    path = "/create-payment-intent",
    tag = "payments",
    operation_id = "postCreatePaymentIntent",
    request_body = CreateIntentRequest,
    responses(
        (status = 200, description = "Intent created", body = CreateIntentResponse),
        (status = 400, description = "Invalid amount or coupon"),
        (status = 502, description = "Gateway unreachable")
    ),
    security(("bearer_auth" = []))
)]
pub async fn create_payment_intent(
    State(state): State<PaymentsState>,
    auth: Authenticated,
    Json(req): Json<CreateIntentRequest>,
) -> Result<Json<CreateIntentResponse>, PlatformError> {
    let intent = state.payment_service
        .create_charge_intent(req.amount, req.coupon.as_deref())
        .await?;

    tracing::info!(email = %auth.email(), amount = req.amount, "Charge intent created");

    Ok(Json(CreateIntentResponse { client_secret: intent.client_secret }))
}

/// Append a completed payment to the ledger
#[utoipa::path(
    post,
    path = "/save-payment",
    tag = "payments",
    operation_id = "postSavePayment",
    request_body = SavePaymentRequest,
    responses(
        (status = 201, description = "Payment recorded", body = CreatedResponse),
        (status = 400, description = "Validation error"),
        (status = 401, description = "Authentication required")
    ),
    security(("bearer_auth" = []))
)]
pub async fn save_payment(
    State(state): State<PaymentsState>,
    auth: Authenticated,
    Json(req): Json<SavePaymentRequest>,
) -> Result<Json<CreatedResponse>, PlatformError> {
    let amount = req.amount;
    let payment = ledger_entry(auth.email(), req)?;

    let id = payment.id.clone();
    state.payment_repo.insert(&payment).await?;

    tracing::info!(email = %auth.email(), amount, "Payment recorded");

    Ok(Json(CreatedResponse::new(id)))
}

/// Validate a ledger append request and build the entry.
fn ledger_entry(email: &str, req: SavePaymentRequest) -> Result<Payment, PlatformError> {
    if req.amount <= 0 {
        return Err(PlatformError::validation("Amount must be positive"));
    }
    if req.transaction_id.trim().is_empty() {
        return Err(PlatformError::validation("Transaction ID must not be empty"));
    }

    let mut payment = Payment::new(email, req.amount, req.transaction_id.trim());
    if let Some(coupon) = req.coupon {
        payment = payment.with_coupon(coupon, req.discount_percent.unwrap_or(0.0));
    }
    if let Some(date) = req.date {
        payment = payment.with_date(date);
    }
    Ok(payment)
}

/// Payment history for a user (admin)
#[utoipa::path(
    get,
    path = "/payment-history/{email}",
    tag = "payments",
    operation_id = "getPaymentHistory",
    params(
        ("email" = String, Path, description = "User email")
    ),
    responses(
        (status = 200, description = "Payments, newest first", body = [PaymentResponse]),
        (status = 403, description = "Admin role required")
    ),
    security(("bearer_auth" = []))
)]
pub async fn payment_history(
    State(state): State<PaymentsState>,
    auth: Authenticated,
    Path(email): Path<String>,
) -> Result<Json<Vec<PaymentResponse>>, PlatformError> {
    require_admin(&state.user_repo, auth.email()).await?;

    let payments = state.payment_repo.find_by_user(&email).await?;
    Ok(Json(payments.into_iter().map(|p| p.into()).collect()))
}

/// Ledger/directory reconciliation (admin)
///
/// Lists payments whose user record is missing or not subscribed. The
/// ledger append and the subscription flip are separate writes, so this is
/// the surface where a crash between them shows up.
#[utoipa::path(
    get,
    path = "/payments/reconciliation",
    tag = "payments",
    operation_id = "getPaymentsReconciliation",
    responses(
        (status = 200, description = "Inconsistent ledger entries", body = [ReconciliationEntry]),
        (status = 403, description = "Admin role required")
    ),
    security(("bearer_auth" = []))
)]
pub async fn reconciliation(
    State(state): State<PaymentsState>,
    auth: Authenticated,
) -> Result<Json<Vec<ReconciliationEntry>>, PlatformError> {
    require_admin(&state.user_repo, auth.email()).await?;

    let payments = state.payment_repo.find_all().await?;
    let emails: Vec<String> = payments.iter()
        .map(|p| p.user_email.clone())
        .collect::<HashSet<_>>()
        .into_iter()
        .collect();

    let subscribed: HashSet<String> = state.user_repo
        .find_subscribed_emails(&emails)
        .await?
        .into_iter()
        .collect();

    let known: HashSet<String> = state.user_repo
        .find_known_emails(&emails)
        .await?
        .into_iter()
        .collect();

    let findings = payments.into_iter()
        .filter_map(|p| {
            let finding = if !known.contains(&p.user_email) {
                "missing-user"
            } else if !subscribed.contains(&p.user_email) {
                "not-subscribed"
            } else {
                return None;
            };
            Some(ReconciliationEntry {
                payment: p.into(),
                finding: finding.to_string(),
            })
        })
        .collect();

    Ok(Json(findings))
}

/// Create payments router. Paths are absolute; merge this at the API root.
pub fn payments_router(state: PaymentsState) -> OpenApiRouter {
    OpenApiRouter::new()
        .routes(routes!(validate_coupon))
        .routes(routes!(create_payment_intent))
        .routes(routes!(save_payment))
        .routes(routes!(payment_history))
        .routes(routes!(reconciliation))
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ledger_entry_keeps_client_reported_date() {
        let req: SavePaymentRequest = serde_json::from_str(
            r#"{"amount":100,"transactionId":"tx1","date":"2026-08-20T00:00:00Z"}"#,
        ).unwrap();

        let payment = ledger_entry("payer@example.com", req).unwrap();
        assert_eq!(payment.date.to_rfc3339(), "2026-08-20T00:00:00+00:00");
        assert_eq!(payment.user_email, "payer@example.com");
    }

    #[test]
    fn test_ledger_entry_defaults_to_receipt_time() {
        let req: SavePaymentRequest = serde_json::from_str(
            r#"{"amount":100,"transactionId":"tx1"}"#,
        ).unwrap();

        let before = Utc::now();
        let payment = ledger_entry("payer@example.com", req).unwrap();
        assert!(payment.date >= before);
    }

    #[test]
    fn test_ledger_entry_rejects_bad_input() {
        let zero: SavePaymentRequest = serde_json::from_str(
            r#"{"amount":0,"transactionId":"tx1"}"#,
        ).unwrap();
        assert!(ledger_entry("payer@example.com", zero).is_err());

        let blank: SavePaymentRequest = serde_json::from_str(
            r#"{"amount":100,"transactionId":"  "}"#,
        ).unwrap();
        assert!(ledger_entry("payer@example.com", blank).is_err());
    }
}
