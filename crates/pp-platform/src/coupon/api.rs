//! Coupons API
//!
//! Public catalog listing plus admin-only create/delete. Whether a code is
//! actually redeemable is the gateway's call (see the payment workflow);
//! this is the catalog shown to users.

use axum::{
    extract::{State, Path},
    Json,
};
use utoipa_axum::{router::OpenApiRouter, routes};
use utoipa::ToSchema;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use chrono::{DateTime, Utc};

use crate::coupon::entity::Coupon;
use crate::coupon::repository::CouponRepository;
use crate::user::repository::UserRepository;
use crate::auth::admin_gate::require_admin;
use crate::shared::error::PlatformError;
use crate::shared::api_common::{CreatedResponse, SuccessResponse};
use crate::shared::middleware::Authenticated;
use crate::shared::tsid::ensure_well_formed;

/// Create coupon request
#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateCouponRequest {
    pub code: String,

    pub description: Option<String>,

    /// 0 through 100
    pub discount_percent: f64,

    pub expires_at: Option<DateTime<Utc>>,
}

/// Coupon response DTO
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CouponResponse {
    pub id: String,
    pub code: String,
    pub description: Option<String>,
    pub discount_percent: f64,
    pub expires_at: Option<String>,
    pub created_at: String,
}

impl From<Coupon> for CouponResponse {
    fn from(c: Coupon) -> Self {
        Self {
            id: c.id,
            code: c.code,
            description: c.description,
            discount_percent: c.discount_percent,
            expires_at: c.expires_at.map(|d| d.to_rfc3339()),
            created_at: c.created_at.to_rfc3339(),
        }
    }
}

/// Coupons service state
#[derive(Clone)]
pub struct CouponsState {
    pub coupon_repo: Arc<CouponRepository>,
    pub user_repo: Arc<UserRepository>,
}

/// List coupons, newest first
#[utoipa::path(
    get,
    path = "",
    tag = "coupons",
    operation_id = "getCoupons",
    responses(
        (status = 200, description = "All coupons", body = [CouponResponse])
    )
)]
pub async fn list_coupons(
    State(state): State<CouponsState>,
) -> Result<Json<Vec<CouponResponse>>, PlatformError> {
    let coupons = state.coupon_repo.find_all().await?;
    Ok(Json(coupons.into_iter().map(|c| c.into()).collect()))
}

/// Create a coupon (admin)
#[utoipa::path(
    post,
    path = "",
    tag = "coupons",
    operation_id = "postCoupons",
    request_body = CreateCouponRequest,
    responses(
        (status = 201, description = "Coupon created", body = CreatedResponse),
        (status = 400, description = "Validation error"),
        (status = 403, description = "Admin role required")
    ),
    security(("bearer_auth" = []))
)]
pub async fn create_coupon(
    State(state): State<CouponsState>,
    auth: Authenticated,
    Json(req): Json<CreateCouponRequest>,
) -> Result<Json<CreatedResponse>, PlatformError> {
    require_admin(&state.user_repo, auth.email()).await?;

    if req.code.trim().is_empty() {
        return Err(PlatformError::validation("Coupon code must not be empty"));
    }
    if !(0.0..=100.0).contains(&req.discount_percent) {
        return Err(PlatformError::validation("Discount percent must be between 0 and 100"));
    }

    let mut coupon = Coupon::new(req.code.trim(), req.discount_percent);
    if let Some(desc) = req.description {
        coupon = coupon.with_description(desc);
    }
    if let Some(expires) = req.expires_at {
        coupon = coupon.with_expires_at(expires);
    }

    let id = coupon.id.clone();
    state.coupon_repo.insert(&coupon).await?;

    tracing::info!(coupon = %coupon.code, created_by = %auth.email(), "Coupon created");

    Ok(Json(CreatedResponse::new(id)))
}

/// Delete a coupon (admin)
#[utoipa::path(
    delete,
    path = "/{id}",
    tag = "coupons",
    operation_id = "deleteCouponById",
    params(
        ("id" = String, Path, description = "Coupon ID")
    ),
    responses(
        (status = 200, description = "Coupon deleted", body = SuccessResponse),
        (status = 403, description = "Admin role required"),
        (status = 404, description = "Coupon not found")
    ),
    security(("bearer_auth" = []))
)]
pub async fn delete_coupon(
    State(state): State<CouponsState>,
    auth: Authenticated,
    Path(id): Path<String>,
) -> Result<Json<SuccessResponse>, PlatformError> {
    ensure_well_formed(&id)?;
    require_admin(&state.user_repo, auth.email()).await?;

    let deleted = state.coupon_repo.delete(&id).await?;
    if !deleted {
        return Err(PlatformError::not_found("Coupon", &id));
    }

    Ok(Json(SuccessResponse::ok()))
}

/// Create coupons router
pub fn coupons_router(state: CouponsState) -> OpenApiRouter {
    OpenApiRouter::new()
        .routes(routes!(list_coupons, create_coupon))
        .routes(routes!(delete_coupon))
        .with_state(state)
}
