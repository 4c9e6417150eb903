//! Admin Statistics & Analytics API

use axum::{
    extract::{State, Query},
    Json,
};
use utoipa_axum::{router::OpenApiRouter, routes};
use utoipa::{ToSchema, IntoParams};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use chrono::{Duration, Utc};

use crate::product::entity::ProductStatus;
use crate::product::repository::ProductRepository;
use crate::review::repository::ReviewRepository;
use crate::report::repository::ReportRepository;
use crate::user::repository::UserRepository;
use crate::payment::repository::PaymentRepository;
use crate::auth::admin_gate::require_admin;
use crate::shared::error::PlatformError;
use crate::shared::middleware::Authenticated;
use super::{DayBucket, Metric, Range};

/// Point-in-time platform counts
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct StatisticsResponse {
    pub total_products: u64,
    pub approved_products: u64,
    pub pending_products: u64,
    pub total_users: u64,
    pub total_reviews: u64,
    pub total_reports: u64,
    /// Summed ledger amounts, in cents
    pub total_revenue: i64,
}

/// Analytics query parameters
#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct AnalyticsQuery {
    /// "revenue", "products" or "users"
    pub metric: String,
    /// "week", "month" or "year"
    pub range: String,
}

/// Time-windowed per-day series
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AnalyticsResponse {
    pub metric: String,
    pub range: String,
    /// Only days with at least one record appear; no zero-fill
    pub series: Vec<DayBucket>,
}

/// Stats service state
#[derive(Clone)]
pub struct StatsState {
    pub product_repo: Arc<ProductRepository>,
    pub review_repo: Arc<ReviewRepository>,
    pub report_repo: Arc<ReportRepository>,
    pub user_repo: Arc<UserRepository>,
    pub payment_repo: Arc<PaymentRepository>,
}

/// Platform statistics (admin)
#[utoipa::path(
    get,
    path = "/statistics",
    tag = "admin",
    operation_id = "getAdminStatistics",
    responses(
        (status = 200, description = "Platform counts and revenue", body = StatisticsResponse),
        (status = 403, description = "Admin role required")
    ),
    security(("bearer_auth" = []))
)]
pub async fn statistics(
    State(state): State<StatsState>,
    auth: Authenticated,
) -> Result<Json<StatisticsResponse>, PlatformError> {
    require_admin(&state.user_repo, auth.email()).await?;

    let total_products = state.product_repo.count_all().await?;
    let approved_products = state.product_repo.count_by_status(ProductStatus::Approved).await?;
    let pending_products = state.product_repo.count_by_status(ProductStatus::Pending).await?;
    let total_users = state.user_repo.count_all().await?;
    let total_reviews = state.review_repo.count_all().await?;
    let total_reports = state.report_repo.count_all().await?;
    let total_revenue = state.payment_repo.total_revenue().await?;

    Ok(Json(StatisticsResponse {
        total_products,
        approved_products,
        pending_products,
        total_users,
        total_reviews,
        total_reports,
        total_revenue,
    }))
}

/// Time-windowed analytics series (admin)
#[utoipa::path(
    get,
    path = "/analytics",
    tag = "admin",
    operation_id = "getAdminAnalytics",
    params(AnalyticsQuery),
    responses(
        (status = 200, description = "Per-day series for the trailing window", body = AnalyticsResponse),
        (status = 400, description = "Unknown metric or range"),
        (status = 403, description = "Admin role required")
    ),
    security(("bearer_auth" = []))
)]
pub async fn analytics(
    State(state): State<StatsState>,
    auth: Authenticated,
    Query(query): Query<AnalyticsQuery>,
) -> Result<Json<AnalyticsResponse>, PlatformError> {
    require_admin(&state.user_repo, auth.email()).await?;

    let metric = Metric::parse(&query.metric)?;
    let range = Range::parse(&query.range)?;
    let since = Utc::now() - Duration::days(range.days());

    let series = match metric {
        Metric::Revenue => state.payment_repo.revenue_by_day(since).await?,
        Metric::Products => state.product_repo.count_by_day(since).await?,
        Metric::Users => state.user_repo.count_by_day(since).await?,
    };

    Ok(Json(AnalyticsResponse {
        metric: query.metric,
        range: query.range,
        series,
    }))
}

/// Create admin stats router
pub fn stats_router(state: StatsState) -> OpenApiRouter {
    OpenApiRouter::new()
        .routes(routes!(statistics))
        .routes(routes!(analytics))
        .with_state(state)
}
