//! Reports API
//!
//! Admin-only listing of moderation reports, joined to the current product
//! catalog. A report whose product has been deleted is still listed, with a
//! null product name.

use axum::{extract::State, Json};
use utoipa_axum::{router::OpenApiRouter, routes};
use utoipa::ToSchema;
use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;

use crate::product::repository::ProductRepository;
use crate::report::repository::ReportRepository;
use crate::user::repository::UserRepository;
use crate::auth::admin_gate::require_admin;
use crate::shared::error::PlatformError;
use crate::shared::middleware::Authenticated;

/// Report joined to its product's current name
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ReportSummary {
    pub id: String,
    pub product_id: String,
    /// None when the reported product has been deleted
    pub product_name: Option<String>,
    pub reporter_email: String,
    pub reported_at: String,
}

/// Reports service state
#[derive(Clone)]
pub struct ReportsState {
    pub report_repo: Arc<ReportRepository>,
    pub product_repo: Arc<ProductRepository>,
    pub user_repo: Arc<UserRepository>,
}

/// List reports with product summaries (admin)
#[utoipa::path(
    get,
    path = "",
    tag = "reports",
    operation_id = "getReports",
    responses(
        (status = 200, description = "All reports, newest first", body = [ReportSummary]),
        (status = 403, description = "Admin role required")
    ),
    security(("bearer_auth" = []))
)]
pub async fn list_reports(
    State(state): State<ReportsState>,
    auth: Authenticated,
) -> Result<Json<Vec<ReportSummary>>, PlatformError> {
    require_admin(&state.user_repo, auth.email()).await?;

    let reports = state.report_repo.find_all().await?;

    let product_ids: Vec<String> = reports.iter().map(|r| r.product_id.clone()).collect();
    let names: HashMap<String, String> = state.product_repo
        .find_by_ids(&product_ids)
        .await?
        .into_iter()
        .map(|p| (p.id, p.name))
        .collect();

    let summaries = reports.into_iter()
        .map(|r| ReportSummary {
            product_name: names.get(&r.product_id).cloned(),
            id: r.id,
            product_id: r.product_id,
            reporter_email: r.reporter_email,
            reported_at: r.reported_at.to_rfc3339(),
        })
        .collect();

    Ok(Json(summaries))
}

/// Create reports router
pub fn reports_router(state: ReportsState) -> OpenApiRouter {
    OpenApiRouter::new()
        .routes(routes!(list_reports))
        .with_state(state)
}
