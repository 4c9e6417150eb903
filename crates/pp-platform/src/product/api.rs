//! Products API
//!
//! Listing, submission, moderation, upvotes and reports. The acting identity
//! always comes from the verified token claims; a body-supplied email is
//! never honored.

use axum::{
    extract::{State, Path, Query},
    Json,
};
use utoipa_axum::{router::OpenApiRouter, routes};
use utoipa::{ToSchema, IntoParams};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::product::entity::{Product, ProductStatus};
use crate::product::repository::{ProductRepository, UpvoteOutcome};
use crate::report::entity::Report;
use crate::report::repository::ReportRepository;
use crate::user::repository::UserRepository;
use crate::auth::admin_gate::require_admin;
use crate::shared::error::PlatformError;
use crate::shared::api_common::{PaginationParams, PaginatedResponse, CreatedResponse, SuccessResponse};
use crate::shared::middleware::Authenticated;
use crate::shared::tsid::ensure_well_formed;

/// Create product request
#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateProductRequest {
    pub name: String,
    pub description: Option<String>,
    pub image_url: Option<String>,
    pub external_link: Option<String>,

    #[serde(default)]
    pub tags: Vec<String>,
}

/// Owner field patch. Engagement and moderation fields have no counterpart
/// here; they change only through their dedicated endpoints.
#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateProductRequest {
    pub name: Option<String>,
    pub description: Option<String>,
    pub image_url: Option<String>,
    pub external_link: Option<String>,
    pub tags: Option<Vec<String>>,
}

/// Moderation decision request
#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ModerationRequest {
    /// "Pending", "Approved" or "Rejected"
    pub status: String,
}

/// Product response DTO
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ProductResponse {
    pub id: String,
    pub name: String,
    pub owner_email: String,
    pub description: Option<String>,
    pub image_url: Option<String>,
    pub external_link: Option<String>,
    pub tags: Vec<String>,
    pub status: String,
    pub is_featured: bool,
    pub upvotes: i64,
    pub voters: Vec<String>,
    pub created_at: String,
}

impl From<Product> for ProductResponse {
    fn from(p: Product) -> Self {
        Self {
            id: p.id,
            name: p.name,
            owner_email: p.owner_email,
            description: p.description,
            image_url: p.image_url,
            external_link: p.external_link,
            tags: p.tags,
            status: p.status.as_str().to_string(),
            is_featured: p.is_featured,
            upvotes: p.upvotes,
            voters: p.voters,
            created_at: p.created_at.to_rfc3339(),
        }
    }
}

/// Upvote outcome response
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpvoteResponse {
    /// False when this voter was already counted
    pub applied: bool,
    pub upvotes: i64,
}

/// Query parameters for the product listing
#[derive(Debug, Default, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct ProductsQuery {
    #[serde(flatten)]
    pub pagination: PaginationParams,

    /// Case-insensitive match against name and tags
    pub search: Option<String>,

    /// Filter by owning user
    pub owner_email: Option<String>,
}

/// Query parameters for the featured listing
#[derive(Debug, Default, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct FeaturedQuery {
    /// Maximum number of products (default 6)
    pub limit: Option<i64>,
}

/// Products service state
#[derive(Clone)]
pub struct ProductsState {
    pub product_repo: Arc<ProductRepository>,
    pub report_repo: Arc<ReportRepository>,
    pub user_repo: Arc<UserRepository>,
}

/// Build the listing filter from query parameters. Search input is
/// escaped before it becomes a regex.
fn listing_filter(query: &ProductsQuery) -> bson::Document {
    let mut filter = bson::doc! {};
    if let Some(ref owner) = query.owner_email {
        filter.insert("ownerEmail", owner);
    }
    if let Some(ref search) = query.search {
        let pattern = regex::escape(search);
        filter.insert("$or", vec![
            bson::doc! { "name": { "$regex": &pattern, "$options": "i" } },
            bson::doc! { "tags": { "$regex": &pattern, "$options": "i" } },
        ]);
    }
    filter
}

/// List products
#[utoipa::path(
    get,
    path = "",
    tag = "products",
    operation_id = "getProducts",
    params(ProductsQuery),
    responses(
        (status = 200, description = "Paginated product listing", body = PaginatedResponse<ProductResponse>)
    )
)]
pub async fn list_products(
    State(state): State<ProductsState>,
    Query(query): Query<ProductsQuery>,
) -> Result<Json<PaginatedResponse<ProductResponse>>, PlatformError> {
    let filter = listing_filter(&query);
    let total = state.product_repo.count(filter.clone()).await?;
    let products = state.product_repo
        .find_paged(filter, query.pagination.offset(), query.pagination.limit())
        .await?;

    let data: Vec<ProductResponse> = products.into_iter().map(|p| p.into()).collect();
    Ok(Json(PaginatedResponse::new(
        data,
        query.pagination.page(),
        query.pagination.size(),
        total,
    )))
}

/// Featured products, newest first
#[utoipa::path(
    get,
    path = "/featured",
    tag = "products",
    operation_id = "getProductsFeatured",
    params(FeaturedQuery),
    responses(
        (status = 200, description = "Featured products", body = [ProductResponse])
    )
)]
pub async fn list_featured(
    State(state): State<ProductsState>,
    Query(query): Query<FeaturedQuery>,
) -> Result<Json<Vec<ProductResponse>>, PlatformError> {
    let limit = query.limit.unwrap_or(6).clamp(1, 100);
    let products = state.product_repo.find_featured(limit).await?;
    Ok(Json(products.into_iter().map(|p| p.into()).collect()))
}

/// Moderation review queue: all pending products
#[utoipa::path(
    get,
    path = "/review",
    tag = "products",
    operation_id = "getProductsReviewQueue",
    responses(
        (status = 200, description = "Pending products", body = [ProductResponse]),
        (status = 403, description = "Admin role required")
    ),
    security(("bearer_auth" = []))
)]
pub async fn review_queue(
    State(state): State<ProductsState>,
    auth: Authenticated,
) -> Result<Json<Vec<ProductResponse>>, PlatformError> {
    require_admin(&state.user_repo, auth.email()).await?;

    let products = state.product_repo.find_pending().await?;
    Ok(Json(products.into_iter().map(|p| p.into()).collect()))
}

/// Get product by ID
#[utoipa::path(
    get,
    path = "/{id}",
    tag = "products",
    operation_id = "getProductById",
    params(
        ("id" = String, Path, description = "Product ID")
    ),
    responses(
        (status = 200, description = "Product found", body = ProductResponse),
        (status = 400, description = "Malformed ID"),
        (status = 404, description = "Product not found")
    )
)]
pub async fn get_product(
    State(state): State<ProductsState>,
    Path(id): Path<String>,
) -> Result<Json<ProductResponse>, PlatformError> {
    ensure_well_formed(&id)?;

    let product = state.product_repo.find_by_id(&id).await?
        .ok_or_else(|| PlatformError::not_found("Product", &id))?;

    Ok(Json(product.into()))
}

/// Submit a new product
///
/// The submission enters the moderation queue as Pending; the owner is the
/// authenticated caller.
#[utoipa::path(
    post,
    path = "",
    tag = "products",
    operation_id = "postProducts",
    request_body = CreateProductRequest,
    responses(
        (status = 201, description = "Product submitted", body = CreatedResponse),
        (status = 400, description = "Validation error"),
        (status = 401, description = "Authentication required")
    ),
    security(("bearer_auth" = []))
)]
pub async fn create_product(
    State(state): State<ProductsState>,
    auth: Authenticated,
    Json(req): Json<CreateProductRequest>,
) -> Result<Json<CreatedResponse>, PlatformError> {
    if req.name.trim().is_empty() {
        return Err(PlatformError::validation("Product name must not be empty"));
    }

    let mut product = Product::new(req.name.trim(), auth.email());

    if let Some(desc) = req.description {
        product = product.with_description(desc);
    }
    if let Some(url) = req.image_url {
        product = product.with_image_url(url);
    }
    if let Some(link) = req.external_link {
        product = product.with_external_link(link);
    }
    product = product.with_tags(req.tags);

    let id = product.id.clone();
    state.product_repo.insert(&product).await?;

    tracing::info!(product_id = %id, owner = %auth.email(), "Product submitted");

    Ok(Json(CreatedResponse::new(id)))
}

/// Update product fields (owner or admin)
#[utoipa::path(
    patch,
    path = "/{id}",
    tag = "products",
    operation_id = "patchProductById",
    params(
        ("id" = String, Path, description = "Product ID")
    ),
    request_body = UpdateProductRequest,
    responses(
        (status = 200, description = "Product updated", body = ProductResponse),
        (status = 403, description = "Not the owner"),
        (status = 404, description = "Product not found")
    ),
    security(("bearer_auth" = []))
)]
pub async fn update_product(
    State(state): State<ProductsState>,
    auth: Authenticated,
    Path(id): Path<String>,
    Json(req): Json<UpdateProductRequest>,
) -> Result<Json<ProductResponse>, PlatformError> {
    ensure_well_formed(&id)?;

    let product = state.product_repo.find_by_id(&id).await?
        .ok_or_else(|| PlatformError::not_found("Product", &id))?;

    if product.owner_email != auth.email() {
        require_admin(&state.user_repo, auth.email()).await?;
    }

    // Allow-listed $set: engagement and moderation fields never appear here.
    let mut set = bson::doc! {};
    if let Some(name) = req.name {
        if name.trim().is_empty() {
            return Err(PlatformError::validation("Product name must not be empty"));
        }
        set.insert("name", name.trim());
    }
    if let Some(desc) = req.description {
        set.insert("description", desc);
    }
    if let Some(url) = req.image_url {
        set.insert("imageUrl", url);
    }
    if let Some(link) = req.external_link {
        set.insert("externalLink", link);
    }
    if let Some(tags) = req.tags {
        set.insert("tags", tags);
    }

    state.product_repo.update_fields(&id, set).await?;

    let updated = state.product_repo.find_by_id(&id).await?
        .ok_or_else(|| PlatformError::not_found("Product", &id))?;

    Ok(Json(updated.into()))
}

/// Upvote a product
///
/// At most one vote per caller per product; a repeated vote is reported as
/// a success with `applied: false`, never an error.
#[utoipa::path(
    patch,
    path = "/upvote/{id}",
    tag = "products",
    operation_id = "patchProductUpvote",
    params(
        ("id" = String, Path, description = "Product ID")
    ),
    responses(
        (status = 200, description = "Vote recorded (or already counted)", body = UpvoteResponse),
        (status = 400, description = "Malformed ID"),
        (status = 404, description = "Product not found")
    ),
    security(("bearer_auth" = []))
)]
pub async fn upvote_product(
    State(state): State<ProductsState>,
    auth: Authenticated,
    Path(id): Path<String>,
) -> Result<Json<UpvoteResponse>, PlatformError> {
    ensure_well_formed(&id)?;

    let outcome = state.product_repo.upvote(&id, auth.email()).await?;

    // NoChange covers both "already voted" and "no such product".
    let product = state.product_repo.find_by_id(&id).await?
        .ok_or_else(|| PlatformError::not_found("Product", &id))?;

    Ok(Json(UpvoteResponse {
        applied: outcome == UpvoteOutcome::Applied,
        upvotes: product.upvotes,
    }))
}

/// Moderation decision (admin)
///
/// Sets the product status; the featured flag is derived from the decision,
/// never set independently.
#[utoipa::path(
    patch,
    path = "/status/{id}",
    tag = "products",
    operation_id = "patchProductStatus",
    params(
        ("id" = String, Path, description = "Product ID")
    ),
    request_body = ModerationRequest,
    responses(
        (status = 200, description = "Status updated", body = ProductResponse),
        (status = 400, description = "Unknown status"),
        (status = 403, description = "Admin role required"),
        (status = 404, description = "Product not found")
    ),
    security(("bearer_auth" = []))
)]
pub async fn set_product_status(
    State(state): State<ProductsState>,
    auth: Authenticated,
    Path(id): Path<String>,
    Json(req): Json<ModerationRequest>,
) -> Result<Json<ProductResponse>, PlatformError> {
    ensure_well_formed(&id)?;
    require_admin(&state.user_repo, auth.email()).await?;

    let status = ProductStatus::parse(&req.status)
        .ok_or_else(|| PlatformError::validation(format!(
            "Invalid status: {}. Valid options: Pending, Approved, Rejected", req.status
        )))?;

    let matched = state.product_repo.set_status(&id, status).await?;
    if !matched {
        return Err(PlatformError::not_found("Product", &id));
    }

    tracing::info!(product_id = %id, status = status.as_str(), moderator = %auth.email(), "Moderation decision");

    let product = state.product_repo.find_by_id(&id).await?
        .ok_or_else(|| PlatformError::not_found("Product", &id))?;

    Ok(Json(product.into()))
}

/// Delete a product (owner or admin)
#[utoipa::path(
    delete,
    path = "/{id}",
    tag = "products",
    operation_id = "deleteProductById",
    params(
        ("id" = String, Path, description = "Product ID")
    ),
    responses(
        (status = 200, description = "Product deleted", body = SuccessResponse),
        (status = 403, description = "Not the owner"),
        (status = 404, description = "Product not found")
    ),
    security(("bearer_auth" = []))
)]
pub async fn delete_product(
    State(state): State<ProductsState>,
    auth: Authenticated,
    Path(id): Path<String>,
) -> Result<Json<SuccessResponse>, PlatformError> {
    ensure_well_formed(&id)?;

    let product = state.product_repo.find_by_id(&id).await?
        .ok_or_else(|| PlatformError::not_found("Product", &id))?;

    if product.owner_email != auth.email() {
        require_admin(&state.user_repo, auth.email()).await?;
    }

    state.product_repo.delete(&id).await?;

    Ok(Json(SuccessResponse::ok()))
}

/// Report a product
///
/// Appends to the report ledger. Succeeds for any well-formed ID, including
/// one whose product has since been deleted; the reporter is the
/// authenticated caller.
#[utoipa::path(
    post,
    path = "/report/{id}",
    tag = "products",
    operation_id = "postProductReport",
    params(
        ("id" = String, Path, description = "Product ID")
    ),
    responses(
        (status = 201, description = "Report recorded", body = CreatedResponse),
        (status = 400, description = "Malformed ID"),
        (status = 401, description = "Authentication required")
    ),
    security(("bearer_auth" = []))
)]
pub async fn report_product(
    State(state): State<ProductsState>,
    auth: Authenticated,
    Path(id): Path<String>,
) -> Result<Json<CreatedResponse>, PlatformError> {
    ensure_well_formed(&id)?;

    let report = Report::new(&id, auth.email());
    let report_id = report.id.clone();
    state.report_repo.insert(&report).await?;

    tracing::info!(product_id = %id, reporter = %auth.email(), "Product reported");

    Ok(Json(CreatedResponse::new(report_id)))
}

/// Create products router
pub fn products_router(state: ProductsState) -> OpenApiRouter {
    OpenApiRouter::new()
        .routes(routes!(list_products, create_product))
        .routes(routes!(list_featured))
        .routes(routes!(review_queue))
        .routes(routes!(get_product, update_product, delete_product))
        .routes(routes!(upvote_product))
        .routes(routes!(set_product_status))
        .routes(routes!(report_product))
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_request_accepts_minimal_body() {
        let req: CreateProductRequest =
            serde_json::from_str(r#"{"name":"Rustify"}"#).unwrap();
        assert_eq!(req.name, "Rustify");
        assert!(req.description.is_none());
        assert!(req.tags.is_empty());
    }
}
