//! Reviews API
//!
//! Append-only community reviews. Ratings are validated at this boundary;
//! everything below trusts the 1..=5 range.

use axum::{
    extract::{State, Path},
    Json,
};
use utoipa_axum::{router::OpenApiRouter, routes};
use utoipa::ToSchema;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::review::entity::Review;
use crate::review::repository::ReviewRepository;
use crate::shared::error::PlatformError;
use crate::shared::api_common::CreatedResponse;
use crate::shared::middleware::Authenticated;
use crate::shared::tsid::ensure_well_formed;

/// Create review request
#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateReviewRequest {
    pub product_id: String,

    /// Display name; falls back to the caller's email
    pub reviewer_name: Option<String>,

    pub description: Option<String>,

    /// 1 through 5
    pub rating: i32,
}

/// Review response DTO
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ReviewResponse {
    pub id: String,
    pub product_id: String,
    pub reviewer_name: String,
    pub description: Option<String>,
    pub rating: i32,
    pub created_at: String,
}

impl From<Review> for ReviewResponse {
    fn from(r: Review) -> Self {
        Self {
            id: r.id,
            product_id: r.product_id,
            reviewer_name: r.reviewer_name,
            description: r.description,
            rating: r.rating,
            created_at: r.created_at.to_rfc3339(),
        }
    }
}

/// Reviews service state
#[derive(Clone)]
pub struct ReviewsState {
    pub review_repo: Arc<ReviewRepository>,
}

/// List all reviews, newest first
#[utoipa::path(
    get,
    path = "",
    tag = "reviews",
    operation_id = "getReviews",
    responses(
        (status = 200, description = "All reviews", body = [ReviewResponse])
    )
)]
pub async fn list_reviews(
    State(state): State<ReviewsState>,
) -> Result<Json<Vec<ReviewResponse>>, PlatformError> {
    let reviews = state.review_repo.find_all().await?;
    Ok(Json(reviews.into_iter().map(|r| r.into()).collect()))
}

/// Submit a review
#[utoipa::path(
    post,
    path = "",
    tag = "reviews",
    operation_id = "postReviews",
    request_body = CreateReviewRequest,
    responses(
        (status = 201, description = "Review recorded", body = CreatedResponse),
        (status = 400, description = "Validation error"),
        (status = 401, description = "Authentication required")
    ),
    security(("bearer_auth" = []))
)]
pub async fn create_review(
    State(state): State<ReviewsState>,
    auth: Authenticated,
    Json(req): Json<CreateReviewRequest>,
) -> Result<Json<CreatedResponse>, PlatformError> {
    ensure_well_formed(&req.product_id)?;

    if !(1..=5).contains(&req.rating) {
        return Err(PlatformError::validation("Rating must be between 1 and 5"));
    }

    let reviewer = req.reviewer_name
        .filter(|n| !n.trim().is_empty())
        .unwrap_or_else(|| auth.email().to_string());

    let mut review = Review::new(&req.product_id, reviewer, req.rating);
    if let Some(desc) = req.description {
        review = review.with_description(desc);
    }

    let id = review.id.clone();
    state.review_repo.insert(&review).await?;

    Ok(Json(CreatedResponse::new(id)))
}

/// Reviews for one product, newest first
#[utoipa::path(
    get,
    path = "/{productId}",
    tag = "reviews",
    operation_id = "getReviewsByProduct",
    params(
        ("productId" = String, Path, description = "Product ID")
    ),
    responses(
        (status = 200, description = "Reviews for the product", body = [ReviewResponse]),
        (status = 400, description = "Malformed ID")
    )
)]
pub async fn list_reviews_for_product(
    State(state): State<ReviewsState>,
    Path(product_id): Path<String>,
) -> Result<Json<Vec<ReviewResponse>>, PlatformError> {
    ensure_well_formed(&product_id)?;

    let reviews = state.review_repo.find_by_product(&product_id).await?;
    Ok(Json(reviews.into_iter().map(|r| r.into()).collect()))
}

/// Create reviews router
pub fn reviews_router(state: ReviewsState) -> OpenApiRouter {
    OpenApiRouter::new()
        .routes(routes!(list_reviews, create_review))
        .routes(routes!(list_reviews_for_product))
        .with_state(state)
}
