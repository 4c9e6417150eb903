//! Users API
//!
//! Directory endpoints: first-sign-in registration, role administration and
//! the subscription flip. Registration is idempotent-by-conflict; an
//! existing record is never overwritten.

use axum::{
    extract::{State, Path},
    Json,
};
use utoipa_axum::{router::OpenApiRouter, routes};
use utoipa::ToSchema;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::user::entity::{User, UserRole};
use crate::user::repository::UserRepository;
use crate::auth::admin_gate::require_admin;
use crate::shared::error::PlatformError;
use crate::shared::api_common::{CreatedResponse, SuccessResponse};
use crate::shared::middleware::Authenticated;

/// First-sign-in registration request. The email comes from the verified
/// token, never from the body.
#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateUserRequest {
    pub name: Option<String>,
    pub photo_url: Option<String>,
}

/// Subscription flip request
#[derive(Debug, Default, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SubscribeRequest {
    /// Defaults to true (subscribe)
    #[serde(default)]
    pub is_subscribed: Option<bool>,

    /// Coupon code used at checkout, recorded on the user
    pub coupon: Option<String>,
}

/// User response DTO
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UserResponse {
    pub id: String,
    pub email: String,
    pub name: Option<String>,
    pub photo_url: Option<String>,
    pub role: String,
    pub is_subscribed: bool,
    pub coupon: Option<String>,
    pub created_at: String,
}

impl From<User> for UserResponse {
    fn from(u: User) -> Self {
        let role = serde_json::to_string(&u.role)
            .unwrap_or_default()
            .trim_matches('"')
            .to_string();
        Self {
            id: u.id,
            email: u.email,
            name: u.name,
            photo_url: u.photo_url,
            role,
            is_subscribed: u.is_subscribed,
            coupon: u.coupon,
            created_at: u.created_at.to_rfc3339(),
        }
    }
}

/// Admin-check response
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AdminCheckResponse {
    pub admin: bool,
}

/// Users service state
#[derive(Clone)]
pub struct UsersState {
    pub user_repo: Arc<UserRepository>,
}

/// List all users (admin)
#[utoipa::path(
    get,
    path = "/users",
    tag = "users",
    operation_id = "getUsers",
    responses(
        (status = 200, description = "All users", body = [UserResponse]),
        (status = 403, description = "Admin role required")
    ),
    security(("bearer_auth" = []))
)]
pub async fn list_users(
    State(state): State<UsersState>,
    auth: Authenticated,
) -> Result<Json<Vec<UserResponse>>, PlatformError> {
    require_admin(&state.user_repo, auth.email()).await?;

    let users = state.user_repo.find_all().await?;
    Ok(Json(users.into_iter().map(|u| u.into()).collect()))
}

/// Register the authenticated caller on first sign-in
#[utoipa::path(
    post,
    path = "/users",
    tag = "users",
    operation_id = "postUsers",
    request_body = CreateUserRequest,
    responses(
        (status = 201, description = "User registered", body = CreatedResponse),
        (status = 401, description = "Authentication required"),
        (status = 409, description = "Email already registered")
    ),
    security(("bearer_auth" = []))
)]
pub async fn create_user(
    State(state): State<UsersState>,
    auth: Authenticated,
    Json(req): Json<CreateUserRequest>,
) -> Result<Json<CreatedResponse>, PlatformError> {
    let mut user = User::new(auth.email());
    if let Some(name) = req.name {
        user = user.with_name(name);
    }
    if let Some(url) = req.photo_url {
        user = user.with_photo_url(url);
    }

    let id = user.id.clone();
    state.user_repo.insert(&user).await?;

    tracing::info!(email = %auth.email(), "User registered");

    Ok(Json(CreatedResponse::new(id)))
}

/// Get a user record (self or admin)
#[utoipa::path(
    get,
    path = "/user/{email}",
    tag = "users",
    operation_id = "getUserByEmail",
    params(
        ("email" = String, Path, description = "User email")
    ),
    responses(
        (status = 200, description = "User found", body = UserResponse),
        (status = 403, description = "Not your record"),
        (status = 404, description = "User not found")
    ),
    security(("bearer_auth" = []))
)]
pub async fn get_user(
    State(state): State<UsersState>,
    auth: Authenticated,
    Path(email): Path<String>,
) -> Result<Json<UserResponse>, PlatformError> {
    if email != auth.email() {
        require_admin(&state.user_repo, auth.email()).await?;
    }

    let user = state.user_repo.find_by_email(&email).await?
        .ok_or_else(|| PlatformError::not_found("User", &email))?;

    Ok(Json(user.into()))
}

/// Check whether the caller holds the admin role
///
/// Answers only for the authenticated identity; asking about someone else
/// is rejected.
#[utoipa::path(
    get,
    path = "/users/admin/{email}",
    tag = "users",
    operation_id = "getUsersAdminCheck",
    params(
        ("email" = String, Path, description = "User email; must match the caller")
    ),
    responses(
        (status = 200, description = "Admin flag for the caller", body = AdminCheckResponse),
        (status = 403, description = "Email does not match the caller")
    ),
    security(("bearer_auth" = []))
)]
pub async fn check_admin(
    State(state): State<UsersState>,
    auth: Authenticated,
    Path(email): Path<String>,
) -> Result<Json<AdminCheckResponse>, PlatformError> {
    if email != auth.email() {
        return Err(PlatformError::forbidden("Can only check your own role"));
    }

    let admin = state.user_repo
        .find_by_email(&email)
        .await?
        .map(|u| u.role.is_admin())
        .unwrap_or(false);

    Ok(Json(AdminCheckResponse { admin }))
}

/// Grant the admin role (admin)
#[utoipa::path(
    patch,
    path = "/users/admin/{email}",
    tag = "users",
    operation_id = "patchUsersGrantAdmin",
    params(
        ("email" = String, Path, description = "User email")
    ),
    responses(
        (status = 200, description = "Role granted", body = SuccessResponse),
        (status = 403, description = "Admin role required"),
        (status = 404, description = "User not found")
    ),
    security(("bearer_auth" = []))
)]
pub async fn grant_admin(
    State(state): State<UsersState>,
    auth: Authenticated,
    Path(email): Path<String>,
) -> Result<Json<SuccessResponse>, PlatformError> {
    require_admin(&state.user_repo, auth.email()).await?;

    let matched = state.user_repo.set_role(&email, UserRole::Admin).await?;
    if !matched {
        return Err(PlatformError::not_found("User", &email));
    }

    tracing::info!(email = %email, granted_by = %auth.email(), "Admin role granted");

    Ok(Json(SuccessResponse::ok()))
}

/// Revoke the admin role (admin)
#[utoipa::path(
    patch,
    path = "/users/remove-admin/{email}",
    tag = "users",
    operation_id = "patchUsersRevokeAdmin",
    params(
        ("email" = String, Path, description = "User email")
    ),
    responses(
        (status = 200, description = "Role revoked", body = SuccessResponse),
        (status = 403, description = "Admin role required"),
        (status = 404, description = "User not found")
    ),
    security(("bearer_auth" = []))
)]
pub async fn revoke_admin(
    State(state): State<UsersState>,
    auth: Authenticated,
    Path(email): Path<String>,
) -> Result<Json<SuccessResponse>, PlatformError> {
    require_admin(&state.user_repo, auth.email()).await?;

    let matched = state.user_repo.set_role(&email, UserRole::User).await?;
    if !matched {
        return Err(PlatformError::not_found("User", &email));
    }

    tracing::info!(email = %email, revoked_by = %auth.email(), "Admin role revoked");

    Ok(Json(SuccessResponse::ok()))
}

/// Flip the caller's subscription state
///
/// Touches only the subscription flag and recorded coupon; the role is
/// never changed here, so this path cannot escalate privileges.
#[utoipa::path(
    patch,
    path = "/subscribe/{email}",
    tag = "users",
    operation_id = "patchSubscribe",
    params(
        ("email" = String, Path, description = "User email; must match the caller")
    ),
    request_body = SubscribeRequest,
    responses(
        (status = 200, description = "Subscription updated", body = SuccessResponse),
        (status = 403, description = "Email does not match the caller"),
        (status = 404, description = "User not found")
    ),
    security(("bearer_auth" = []))
)]
pub async fn subscribe(
    State(state): State<UsersState>,
    auth: Authenticated,
    Path(email): Path<String>,
    Json(req): Json<SubscribeRequest>,
) -> Result<Json<SuccessResponse>, PlatformError> {
    if email != auth.email() {
        return Err(PlatformError::forbidden("Can only change your own subscription"));
    }

    let is_subscribed = req.is_subscribed.unwrap_or(true);
    let matched = state.user_repo
        .set_subscription(&email, is_subscribed, req.coupon.as_deref())
        .await?;
    if !matched {
        return Err(PlatformError::not_found("User", &email));
    }

    tracing::info!(email = %email, subscribed = is_subscribed, "Subscription updated");

    Ok(Json(SuccessResponse::ok()))
}

/// Create users router. Paths are absolute; merge this at the API root.
pub fn users_router(state: UsersState) -> OpenApiRouter {
    OpenApiRouter::new()
        .routes(routes!(list_users, create_user))
        .routes(routes!(get_user))
        .routes(routes!(check_admin, grant_admin))
        .routes(routes!(revoke_admin))
        .routes(routes!(subscribe))
        .with_state(state)
}
