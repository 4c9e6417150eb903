//! Authentication & authorization

pub mod auth_service;
pub mod admin_gate;

pub use auth_service::{AuthService, AuthConfig, AccessTokenClaims, extract_bearer_token};
pub use admin_gate::require_admin;
