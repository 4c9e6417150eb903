//! ProductPulse Platform
//!
//! Backend for a crowd-sourced product discovery community:
//! - Product submissions with a moderation state machine
//! - Idempotent upvote/report engagement ledger
//! - Append-only reviews and moderation reports
//! - User directory with role-gated administration
//! - Coupon catalog and payment-gateway workflow
//! - Admin statistics and time-windowed analytics
//!
//! ## Module Organization (Aggregate-based)
//!
//! Each aggregate contains:
//! - `entity` - Domain entities
//! - `repository` - Data access
//! - `api` - REST endpoints

// Core aggregates
pub mod product;
pub mod review;
pub mod report;
pub mod user;
pub mod coupon;
pub mod payment;

// Analytics
pub mod stats;

// Authentication & authorization
pub mod auth;

// External systems
pub mod gateway;

// Shared infrastructure
pub mod shared;

// Re-export common types from shared
pub use shared::error::{PlatformError, Result};
pub use shared::tsid::TsidGenerator;
pub use shared::middleware::{AppState, Authenticated, AuthLayer};

// Re-export main entity types for convenience
pub use product::entity::{Product, ProductStatus};
pub use review::entity::Review;
pub use report::entity::Report;
pub use user::entity::{User, UserRole};
pub use coupon::entity::Coupon;
pub use payment::entity::Payment;

// Re-export repositories
pub use product::repository::{ProductRepository, UpvoteOutcome};
pub use review::repository::ReviewRepository;
pub use report::repository::ReportRepository;
pub use user::repository::UserRepository;
pub use coupon::repository::CouponRepository;
pub use payment::repository::PaymentRepository;

// Re-export services
pub use auth::auth_service::{AuthService, AuthConfig, AccessTokenClaims};
pub use auth::admin_gate::require_admin;
pub use payment::service::{PaymentService, CouponValidation};
pub use gateway::{PaymentGateway, StripeGateway, ChargeIntent, GatewayCoupon};
