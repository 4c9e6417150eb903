//! Payment Aggregate
//!
//! Append-only ledger plus the coupon/charge-intent workflow.

pub mod entity;
pub mod repository;
pub mod service;
pub mod api;

pub use entity::Payment;
pub use repository::PaymentRepository;
pub use service::{PaymentService, CouponValidation};
pub use api::{PaymentsState, payments_router};
