//! Coupon Aggregate

pub mod entity;
pub mod repository;
pub mod api;

pub use entity::Coupon;
pub use repository::CouponRepository;
pub use api::{CouponsState, coupons_router};
