//! Review Aggregate

pub mod entity;
pub mod repository;
pub mod api;

pub use entity::Review;
pub use repository::ReviewRepository;
pub use api::{ReviewsState, reviews_router};
