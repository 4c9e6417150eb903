//! Product Aggregate
//!
//! Submissions, the moderation state machine and the engagement ledger.

pub mod entity;
pub mod repository;
pub mod api;

// Re-export main types
pub use entity::{Product, ProductStatus};
pub use repository::{ProductRepository, UpvoteOutcome};
pub use api::{ProductsState, products_router};
