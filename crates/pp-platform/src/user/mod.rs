//! User Aggregate
//!
//! Directory, roles and the subscription flag.

pub mod entity;
pub mod repository;
pub mod api;

pub use entity::{User, UserRole};
pub use repository::UserRepository;
pub use api::{UsersState, users_router};
