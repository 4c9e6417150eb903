//! Shared infrastructure

pub mod error;
pub mod api_common;
pub mod middleware;
pub mod tsid;
