//! Report Aggregate

pub mod entity;
pub mod repository;
pub mod api;

pub use entity::Report;
pub use repository::ReportRepository;
pub use api::{ReportsState, reports_router};
