//! Analytics Aggregator
//!
//! Point-in-time counts and time-windowed per-day series for the admin
//! dashboard. Series cover only days that have at least one record; callers
//! must not assume zero-filled gaps.

pub mod api;

pub use api::{stats_router, StatsState};

use bson::{Bson, Document};
use serde::Serialize;
use utoipa::ToSchema;

use crate::shared::error::{PlatformError, Result};

/// One day of an analytics series.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct DayBucket {
    /// Calendar day, "%Y-%m-%d"
    pub day: String,
    /// Summed revenue (cents) or record count, depending on metric
    pub value: i64,
}

impl DayBucket {
    /// Build from a `$group` result document (`_id` day string, `value` sum).
    pub fn from_group_doc(doc: &Document) -> Self {
        let day = doc.get_str("_id").unwrap_or_default().to_string();
        let value = match doc.get("value") {
            Some(Bson::Int32(v)) => *v as i64,
            Some(Bson::Int64(v)) => *v,
            Some(Bson::Double(v)) => *v as i64,
            _ => 0,
        };
        Self { day, value }
    }
}

/// Analytics metric selector
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Metric {
    Revenue,
    Products,
    Users,
}

impl Metric {
    pub fn parse(s: &str) -> Result<Self> {
        match s {
            "revenue" => Ok(Self::Revenue),
            "products" => Ok(Self::Products),
            "users" => Ok(Self::Users),
            _ => Err(PlatformError::validation(format!(
                "Invalid metric: {}. Valid options: revenue, products, users", s
            ))),
        }
    }
}

/// Trailing analytics window
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Range {
    Week,
    Month,
    Year,
}

impl Range {
    pub fn parse(s: &str) -> Result<Self> {
        match s {
            "week" => Ok(Self::Week),
            "month" => Ok(Self::Month),
            "year" => Ok(Self::Year),
            _ => Err(PlatformError::validation(format!(
                "Invalid range: {}. Valid options: week, month, year", s
            ))),
        }
    }

    pub fn days(&self) -> i64 {
        match self {
            Self::Week => 7,
            Self::Month => 30,
            Self::Year => 365,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bson::doc;

    #[test]
    fn test_metric_parsing() {
        assert_eq!(Metric::parse("revenue").unwrap(), Metric::Revenue);
        assert_eq!(Metric::parse("products").unwrap(), Metric::Products);
        assert_eq!(Metric::parse("users").unwrap(), Metric::Users);
        assert!(Metric::parse("orders").is_err());
    }

    #[test]
    fn test_range_window_days() {
        assert_eq!(Range::parse("week").unwrap().days(), 7);
        assert_eq!(Range::parse("month").unwrap().days(), 30);
        assert_eq!(Range::parse("year").unwrap().days(), 365);
        assert!(Range::parse("quarter").is_err());
    }

    #[test]
    fn test_day_bucket_from_group_doc() {
        let d = doc! { "_id": "2026-08-27", "value": 42_i64 };
        let bucket = DayBucket::from_group_doc(&d);
        assert_eq!(bucket.day, "2026-08-27");
        assert_eq!(bucket.value, 42);

        // $sum over Int32 amounts comes back as Int32
        let d = doc! { "_id": "2026-08-28", "value": 7_i32 };
        assert_eq!(DayBucket::from_group_doc(&d).value, 7);
    }
}
