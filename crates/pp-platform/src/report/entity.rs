//! Report Entity
//!
//! Append-only moderation report. References the product but survives its
//! deletion; the joined listing must tolerate missing products.

use serde::{Deserialize, Serialize};
use chrono::{DateTime, Utc};
use bson::serde_helpers::chrono_datetime_as_bson_datetime;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Report {
    #[serde(rename = "_id")]
    pub id: String,

    pub product_id: String,

    pub reporter_email: String,

    #[serde(with = "chrono_datetime_as_bson_datetime")]
    pub reported_at: DateTime<Utc>,
}

impl Report {
    pub fn new(product_id: impl Into<String>, reporter_email: impl Into<String>) -> Self {
        Self {
            id: crate::TsidGenerator::generate(),
            product_id: product_id.into(),
            reporter_email: reporter_email.into(),
            reported_at: Utc::now(),
        }
    }
}
