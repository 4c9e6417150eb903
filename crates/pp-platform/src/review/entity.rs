//! Review Entity
//!
//! Append-only community review of a product. References the product but
//! does not own it.

use serde::{Deserialize, Serialize};
use chrono::{DateTime, Utc};
use bson::serde_helpers::chrono_datetime_as_bson_datetime;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Review {
    #[serde(rename = "_id")]
    pub id: String,

    pub product_id: String,

    pub reviewer_name: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// 1 through 5, validated at the API boundary
    pub rating: i32,

    #[serde(with = "chrono_datetime_as_bson_datetime")]
    pub created_at: DateTime<Utc>,
}

impl Review {
    pub fn new(product_id: impl Into<String>, reviewer_name: impl Into<String>, rating: i32) -> Self {
        Self {
            id: crate::TsidGenerator::generate(),
            product_id: product_id.into(),
            reviewer_name: reviewer_name.into(),
            description: None,
            rating,
            created_at: Utc::now(),
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }
}
