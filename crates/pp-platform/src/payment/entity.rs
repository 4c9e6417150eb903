//! Payment Entity
//!
//! Append-only ledger entry, the sole source of truth for "has this user
//! paid". Never mutated; the related User subscription flip is a separate,
//! non-atomic step.

use serde::{Deserialize, Serialize};
use chrono::{DateTime, Utc};
use bson::serde_helpers::chrono_datetime_as_bson_datetime;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Payment {
    #[serde(rename = "_id")]
    pub id: String,

    pub user_email: String,

    /// Amount charged, in cents
    pub amount: i64,

    /// Gateway transaction reference reported by the client
    pub transaction_id: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub coupon: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub discount_percent: Option<f64>,

    #[serde(with = "chrono_datetime_as_bson_datetime")]
    pub date: DateTime<Utc>,
}

impl Payment {
    pub fn new(user_email: impl Into<String>, amount: i64, transaction_id: impl Into<String>) -> Self {
        Self {
            id: crate::TsidGenerator::generate(),
            user_email: user_email.into(),
            amount,
            transaction_id: transaction_id.into(),
            coupon: None,
            discount_percent: None,
            date: Utc::now(),
        }
    }

    pub fn with_coupon(mut self, coupon: impl Into<String>, discount_percent: f64) -> Self {
        self.coupon = Some(coupon.into());
        self.discount_percent = Some(discount_percent);
        self
    }

    pub fn with_date(mut self, date: DateTime<Utc>) -> Self {
        self.date = date;
        self
    }
}
