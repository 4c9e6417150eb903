//! Product Entity
//!
//! A community-submitted product moving through the moderation lifecycle
//! Pending -> Approved | Rejected. The featured flag is strictly derived
//! from approval; there is no independent toggle.

use serde::{Deserialize, Serialize};
use chrono::{DateTime, Utc};
use bson::serde_helpers::chrono_datetime_as_bson_datetime;

/// Moderation status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ProductStatus {
    Pending,
    Approved,
    Rejected,
}

impl Default for ProductStatus {
    fn default() -> Self {
        Self::Pending
    }
}

impl ProductStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "Pending",
            Self::Approved => "Approved",
            Self::Rejected => "Rejected",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "Pending" => Some(Self::Pending),
            "Approved" => Some(Self::Approved),
            "Rejected" => Some(Self::Rejected),
            _ => None,
        }
    }
}

/// Product entity
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    /// TSID as Crockford Base32 string
    #[serde(rename = "_id")]
    pub id: String,

    pub name: String,

    /// Submitting user's email (owner)
    pub owner_email: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub external_link: Option<String>,

    #[serde(default)]
    pub tags: Vec<String>,

    #[serde(default)]
    pub status: ProductStatus,

    /// Derived: true iff status == Approved
    #[serde(default)]
    pub is_featured: bool,

    /// Upvote count; always equals voters.len()
    #[serde(default)]
    pub upvotes: i64,

    /// Emails of users that have upvoted; no duplicates
    #[serde(default)]
    pub voters: Vec<String>,

    #[serde(with = "chrono_datetime_as_bson_datetime")]
    pub created_at: DateTime<Utc>,
}

impl Product {
    pub fn new(name: impl Into<String>, owner_email: impl Into<String>) -> Self {
        Self {
            id: crate::TsidGenerator::generate(),
            name: name.into(),
            owner_email: owner_email.into(),
            description: None,
            image_url: None,
            external_link: None,
            tags: vec![],
            status: ProductStatus::Pending,
            is_featured: false,
            upvotes: 0,
            voters: vec![],
            created_at: Utc::now(),
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_image_url(mut self, url: impl Into<String>) -> Self {
        self.image_url = Some(url.into());
        self
    }

    pub fn with_external_link(mut self, link: impl Into<String>) -> Self {
        self.external_link = Some(link.into());
        self
    }

    pub fn with_tags(mut self, tags: Vec<String>) -> Self {
        self.tags = tags;
        self
    }

    /// Moderation transition. The single writer of `is_featured`.
    pub fn set_status(&mut self, status: ProductStatus) {
        self.status = status;
        self.is_featured = status == ProductStatus::Approved;
    }

    pub fn is_pending(&self) -> bool {
        self.status == ProductStatus::Pending
    }

    /// Ledger invariant: upvote count matches the unique voter set.
    pub fn voters_consistent(&self) -> bool {
        let unique: std::collections::HashSet<&String> = self.voters.iter().collect();
        unique.len() == self.voters.len() && self.voters.len() as i64 == self.upvotes
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_product_starts_pending() {
        let product = Product::new("X", "owner@example.com");
        assert_eq!(product.status, ProductStatus::Pending);
        assert!(!product.is_featured);
        assert_eq!(product.upvotes, 0);
        assert!(product.voters.is_empty());
        assert!(product.voters_consistent());
    }

    #[test]
    fn test_approval_derives_featured() {
        let mut product = Product::new("X", "owner@example.com");
        product.set_status(ProductStatus::Approved);
        assert_eq!(product.status, ProductStatus::Approved);
        assert!(product.is_featured);
    }

    #[test]
    fn test_rejection_clears_featured() {
        let mut product = Product::new("X", "owner@example.com");
        product.set_status(ProductStatus::Approved);
        product.set_status(ProductStatus::Rejected);
        assert_eq!(product.status, ProductStatus::Rejected);
        assert!(!product.is_featured);
    }

    #[test]
    fn test_featured_implies_approved() {
        let mut product = Product::new("X", "owner@example.com");
        for status in [ProductStatus::Pending, ProductStatus::Approved, ProductStatus::Rejected] {
            product.set_status(status);
            assert!(!product.is_featured || product.status == ProductStatus::Approved);
        }
    }

    #[test]
    fn test_voters_consistency_check() {
        let mut product = Product::new("X", "owner@example.com");
        product.voters.push("a@x.com".to_string());
        product.upvotes = 1;
        assert!(product.voters_consistent());

        product.voters.push("a@x.com".to_string());
        product.upvotes = 2;
        assert!(!product.voters_consistent(), "duplicate voters must be detected");
    }

    #[test]
    fn test_status_parse_round_trip() {
        for status in [ProductStatus::Pending, ProductStatus::Approved, ProductStatus::Rejected] {
            assert_eq!(ProductStatus::parse(status.as_str()), Some(status));
        }
        assert_eq!(ProductStatus::parse("Featured"), None);
    }

    #[test]
    fn test_status_serializes_as_plain_name() {
        let json = serde_json::to_string(&ProductStatus::Pending).unwrap();
        assert_eq!(json, "\"Pending\"");
    }
}
