//! Product Repository
//!
//! All engagement-ledger writes live here. The upvote is one conditional
//! update so the voter-set/count invariant holds under concurrent requests.

use mongodb::{Collection, Database, bson::doc, bson::Document};
use futures::TryStreamExt;
use chrono::{DateTime, Utc};

use crate::product::entity::{Product, ProductStatus};
use crate::shared::error::Result;
use crate::stats::DayBucket;

/// Outcome of an upvote attempt.
///
/// `NoChange` covers both "voter already counted" and "no such product";
/// callers that need to distinguish do an existence check first.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpvoteOutcome {
    Applied,
    NoChange,
}

pub struct ProductRepository {
    collection: Collection<Product>,
}

impl ProductRepository {
    pub fn new(db: &Database) -> Self {
        Self {
            collection: db.collection("products"),
        }
    }

    pub async fn insert(&self, product: &Product) -> Result<()> {
        self.collection.insert_one(product).await?;
        Ok(())
    }

    pub async fn find_by_id(&self, id: &str) -> Result<Option<Product>> {
        Ok(self.collection.find_one(doc! { "_id": id }).await?)
    }

    pub async fn find_paged(&self, filter: Document, offset: u64, limit: i64) -> Result<Vec<Product>> {
        let cursor = self.collection
            .find(filter)
            .sort(doc! { "createdAt": -1 })
            .skip(offset)
            .limit(limit)
            .await?;
        Ok(cursor.try_collect().await?)
    }

    /// Batch lookup for joined listings (report summaries).
    pub async fn find_by_ids(&self, ids: &[String]) -> Result<Vec<Product>> {
        if ids.is_empty() {
            return Ok(vec![]);
        }
        let cursor = self.collection
            .find(doc! { "_id": { "$in": ids } })
            .await?;
        Ok(cursor.try_collect().await?)
    }

    pub async fn count(&self, filter: Document) -> Result<u64> {
        Ok(self.collection.count_documents(filter).await?)
    }

    /// Featured listing: approved-and-featured products, newest first.
    pub async fn find_featured(&self, limit: i64) -> Result<Vec<Product>> {
        let cursor = self.collection
            .find(doc! { "isFeatured": true })
            .sort(doc! { "createdAt": -1 })
            .limit(limit)
            .await?;
        Ok(cursor.try_collect().await?)
    }

    /// Moderation review queue.
    pub async fn find_pending(&self) -> Result<Vec<Product>> {
        let cursor = self.collection
            .find(doc! { "status": "Pending" })
            .sort(doc! { "createdAt": -1 })
            .await?;
        Ok(cursor.try_collect().await?)
    }

    /// Record an upvote exactly once per voter.
    ///
    /// Single conditional write: the `voters: {$ne}` guard and the
    /// `$inc`/`$push` mutation are one MongoDB operation, so two concurrent
    /// requests from the same voter cannot both pass the precondition.
    pub async fn upvote(&self, id: &str, voter_email: &str) -> Result<UpvoteOutcome> {
        let result = self.collection
            .update_one(upvote_filter(id, voter_email), upvote_update(voter_email))
            .await?;

        if result.modified_count > 0 {
            Ok(UpvoteOutcome::Applied)
        } else {
            Ok(UpvoteOutcome::NoChange)
        }
    }

    /// Moderation decision; writes status and the derived featured flag.
    pub async fn set_status(&self, id: &str, status: ProductStatus) -> Result<bool> {
        let result = self.collection
            .update_one(
                doc! { "_id": id },
                doc! { "$set": {
                    "status": status.as_str(),
                    "isFeatured": status == ProductStatus::Approved,
                } },
            )
            .await?;
        Ok(result.matched_count > 0)
    }

    /// Owner field patch. The `$set` document is built by the API layer from
    /// an allow-list; voters/upvotes/status/isFeatured never appear in it.
    pub async fn update_fields(&self, id: &str, set: Document) -> Result<bool> {
        if set.is_empty() {
            return Ok(true);
        }
        let result = self.collection
            .update_one(doc! { "_id": id }, doc! { "$set": set })
            .await?;
        Ok(result.matched_count > 0)
    }

    pub async fn delete(&self, id: &str) -> Result<bool> {
        let result = self.collection.delete_one(doc! { "_id": id }).await?;
        Ok(result.deleted_count > 0)
    }

    pub async fn count_all(&self) -> Result<u64> {
        Ok(self.collection.count_documents(doc! {}).await?)
    }

    pub async fn count_by_status(&self, status: ProductStatus) -> Result<u64> {
        Ok(self.collection.count_documents(doc! { "status": status.as_str() }).await?)
    }

    /// Products created per calendar day since `since`; days without
    /// submissions are absent from the result.
    pub async fn count_by_day(&self, since: DateTime<Utc>) -> Result<Vec<DayBucket>> {
        let cursor = self.collection
            .aggregate(vec![
                doc! { "$match": { "createdAt": { "$gte": since } } },
                doc! { "$group": {
                    "_id": { "$dateToString": { "format": "%Y-%m-%d", "date": "$createdAt" } },
                    "value": { "$sum": 1 },
                } },
                doc! { "$sort": { "_id": 1 } },
            ])
            .await?;
        let docs: Vec<Document> = cursor.try_collect().await?;
        Ok(docs.iter().map(DayBucket::from_group_doc).collect())
    }
}

/// Precondition for the upvote write: the voter is not yet in the set.
fn upvote_filter(id: &str, voter_email: &str) -> Document {
    doc! { "_id": id, "voters": { "$ne": voter_email } }
}

/// Mutation paired with the guard: one increment, one new voter entry.
fn upvote_update(voter_email: &str) -> Document {
    doc! { "$inc": { "upvotes": 1 }, "$push": { "voters": voter_email } }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_upvote_guard_excludes_existing_voters() {
        let filter = upvote_filter("0HZXEQ5Y8JY5Z", "a@example.com");
        assert_eq!(
            filter,
            doc! { "_id": "0HZXEQ5Y8JY5Z", "voters": { "$ne": "a@example.com" } },
            "the write must only match documents where this voter is absent"
        );
    }

    #[test]
    fn test_upvote_mutation_is_one_count_one_voter() {
        let update = upvote_update("a@example.com");
        assert_eq!(update.get_document("$inc").unwrap(), &doc! { "upvotes": 1 });
        assert_eq!(update.get_document("$push").unwrap(), &doc! { "voters": "a@example.com" });
    }

    #[test]
    fn test_upvote_guard_and_mutation_reference_same_voter() {
        // At-most-once per voter holds only if the guard and the push are
        // keyed by the same email.
        let voter = "b@example.com";
        let guarded = upvote_filter("0HZXEQ5Y8JY5Z", voter)
            .get_document("voters").unwrap()
            .get_str("$ne").unwrap()
            .to_string();
        let pushed = upvote_update(voter)
            .get_document("$push").unwrap()
            .get_str("voters").unwrap()
            .to_string();
        assert_eq!(guarded, pushed);
        assert_eq!(guarded, voter);
    }
}
