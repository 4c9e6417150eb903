//! User Repository

use mongodb::{Collection, Database, IndexModel, bson::doc, bson::Document, options::IndexOptions};
use futures::TryStreamExt;
use chrono::{DateTime, Utc};

use crate::user::entity::{User, UserRole};
use crate::shared::error::{is_duplicate_key_error, PlatformError, Result};
use crate::stats::DayBucket;

pub struct UserRepository {
    collection: Collection<User>,
}

impl UserRepository {
    pub fn new(db: &Database) -> Self {
        Self {
            collection: db.collection("users"),
        }
    }

    /// Create the unique email index. Run once at startup; duplicate-insert
    /// conflicts depend on it.
    pub async fn ensure_indexes(&self) -> Result<()> {
        let index = IndexModel::builder()
            .keys(doc! { "email": 1 })
            .options(IndexOptions::builder().unique(true).build())
            .build();
        self.collection.create_index(index).await?;
        Ok(())
    }

    /// Idempotent-by-conflict insert: a duplicate email is reported as a
    /// conflict and the existing record is never overwritten.
    pub async fn insert(&self, user: &User) -> Result<()> {
        self.collection.insert_one(user).await.map_err(|e| {
            if is_duplicate_key_error(&e) {
                PlatformError::duplicate("User", "email", &user.email)
            } else {
                e.into()
            }
        })?;
        Ok(())
    }

    pub async fn find_by_email(&self, email: &str) -> Result<Option<User>> {
        Ok(self.collection.find_one(doc! { "email": email }).await?)
    }

    pub async fn find_all(&self) -> Result<Vec<User>> {
        let cursor = self.collection
            .find(doc! {})
            .sort(doc! { "createdAt": -1 })
            .await?;
        Ok(cursor.try_collect().await?)
    }

    pub async fn set_role(&self, email: &str, role: UserRole) -> Result<bool> {
        let role_str = serde_json::to_string(&role)?;
        let result = self.collection
            .update_one(
                doc! { "email": email },
                doc! { "$set": { "role": role_str.trim_matches('"') } },
            )
            .await?;
        Ok(result.matched_count > 0)
    }

    /// Subscription-state flip, the second write of the payment workflow.
    /// Not atomic with payment recording; reconciliation catches the gap.
    /// Touches only the subscription flag and coupon, never the role.
    pub async fn set_subscription(
        &self,
        email: &str,
        is_subscribed: bool,
        coupon: Option<&str>,
    ) -> Result<bool> {
        let result = self.collection
            .update_one(
                doc! { "email": email },
                doc! { "$set": subscription_set(is_subscribed, coupon) },
            )
            .await?;
        Ok(result.matched_count > 0)
    }

    /// Subset of `emails` with an existing directory record.
    pub async fn find_known_emails(&self, emails: &[String]) -> Result<Vec<String>> {
        let cursor = self.collection
            .find(doc! { "email": { "$in": emails } })
            .await?;
        let users: Vec<User> = cursor.try_collect().await?;
        Ok(users.into_iter().map(|u| u.email).collect())
    }

    /// Emails of currently subscribed users, for payment reconciliation.
    pub async fn find_subscribed_emails(&self, emails: &[String]) -> Result<Vec<String>> {
        let cursor = self.collection
            .find(doc! { "email": { "$in": emails }, "isSubscribed": true })
            .await?;
        let users: Vec<User> = cursor.try_collect().await?;
        Ok(users.into_iter().map(|u| u.email).collect())
    }

    pub async fn count_all(&self) -> Result<u64> {
        Ok(self.collection.count_documents(doc! {}).await?)
    }

    /// Sign-ups per calendar day since `since`.
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

/// `$set` document for a subscription flip. Role changes go through
/// `set_role` only.
fn subscription_set(is_subscribed: bool, coupon: Option<&str>) -> Document {
    let mut set = doc! { "isSubscribed": is_subscribed };
    if let Some(coupon) = coupon {
        set.insert("coupon", coupon);
    }
    set
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_subscription_set_never_touches_role() {
        let set = subscription_set(true, Some("SAVE25"));
        assert_eq!(set.get_bool("isSubscribed").unwrap(), true);
        assert_eq!(set.get_str("coupon").unwrap(), "SAVE25");
        assert!(!set.contains_key("role"));

        let without_coupon = subscription_set(false, None);
        assert_eq!(without_coupon, doc! { "isSubscribed": false });
    }
}
