//! Review Repository

use mongodb::{Collection, Database, bson::doc};
use futures::TryStreamExt;

use crate::review::entity::Review;
use crate::shared::error::Result;

pub struct ReviewRepository {
    collection: Collection<Review>,
}

impl ReviewRepository {
    pub fn new(db: &Database) -> Self {
        Self {
            collection: db.collection("reviews"),
        }
    }

    pub async fn insert(&self, review: &Review) -> Result<()> {
        self.collection.insert_one(review).await?;
        Ok(())
    }

    pub async fn find_all(&self) -> Result<Vec<Review>> {
        let cursor = self.collection
            .find(doc! {})
            .sort(doc! { "createdAt": -1 })
            .await?;
        Ok(cursor.try_collect().await?)
    }

    pub async fn find_by_product(&self, product_id: &str) -> Result<Vec<Review>> {
        let cursor = self.collection
            .find(doc! { "productId": product_id })
            .sort(doc! { "createdAt": -1 })
            .await?;
        Ok(cursor.try_collect().await?)
    }

    pub async fn count_all(&self) -> Result<u64> {
        Ok(self.collection.count_documents(doc! {}).await?)
    }
}
