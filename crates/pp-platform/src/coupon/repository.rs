//! Coupon Repository

use mongodb::{Collection, Database, bson::doc};
use futures::TryStreamExt;

use crate::coupon::entity::Coupon;
use crate::shared::error::Result;

pub struct CouponRepository {
    collection: Collection<Coupon>,
}

impl CouponRepository {
    pub fn new(db: &Database) -> Self {
        Self {
            collection: db.collection("coupons"),
        }
    }

    pub async fn insert(&self, coupon: &Coupon) -> Result<()> {
        self.collection.insert_one(coupon).await?;
        Ok(())
    }

    pub async fn find_all(&self) -> Result<Vec<Coupon>> {
        let cursor = self.collection
            .find(doc! {})
            .sort(doc! { "createdAt": -1 })
            .await?;
        Ok(cursor.try_collect().await?)
    }

    pub async fn delete(&self, id: &str) -> Result<bool> {
        let result = self.collection.delete_one(doc! { "_id": id }).await?;
        Ok(result.deleted_count > 0)
    }
}
