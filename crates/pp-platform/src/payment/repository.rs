//! Payment Repository

use mongodb::{Collection, Database, bson::doc, bson::Bson, bson::Document};
use futures::TryStreamExt;
use chrono::{DateTime, Utc};

use crate::payment::entity::Payment;
use crate::shared::error::Result;
use crate::stats::DayBucket;

pub struct PaymentRepository {
    collection: Collection<Payment>,
}

impl PaymentRepository {
    pub fn new(db: &Database) -> Self {
        Self {
            collection: db.collection("payments"),
        }
    }

    pub async fn insert(&self, payment: &Payment) -> Result<()> {
        self.collection.insert_one(payment).await?;
        Ok(())
    }

    pub async fn find_by_user(&self, email: &str) -> Result<Vec<Payment>> {
        let cursor = self.collection
            .find(doc! { "userEmail": email })
            .sort(doc! { "date": -1 })
            .await?;
        Ok(cursor.try_collect().await?)
    }

    pub async fn find_all(&self) -> Result<Vec<Payment>> {
        let cursor = self.collection
            .find(doc! {})
            .sort(doc! { "date": -1 })
            .await?;
        Ok(cursor.try_collect().await?)
    }

    /// Sum of all recorded amounts, in cents.
    pub async fn total_revenue(&self) -> Result<i64> {
        let cursor = self.collection
            .aggregate(vec![
                doc! { "$group": { "_id": null, "total": { "$sum": "$amount" } } },
            ])
            .await?;
        let docs: Vec<Document> = cursor.try_collect().await?;
        Ok(docs.first()
            .map(|d| match d.get("total") {
                Some(Bson::Int32(v)) => *v as i64,
                Some(Bson::Int64(v)) => *v,
                Some(Bson::Double(v)) => *v as i64,
                _ => 0,
            })
            .unwrap_or(0))
    }

    /// Revenue per calendar day since `since`; days without payments are
    /// absent from the result.
    pub async fn revenue_by_day(&self, since: DateTime<Utc>) -> Result<Vec<DayBucket>> {
        let cursor = self.collection
            .aggregate(vec![
                doc! { "$match": { "date": { "$gte": since } } },
                doc! { "$group": {
                    "_id": { "$dateToString": { "format": "%Y-%m-%d", "date": "$date" } },
                    "value": { "$sum": "$amount" },
                } },
                doc! { "$sort": { "_id": 1 } },
            ])
            .await?;
        let docs: Vec<Document> = cursor.try_collect().await?;
        Ok(docs.iter().map(DayBucket::from_group_doc).collect())
    }
}
