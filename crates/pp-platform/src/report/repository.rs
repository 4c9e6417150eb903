//! Report Repository

use mongodb::{Collection, Database, bson::doc};
use futures::TryStreamExt;

use crate::report::entity::Report;
use crate::shared::error::Result;

pub struct ReportRepository {
    collection: Collection<Report>,
}

impl ReportRepository {
    pub fn new(db: &Database) -> Self {
        Self {
            collection: db.collection("reports"),
        }
    }

    pub async fn insert(&self, report: &Report) -> Result<()> {
        self.collection.insert_one(report).await?;
        Ok(())
    }

    pub async fn find_all(&self) -> Result<Vec<Report>> {
        let cursor = self.collection
            .find(doc! {})
            .sort(doc! { "reportedAt": -1 })
            .await?;
        Ok(cursor.try_collect().await?)
    }

    pub async fn count_all(&self) -> Result<u64> {
        Ok(self.collection.count_documents(doc! {}).await?)
    }
}
