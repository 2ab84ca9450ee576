use async_trait::async_trait;

use crate::db::models::{Page, PageId};
use crate::error::AppError;

/// Repository trait for the site tree.
///
/// This trait allows mocking the database layer in tests.
#[async_trait]
pub trait PageRepository: Send + Sync {
    /// Find a page by its id.
    async fn find_by_id(&self, id: PageId) -> Result<Option<Page>, AppError>;

    /// List every page in the site tree.
    async fn list_all(&self) -> Result<Vec<Page>, AppError>;

    /// Persist a page (matched by id).
    async fn save(&self, page: &Page) -> Result<(), AppError>;
}

/// MongoDB implementation of the PageRepository.
pub struct MongoPageRepository {
    collection: mongodb::Collection<Page>,
}

impl MongoPageRepository {
    pub fn new(db: &mongodb::Database) -> Self {
        Self {
            collection: db.collection("pages"),
        }
    }
}

#[async_trait]
impl PageRepository for MongoPageRepository {
    async fn find_by_id(&self, id: PageId) -> Result<Option<Page>, AppError> {
        use mongodb::bson::doc;

        self.collection
            .find_one(doc! { "id": id })
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    async fn list_all(&self) -> Result<Vec<Page>, AppError> {
        use futures::TryStreamExt;
        use mongodb::bson::doc;
        use mongodb::options::FindOptions;

        let options = FindOptions::builder().sort(doc! { "id": 1 }).build();

        let cursor = self
            .collection
            .find(doc! {})
            .with_options(options)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        cursor
            .try_collect()
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    async fn save(&self, page: &Page) -> Result<(), AppError> {
        use mongodb::bson::doc;
        use mongodb::options::ReplaceOptions;

        let options = ReplaceOptions::builder().upsert(true).build();

        self.collection
            .replace_one(doc! { "id": page.id }, page)
            .with_options(options)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(())
    }
}
