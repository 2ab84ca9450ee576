use async_trait::async_trait;

use crate::db::models::PageSchema;
use crate::error::AppError;

/// Repository trait for page type field declarations.
#[async_trait]
pub trait PageTypeRepository: Send + Sync {
    /// The declared fields of a page type, or `None` if the type declares nothing.
    async fn field_schema(&self, class_name: &str) -> Result<Option<PageSchema>, AppError>;

    /// Register or replace the declaration of a page type.
    async fn register(&self, schema: PageSchema) -> Result<(), AppError>;
}

/// MongoDB implementation of the PageTypeRepository.
pub struct MongoPageTypeRepository {
    collection: mongodb::Collection<PageSchema>,
}

impl MongoPageTypeRepository {
    pub fn new(db: &mongodb::Database) -> Self {
        Self {
            collection: db.collection("page_types"),
        }
    }
}

#[async_trait]
impl PageTypeRepository for MongoPageTypeRepository {
    async fn field_schema(&self, class_name: &str) -> Result<Option<PageSchema>, AppError> {
        use mongodb::bson::doc;

        self.collection
            .find_one(doc! { "class_name": class_name })
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    async fn register(&self, schema: PageSchema) -> Result<(), AppError> {
        use mongodb::bson::doc;
        use mongodb::options::ReplaceOptions;

        let filter = doc! { "class_name": &schema.class_name };
        let options = ReplaceOptions::builder().upsert(true).build();

        self.collection
            .replace_one(filter, &schema)
            .with_options(options)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(())
    }
}
