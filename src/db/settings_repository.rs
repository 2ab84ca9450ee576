use async_trait::async_trait;

use crate::db::models::{CanViewType, SiteConfig};
use crate::error::AppError;

/// Repository trait for site-wide settings.
#[async_trait]
pub trait SiteConfigRepository: Send + Sync {
    /// Get the global site config, falling back to defaults when none is stored.
    async fn get_site_config(&self) -> Result<SiteConfig, AppError>;

    /// Update the site-wide view permission.
    async fn set_can_view_type(&self, can_view_type: CanViewType) -> Result<(), AppError>;
}

/// MongoDB implementation of the SiteConfigRepository.
pub struct MongoSiteConfigRepository {
    collection: mongodb::Collection<SiteConfig>,
}

impl MongoSiteConfigRepository {
    pub fn new(db: &mongodb::Database) -> Self {
        Self {
            collection: db.collection("site_config"),
        }
    }
}

#[async_trait]
impl SiteConfigRepository for MongoSiteConfigRepository {
    async fn get_site_config(&self) -> Result<SiteConfig, AppError> {
        use mongodb::bson::doc;

        let result = self
            .collection
            .find_one(doc! { "key": "global" })
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(result.unwrap_or_default())
    }

    async fn set_can_view_type(&self, can_view_type: CanViewType) -> Result<(), AppError> {
        use mongodb::bson::{doc, to_bson};
        use mongodb::options::UpdateOptions;

        let value = to_bson(&can_view_type).map_err(|e| AppError::Database(e.to_string()))?;
        let options = UpdateOptions::builder().upsert(true).build();

        self.collection
            .update_one(
                doc! { "key": "global" },
                doc! { "$set": { "key": "global", "can_view_type": value } },
            )
            .with_options(options)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(())
    }
}
