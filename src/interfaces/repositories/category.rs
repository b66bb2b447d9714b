use async_trait::async_trait;
use bson::{doc, oid::ObjectId};
use futures::TryStreamExt;

use crate::{
    entities::category::{Category, CategoryKind},
    errors::AppError,
    repositories::mongo_repo::MongoCategoryRepo,
};

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CategoryRepository: Send + Sync {
    async fn list_categories(&self) -> Result<Vec<Category>, AppError>;
    async fn get_category_by_id(&self, id: &ObjectId) -> Result<Option<Category>, AppError>;
    async fn get_category_by_kind(&self, kind: CategoryKind) -> Result<Option<Category>, AppError>;
    async fn create_category(&self, category: &Category) -> Result<(), AppError>;
    /// Returns false when no document matched.
    async fn update_category(&self, category: &Category) -> Result<bool, AppError>;
    async fn delete_category(&self, id: &ObjectId) -> Result<bool, AppError>;
    async fn count_categories(&self, enabled_only: bool) -> Result<u64, AppError>;
}

#[async_trait]
impl CategoryRepository for MongoCategoryRepo {
    async fn list_categories(&self) -> Result<Vec<Category>, AppError> {
        let mut categories: Vec<Category> = self.collection.find(doc! {}).await?.try_collect().await?;
        categories.sort_by_key(|c| c.category_type);
        Ok(categories)
    }

    async fn get_category_by_id(&self, id: &ObjectId) -> Result<Option<Category>, AppError> {
        Ok(self.collection.find_one(doc! { "_id": *id }).await?)
    }

    async fn get_category_by_kind(&self, kind: CategoryKind) -> Result<Option<Category>, AppError> {
        Ok(self.collection.find_one(doc! { "category_type": kind.as_str() }).await?)
    }

    async fn create_category(&self, category: &Category) -> Result<(), AppError> {
        self.collection.insert_one(category).await.map_err(|e| match AppError::from(e) {
            AppError::Conflict(_) => AppError::Conflict(format!(
                "A category of type '{}' already exists",
                category.category_type
            )),
            other => other,
        })?;
        Ok(())
    }

    async fn update_category(&self, category: &Category) -> Result<bool, AppError> {
        let result = self
            .collection
            .replace_one(doc! { "_id": category.id }, category)
            .await?;
        Ok(result.matched_count > 0)
    }

    async fn delete_category(&self, id: &ObjectId) -> Result<bool, AppError> {
        let result = self.collection.delete_one(doc! { "_id": *id }).await?;
        Ok(result.deleted_count > 0)
    }

    async fn count_categories(&self, enabled_only: bool) -> Result<u64, AppError> {
        let filter = if enabled_only { doc! { "enabled": true } } else { doc! {} };
        Ok(self.collection.count_documents(filter).await?)
    }
}
