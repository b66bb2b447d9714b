use async_trait::async_trait;
use bson::{doc, oid::ObjectId, Bson, Document};
use futures::TryStreamExt;

use crate::{
    entities::{
        category::{Category, CategoryKind},
        image::StoredImage,
        pagination::PageRequest,
        project::Project,
    },
    errors::AppError,
    repositories::mongo_repo::MongoProjectRepo,
};

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ProjectRepository: Send + Sync {
    /// Newest first, with the total count matching the filter.
    async fn list_projects(
        &self,
        category: Option<CategoryKind>,
        page: PageRequest,
    ) -> Result<(Vec<Project>, u64), AppError>;
    async fn get_project_by_id(&self, id: &ObjectId) -> Result<Option<Project>, AppError>;
    async fn create_project(&self, project: &Project) -> Result<(), AppError>;
    async fn update_project(&self, project: &Project) -> Result<bool, AppError>;
    async fn delete_project(&self, id: &ObjectId) -> Result<bool, AppError>;
    /// Images of every project that references the category in any stored form.
    async fn project_images_in_category(&self, category: &Category) -> Result<Vec<StoredImage>, AppError>;
    async fn delete_projects_in_category(&self, category: &Category) -> Result<u64, AppError>;
    async fn count_projects(&self, category: Option<CategoryKind>) -> Result<u64, AppError>;
    /// Rewrites projects that still reference a category by id or title to the kind.
    async fn normalize_legacy_categories(&self, categories: &[Category]) -> Result<u64, AppError>;
}

fn category_filter(category: Option<CategoryKind>) -> Document {
    match category {
        Some(kind) => doc! { "category": kind.as_str() },
        None => doc! {},
    }
}

/// Values a project's `category` field can hold while pointing at `category`:
/// the kind, or the category id stored as an ObjectId or as a hex string.
pub fn category_references(category: &Category) -> Vec<Bson> {
    vec![
        Bson::String(category.category_type.as_str().to_string()),
        Bson::ObjectId(category.id),
        Bson::String(category.id.to_hex()),
    ]
}

pub fn cascade_filter(category: &Category) -> Document {
    doc! { "category": { "$in": category_references(category) } }
}

#[async_trait]
impl ProjectRepository for MongoProjectRepo {
    async fn list_projects(
        &self,
        category: Option<CategoryKind>,
        page: PageRequest,
    ) -> Result<(Vec<Project>, u64), AppError> {
        let filter = category_filter(category);
        let total = self.collection.count_documents(filter.clone()).await?;

        let items = self
            .collection
            .find(filter)
            .sort(doc! { "created_at": -1, "_id": -1 })
            .skip(page.offset())
            .limit(page.limit as i64)
            .await?
            .try_collect()
            .await?;

        Ok((items, total))
    }

    async fn get_project_by_id(&self, id: &ObjectId) -> Result<Option<Project>, AppError> {
        Ok(self.collection.find_one(doc! { "_id": *id }).await?)
    }

    async fn create_project(&self, project: &Project) -> Result<(), AppError> {
        self.collection.insert_one(project).await?;
        Ok(())
    }

    async fn update_project(&self, project: &Project) -> Result<bool, AppError> {
        let result = self
            .collection
            .replace_one(doc! { "_id": project.id }, project)
            .await?;
        Ok(result.matched_count > 0)
    }

    async fn delete_project(&self, id: &ObjectId) -> Result<bool, AppError> {
        let result = self.collection.delete_one(doc! { "_id": *id }).await?;
        Ok(result.deleted_count > 0)
    }

    async fn project_images_in_category(&self, category: &Category) -> Result<Vec<StoredImage>, AppError> {
        // Raw documents: legacy references do not decode as `Project`.
        let docs: Vec<Document> = self
            .collection
            .clone_with_type::<Document>()
            .find(cascade_filter(category))
            .projection(doc! { "image": 1 })
            .await?
            .try_collect()
            .await?;

        Ok(docs
            .into_iter()
            .filter_map(|doc| {
                let image = doc.get_document("image").ok()?.clone();
                bson::from_document::<StoredImage>(image)
                    .inspect_err(|e| tracing::warn!("Skipping unreadable project image: {}", e))
                    .ok()
            })
            .collect())
    }

    async fn delete_projects_in_category(&self, category: &Category) -> Result<u64, AppError> {
        let result = self.collection.delete_many(cascade_filter(category)).await?;
        Ok(result.deleted_count)
    }

    async fn count_projects(&self, category: Option<CategoryKind>) -> Result<u64, AppError> {
        Ok(self.collection.count_documents(category_filter(category)).await?)
    }

    async fn normalize_legacy_categories(&self, categories: &[Category]) -> Result<u64, AppError> {
        let raw = self.collection.clone_with_type::<Document>();
        let mut rewritten = 0;

        for category in categories {
            let legacy_refs: Vec<Bson> = vec![
                Bson::ObjectId(category.id),
                Bson::String(category.id.to_hex()),
                Bson::String(category.title.clone()),
            ];
            let result = raw
                .update_many(
                    doc! { "category": { "$in": legacy_refs } },
                    doc! { "$set": { "category": category.category_type.as_str() } },
                )
                .await?;
            rewritten += result.modified_count;
        }

        // Capitalized kind names ("Product") from older clients.
        for kind in CategoryKind::ALL {
            let pattern = format!("^{}$", kind.as_str());
            let result = raw
                .update_many(
                    doc! { "category": { "$regex": pattern, "$options": "i", "$ne": kind.as_str() } },
                    doc! { "$set": { "category": kind.as_str() } },
                )
                .await?;
            rewritten += result.modified_count;
        }

        Ok(rewritten)
    }
}
