use async_trait::async_trait;
use bson::{doc, oid::ObjectId};
use futures::TryStreamExt;

use crate::{
    entities::experience::{sort_experiences, WorkExperience},
    errors::AppError,
    repositories::mongo_repo::MongoExperienceRepo,
};

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ExperienceRepository: Send + Sync {
    /// Current positions first, then by start date descending.
    async fn list_experiences(&self) -> Result<Vec<WorkExperience>, AppError>;
    async fn get_experience_by_id(&self, id: &ObjectId) -> Result<Option<WorkExperience>, AppError>;
    async fn create_experience(&self, experience: &WorkExperience) -> Result<(), AppError>;
    async fn update_experience(&self, experience: &WorkExperience) -> Result<bool, AppError>;
    async fn delete_experience(&self, id: &ObjectId) -> Result<bool, AppError>;
    async fn count_experiences(&self) -> Result<u64, AppError>;
}

#[async_trait]
impl ExperienceRepository for MongoExperienceRepo {
    async fn list_experiences(&self) -> Result<Vec<WorkExperience>, AppError> {
        let mut items: Vec<WorkExperience> = self.collection.find(doc! {}).await?.try_collect().await?;
        sort_experiences(&mut items);
        Ok(items)
    }

    async fn get_experience_by_id(&self, id: &ObjectId) -> Result<Option<WorkExperience>, AppError> {
        Ok(self.collection.find_one(doc! { "_id": *id }).await?)
    }

    async fn create_experience(&self, experience: &WorkExperience) -> Result<(), AppError> {
        self.collection.insert_one(experience).await?;
        Ok(())
    }

    async fn update_experience(&self, experience: &WorkExperience) -> Result<bool, AppError> {
        let result = self
            .collection
            .replace_one(doc! { "_id": experience.id }, experience)
            .await?;
        Ok(result.matched_count > 0)
    }

    async fn delete_experience(&self, id: &ObjectId) -> Result<bool, AppError> {
        let result = self.collection.delete_one(doc! { "_id": *id }).await?;
        Ok(result.deleted_count > 0)
    }

    async fn count_experiences(&self) -> Result<u64, AppError> {
        Ok(self.collection.count_documents(doc! {}).await?)
    }
}
