use std::sync::Arc;

use bson::DateTime as BsonDateTime;
use futures::future::join_all;
use validator::Validate;

use crate::entities::{
    experience::{
        validate_new_experience_dates, ExperienceResponse, NewExperienceRequest, UpdateExperienceRequest,
        WorkExperience,
    },
    image::ImageFolder,
    project::DeletedResponse,
};
use crate::errors::AppError;
use crate::repositories::experience::ExperienceRepository;
use crate::storage::images::ImageService;
use crate::utils::object_id::parse_object_id;

pub struct ExperienceHandler {
    pub experience_repo: Arc<dyn ExperienceRepository>,
    pub images: ImageService,
}

impl ExperienceHandler {
    pub fn new(experience_repo: Arc<dyn ExperienceRepository>, images: ImageService) -> Self {
        ExperienceHandler { experience_repo, images }
    }

    pub async fn list_experiences(&self) -> Result<Vec<ExperienceResponse>, AppError> {
        let experiences = self.experience_repo.list_experiences().await?;
        Ok(join_all(experiences.into_iter().map(|e| self.to_response(e))).await)
    }

    pub async fn get_experience(&self, id: &str) -> Result<ExperienceResponse, AppError> {
        let experience = self.find(id).await?;
        Ok(self.to_response(experience).await)
    }

    pub async fn create_experience(&self, request: NewExperienceRequest) -> Result<ExperienceResponse, AppError> {
        request.validate()?;
        validate_new_experience_dates(&request).map_err(|e| {
            let message = e.message.as_deref().unwrap_or("Invalid date range");
            AppError::validation("end_date", message)
        })?;

        let experience = request.prepare_for_insert();
        self.experience_repo.create_experience(&experience).await?;

        tracing::info!(experience_id = %experience.id, company = %experience.company_name, "Work experience created");
        Ok(self.to_response(experience).await)
    }

    /// Applies a partial update; the merged record must still have a coherent date range.
    pub async fn update_experience(
        &self,
        id: &str,
        request: UpdateExperienceRequest,
    ) -> Result<ExperienceResponse, AppError> {
        request.validate()?;
        let mut experience = self.find(id).await?;

        request.apply_to(&mut experience);
        experience
            .check_date_range()
            .map_err(|(field, message)| AppError::validation(field, message))?;

        if !self.experience_repo.update_experience(&experience).await? {
            return Err(not_found());
        }
        Ok(self.to_response(experience).await)
    }

    pub async fn delete_experience(&self, id: &str) -> Result<DeletedResponse, AppError> {
        let experience = self.find(id).await?;

        if !self.experience_repo.delete_experience(&experience.id).await? {
            return Err(not_found());
        }
        if let Some(logo) = &experience.logo {
            self.images.discard(logo).await;
        }

        tracing::info!(experience_id = %experience.id, "Work experience deleted");
        Ok(DeletedResponse {
            message: "Work experience deleted successfully".to_string(),
            id: experience.id.to_hex(),
        })
    }

    pub async fn set_experience_logo(&self, id: &str, bytes: Vec<u8>) -> Result<ExperienceResponse, AppError> {
        let mut experience = self.find(id).await?;
        let uploaded = self.images.upload(ImageFolder::Experiences, bytes).await?;

        let previous = experience.logo.replace(uploaded.clone());
        experience.updated_at = BsonDateTime::now();

        let saved = self.experience_repo.update_experience(&experience).await;
        if !matches!(saved, Ok(true)) {
            self.images.discard(&uploaded).await;
            saved?;
            return Err(not_found());
        }
        if let Some(previous) = previous {
            self.images.discard(&previous).await;
        }
        Ok(self.to_response(experience).await)
    }

    async fn find(&self, id: &str) -> Result<WorkExperience, AppError> {
        let id = parse_object_id(id)?;
        self.experience_repo
            .get_experience_by_id(&id)
            .await?
            .ok_or_else(not_found)
    }

    async fn to_response(&self, mut experience: WorkExperience) -> ExperienceResponse {
        experience.logo = self.images.resign(experience.logo.take()).await;
        ExperienceResponse::from(experience)
    }
}

fn not_found() -> AppError {
    AppError::NotFound("Work experience not found".into())
}
