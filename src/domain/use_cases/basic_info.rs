use std::sync::Arc;

use bson::DateTime as BsonDateTime;
use validator::Validate;

use crate::entities::{
    basic_info::{BasicInfo, BasicInfoResponse, UpdateBasicInfoRequest},
    image::ImageFolder,
};
use crate::errors::AppError;
use crate::repositories::basic_info::BasicInfoRepository;
use crate::storage::images::ImageService;

pub struct BasicInfoHandler {
    pub basic_info_repo: Arc<dyn BasicInfoRepository>,
    pub images: ImageService,
}

impl BasicInfoHandler {
    pub fn new(basic_info_repo: Arc<dyn BasicInfoRepository>, images: ImageService) -> Self {
        BasicInfoHandler { basic_info_repo, images }
    }

    pub async fn get_basic_info(&self) -> Result<BasicInfoResponse, AppError> {
        let info = self.load().await?;
        Ok(self.to_response(info).await)
    }

    /// Creates or replaces the singleton document. The profile picture is kept.
    pub async fn save_basic_info(&self, request: UpdateBasicInfoRequest) -> Result<BasicInfoResponse, AppError> {
        request.validate()?;
        let existing = self.basic_info_repo.get_basic_info().await?;
        let info = request.into_basic_info(existing);

        self.basic_info_repo.save_basic_info(&info).await?;
        tracing::info!("Basic info saved");
        Ok(self.to_response(info).await)
    }

    pub async fn set_profile_picture(&self, bytes: Vec<u8>) -> Result<BasicInfoResponse, AppError> {
        let mut info = self.load().await?;
        let uploaded = self.images.upload(ImageFolder::Profile, bytes).await?;

        let previous = info.profile_picture.replace(uploaded.clone());
        info.updated_at = BsonDateTime::now();

        if let Err(e) = self.basic_info_repo.save_basic_info(&info).await {
            self.images.discard(&uploaded).await;
            return Err(e);
        }
        if let Some(previous) = previous {
            self.images.discard(&previous).await;
        }
        Ok(self.to_response(info).await)
    }

    pub async fn remove_profile_picture(&self) -> Result<BasicInfoResponse, AppError> {
        let mut info = self.load().await?;
        let Some(picture) = info.profile_picture.take() else {
            return Err(AppError::NotFound("No profile picture is set".into()));
        };
        info.updated_at = BsonDateTime::now();

        self.basic_info_repo.save_basic_info(&info).await?;
        self.images.discard(&picture).await;
        Ok(self.to_response(info).await)
    }

    async fn load(&self) -> Result<BasicInfo, AppError> {
        self.basic_info_repo
            .get_basic_info()
            .await?
            .ok_or_else(|| AppError::NotFound("Basic info has not been set up yet".into()))
    }

    async fn to_response(&self, mut info: BasicInfo) -> BasicInfoResponse {
        info.profile_picture = self.images.resign(info.profile_picture.take()).await;
        BasicInfoResponse::from(info)
    }
}
