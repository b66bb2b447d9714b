use async_trait::async_trait;
use bson::doc;

use crate::{
    entities::basic_info::{BasicInfo, BASIC_INFO_ID},
    errors::AppError,
    repositories::mongo_repo::MongoBasicInfoRepo,
};

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait BasicInfoRepository: Send + Sync {
    async fn get_basic_info(&self) -> Result<Option<BasicInfo>, AppError>;
    async fn save_basic_info(&self, info: &BasicInfo) -> Result<(), AppError>;
}

#[async_trait]
impl BasicInfoRepository for MongoBasicInfoRepo {
    async fn get_basic_info(&self) -> Result<Option<BasicInfo>, AppError> {
        Ok(self.collection.find_one(doc! { "_id": BASIC_INFO_ID }).await?)
    }

    async fn save_basic_info(&self, info: &BasicInfo) -> Result<(), AppError> {
        self.collection
            .replace_one(doc! { "_id": BASIC_INFO_ID }, info)
            .upsert(true)
            .await?;
        Ok(())
    }
}
