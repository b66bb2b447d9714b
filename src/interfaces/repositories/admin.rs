use async_trait::async_trait;
use bson::{doc, oid::ObjectId, DateTime as BsonDateTime};

use crate::{
    entities::admin::Admin,
    errors::AppError,
    repositories::mongo_repo::MongoAdminRepo,
};

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait AdminRepository: Send + Sync {
    async fn check_connection(&self) -> Result<(), AppError>;
    async fn count_admins(&self) -> Result<u64, AppError>;
    async fn get_admin_by_username(&self, username: &str) -> Result<Option<Admin>, AppError>;
    async fn get_admin_by_id(&self, id: &ObjectId) -> Result<Option<Admin>, AppError>;
    async fn create_admin(&self, admin: &Admin) -> Result<(), AppError>;
    async fn update_password(&self, id: &ObjectId, password_hash: &str) -> Result<(), AppError>;
    async fn record_login(&self, id: &ObjectId) -> Result<(), AppError>;
}

#[async_trait]
impl AdminRepository for MongoAdminRepo {
    async fn check_connection(&self) -> Result<(), AppError> {
        self.collection
            .client()
            .database("admin")
            .run_command(doc! { "ping": 1 })
            .await
            .map(|_| ())
            .map_err(AppError::from)
    }

    async fn count_admins(&self) -> Result<u64, AppError> {
        Ok(self.collection.count_documents(doc! {}).await?)
    }

    async fn get_admin_by_username(&self, username: &str) -> Result<Option<Admin>, AppError> {
        Ok(self.collection.find_one(doc! { "username": username }).await?)
    }

    async fn get_admin_by_id(&self, id: &ObjectId) -> Result<Option<Admin>, AppError> {
        Ok(self.collection.find_one(doc! { "_id": *id }).await?)
    }

    async fn create_admin(&self, admin: &Admin) -> Result<(), AppError> {
        self.collection.insert_one(admin).await.map_err(|e| match AppError::from(e) {
            AppError::Conflict(_) => AppError::Conflict("Admin with this username already exists".into()),
            other => other,
        })?;
        Ok(())
    }

    async fn update_password(&self, id: &ObjectId, password_hash: &str) -> Result<(), AppError> {
        let result = self
            .collection
            .update_one(
                doc! { "_id": *id },
                doc! { "$set": { "password_hash": password_hash, "updated_at": BsonDateTime::now() } },
            )
            .await?;

        if result.matched_count == 0 {
            return Err(AppError::NotFound("Admin not found".into()));
        }
        Ok(())
    }

    async fn record_login(&self, id: &ObjectId) -> Result<(), AppError> {
        self.collection
            .update_one(doc! { "_id": *id }, doc! { "$set": { "last_login_at": BsonDateTime::now() } })
            .await?;
        Ok(())
    }
}
