use std::sync::Arc;

use mongodb::Database;

use crate::repositories::{
    admin::AdminRepository,
    basic_info::BasicInfoRepository,
    category::CategoryRepository,
    experience::ExperienceRepository,
    log::LogRepository,
    mongo_repo::{
        MongoAdminRepo, MongoBasicInfoRepo, MongoCategoryRepo, MongoExperienceRepo, MongoLogRepo,
        MongoProjectRepo,
    },
    project::ProjectRepository,
};

/// One handle per collection, shared by every use-case handler.
#[derive(Clone)]
pub struct SharedRepositories {
    pub admin_repo: Arc<dyn AdminRepository>,
    pub category_repo: Arc<dyn CategoryRepository>,
    pub project_repo: Arc<dyn ProjectRepository>,
    pub experience_repo: Arc<dyn ExperienceRepository>,
    pub basic_info_repo: Arc<dyn BasicInfoRepository>,
    pub log_repo: Arc<dyn LogRepository>,
}

impl SharedRepositories {
    pub fn mongo(db: &Database) -> Self {
        SharedRepositories {
            admin_repo: Arc::new(MongoAdminRepo::new(db)),
            category_repo: Arc::new(MongoCategoryRepo::new(db)),
            project_repo: Arc::new(MongoProjectRepo::new(db)),
            experience_repo: Arc::new(MongoExperienceRepo::new(db)),
            basic_info_repo: Arc::new(MongoBasicInfoRepo::new(db)),
            log_repo: Arc::new(MongoLogRepo::new(db)),
        }
    }
}
