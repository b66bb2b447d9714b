use mongodb::{Collection, Database};

use crate::db::mongo::{ADMINS, BASIC_INFO, CATEGORIES, LOGS, PROJECTS, WORK_EXPERIENCES};
use crate::entities::{
    admin::Admin, basic_info::BasicInfo, category::Category, experience::WorkExperience,
    log_entry::LogEntry, project::Project,
};

#[derive(Clone)]
pub struct MongoAdminRepo {
    pub collection: Collection<Admin>,
}

#[derive(Clone)]
pub struct MongoCategoryRepo {
    pub collection: Collection<Category>,
}

#[derive(Clone)]
pub struct MongoProjectRepo {
    pub collection: Collection<Project>,
}

#[derive(Clone)]
pub struct MongoExperienceRepo {
    pub collection: Collection<WorkExperience>,
}

#[derive(Clone)]
pub struct MongoBasicInfoRepo {
    pub collection: Collection<BasicInfo>,
}

#[derive(Clone)]
pub struct MongoLogRepo {
    pub collection: Collection<LogEntry>,
}

impl MongoAdminRepo {
    pub fn new(db: &Database) -> Self {
        MongoAdminRepo { collection: db.collection(ADMINS) }
    }
}

impl MongoCategoryRepo {
    pub fn new(db: &Database) -> Self {
        MongoCategoryRepo { collection: db.collection(CATEGORIES) }
    }
}

impl MongoProjectRepo {
    pub fn new(db: &Database) -> Self {
        MongoProjectRepo { collection: db.collection(PROJECTS) }
    }
}

impl MongoExperienceRepo {
    pub fn new(db: &Database) -> Self {
        MongoExperienceRepo { collection: db.collection(WORK_EXPERIENCES) }
    }
}

impl MongoBasicInfoRepo {
    pub fn new(db: &Database) -> Self {
        MongoBasicInfoRepo { collection: db.collection(BASIC_INFO) }
    }
}

impl MongoLogRepo {
    pub fn new(db: &Database) -> Self {
        MongoLogRepo { collection: db.collection(LOGS) }
    }
}
