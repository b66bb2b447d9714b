use std::{collections::BTreeMap, sync::Arc};

use chrono::{Duration, Utc};

use crate::entities::{
    category::CategoryKind,
    dashboard::DashboardStats,
    log_entry::{LogEntryResponse, LogFilter, LogLevel},
    pagination::PageRequest,
};
use crate::errors::AppError;
use crate::repositories::{
    basic_info::BasicInfoRepository, category::CategoryRepository, experience::ExperienceRepository,
    log::LogRepository, project::ProjectRepository,
};

const RECENT_ERRORS: u64 = 5;

pub struct DashboardHandler {
    pub project_repo: Arc<dyn ProjectRepository>,
    pub category_repo: Arc<dyn CategoryRepository>,
    pub experience_repo: Arc<dyn ExperienceRepository>,
    pub basic_info_repo: Arc<dyn BasicInfoRepository>,
    pub log_repo: Arc<dyn LogRepository>,
}

impl DashboardHandler {
    pub fn new(
        project_repo: Arc<dyn ProjectRepository>,
        category_repo: Arc<dyn CategoryRepository>,
        experience_repo: Arc<dyn ExperienceRepository>,
        basic_info_repo: Arc<dyn BasicInfoRepository>,
        log_repo: Arc<dyn LogRepository>,
    ) -> Self {
        DashboardHandler {
            project_repo,
            category_repo,
            experience_repo,
            basic_info_repo,
            log_repo,
        }
    }

    pub async fn stats(&self) -> Result<DashboardStats, AppError> {
        let mut projects_by_category = BTreeMap::new();
        for kind in CategoryKind::ALL {
            let count = self.project_repo.count_projects(Some(kind)).await?;
            projects_by_category.insert(kind.as_str().to_string(), count);
        }

        let since = Utc::now() - Duration::hours(24);
        let errors = LogFilter {
            level: Some(LogLevel::Error),
            start: Some(since),
            ..Default::default()
        };
        let (recent_errors, _) = self
            .log_repo
            .find_logs(&errors, PageRequest::new(Some(1), Some(RECENT_ERRORS), RECENT_ERRORS))
            .await?;

        let last_day = LogFilter {
            start: Some(since),
            ..Default::default()
        };

        Ok(DashboardStats {
            projects: self.project_repo.count_projects(None).await?,
            categories: self.category_repo.count_categories(false).await?,
            enabled_categories: self.category_repo.count_categories(true).await?,
            experiences: self.experience_repo.count_experiences().await?,
            projects_by_category,
            recent_errors: recent_errors.into_iter().map(LogEntryResponse::from).collect(),
            logs_last_24h: self.log_repo.count_logs(&last_day).await?,
            basic_info_complete: self
                .basic_info_repo
                .get_basic_info()
                .await?
                .is_some_and(|info| info.is_complete()),
        })
    }
}
