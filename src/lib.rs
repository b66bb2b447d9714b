use std::sync::Arc;

mod domain;
mod interfaces;
mod infrastructure;
pub mod errors;
pub mod settings;
pub mod graceful_shutdown;
pub mod background_task;
pub mod shared_repos;

pub use domain::{entities, password, use_cases};
pub use interfaces::{handlers, middlewares, repositories, routes};
pub use infrastructure::{auth, db, limiter, logging, storage, utils};

use auth::jwt::JwtService;
use limiter::login_attempts::LoginAttemptTracker;
use logging::log_sink::LogSink;
use shared_repos::SharedRepositories;
use storage::{blob_store::BlobStore, images::ImageService};
use use_cases::{
    auth::AuthHandler, basic_info::BasicInfoHandler, categories::CategoryHandler,
    dashboard::DashboardHandler, experiences::ExperienceHandler, logs::LogHandler,
    projects::ProjectHandler,
};

pub struct AppState {
    pub auth_handler: AuthHandler,
    pub project_handler: ProjectHandler,
    pub category_handler: CategoryHandler,
    pub experience_handler: ExperienceHandler,
    pub basic_info_handler: BasicInfoHandler,
    pub dashboard_handler: DashboardHandler,
    pub log_handler: LogHandler,
    pub log_sink: LogSink,
    pub trust_x_forwarded_for: bool,
    pub cookie_secure: bool,
}

impl AppState {
    pub fn new(
        config: &settings::AppConfig,
        repos: SharedRepositories,
        blob_store: Arc<dyn BlobStore>,
        log_sink: LogSink,
        attempts: LoginAttemptTracker,
    ) -> Self {
        let images = ImageService::new(blob_store, &config.originals_container, &config.thumbnails_container);

        AppState {
            auth_handler: AuthHandler::new(repos.admin_repo.clone(), JwtService::new(config), attempts),
            project_handler: ProjectHandler::new(
                repos.project_repo.clone(),
                repos.category_repo.clone(),
                images.clone(),
            ),
            category_handler: CategoryHandler::new(
                repos.category_repo.clone(),
                repos.project_repo.clone(),
                images.clone(),
            ),
            experience_handler: ExperienceHandler::new(repos.experience_repo.clone(), images.clone()),
            basic_info_handler: BasicInfoHandler::new(repos.basic_info_repo.clone(), images),
            dashboard_handler: DashboardHandler::new(
                repos.project_repo,
                repos.category_repo,
                repos.experience_repo,
                repos.basic_info_repo,
                repos.log_repo.clone(),
            ),
            log_handler: LogHandler::new(repos.log_repo, log_sink.clone()),
            log_sink,
            trust_x_forwarded_for: config.trust_x_forwarded_for,
            cookie_secure: config.is_production(),
        }
    }
}
