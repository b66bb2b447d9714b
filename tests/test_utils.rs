#![allow(dead_code)]

use std::{
    collections::HashMap,
    net::TcpListener,
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc,
    },
    time::Duration,
};

use actix_web::{middleware::NormalizePath, web, App, HttpServer};
use async_trait::async_trait;
use bson::{oid::ObjectId, Bson, DateTime as BsonDateTime, Document};
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use reqwest::Client;
use serde_json::Value;
use tracing_actix_web::TracingLogger;

use portfolio_admin::{
    entities::{
        admin::Admin,
        basic_info::BasicInfo,
        category::{Category, CategoryKind},
        experience::{sort_experiences, WorkExperience},
        image::StoredImage,
        log_entry::{LogEntry, LogFilter},
        pagination::PageRequest,
        project::Project,
    },
    errors::AppError,
    limiter::login_attempts::LoginAttemptTracker,
    logging::log_sink::{run_log_writer, LogSink, DEFAULT_BATCH_SIZE, DEFAULT_CHANNEL_CAPACITY},
    middlewares::{auth::AuthMiddleware, cors::cors, request_log::RequestLogger},
    repositories::{
        admin::AdminRepository, basic_info::BasicInfoRepository, category::CategoryRepository,
        experience::ExperienceRepository, log::LogRepository,
        project::{category_references, ProjectRepository},
    },
    routes::configure_routes,
    settings::{AppConfig, AppEnvironment},
    shared_repos::SharedRepositories,
    storage::blob_store::BlobStore,
    AppState,
};

pub const ADMIN_USERNAME: &str = "admin";
pub const ADMIN_PASSWORD: &str = "Orchard-Lantern-47!";

// ───── In-memory repositories ───────────────────────────────────────

#[derive(Default)]
pub struct MemoryAdminRepo {
    admins: Mutex<Vec<Admin>>,
    lookup_delay: Mutex<Option<Duration>>,
}

impl MemoryAdminRepo {
    /// Makes username lookups take `delay`, like a slow database round trip.
    pub fn delay_lookups(&self, delay: Duration) {
        *self.lookup_delay.lock() = Some(delay);
    }
}

#[async_trait]
impl AdminRepository for MemoryAdminRepo {
    async fn check_connection(&self) -> Result<(), AppError> {
        Ok(())
    }

    async fn count_admins(&self) -> Result<u64, AppError> {
        Ok(self.admins.lock().len() as u64)
    }

    async fn get_admin_by_username(&self, username: &str) -> Result<Option<Admin>, AppError> {
        let delay = *self.lookup_delay.lock();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        Ok(self.admins.lock().iter().find(|a| a.username == username).cloned())
    }

    async fn get_admin_by_id(&self, id: &ObjectId) -> Result<Option<Admin>, AppError> {
        Ok(self.admins.lock().iter().find(|a| &a.id == id).cloned())
    }

    async fn create_admin(&self, admin: &Admin) -> Result<(), AppError> {
        let mut admins = self.admins.lock();
        if admins.iter().any(|a| a.username == admin.username) {
            return Err(AppError::Conflict("Username already taken".into()));
        }
        admins.push(admin.clone());
        Ok(())
    }

    async fn update_password(&self, id: &ObjectId, password_hash: &str) -> Result<(), AppError> {
        let mut admins = self.admins.lock();
        let admin = admins
            .iter_mut()
            .find(|a| &a.id == id)
            .ok_or_else(|| AppError::NotFound("Admin not found".into()))?;
        admin.password_hash = password_hash.to_string();
        admin.updated_at = BsonDateTime::now();
        Ok(())
    }

    async fn record_login(&self, id: &ObjectId) -> Result<(), AppError> {
        if let Some(admin) = self.admins.lock().iter_mut().find(|a| &a.id == id) {
            admin.last_login_at = Some(BsonDateTime::now());
        }
        Ok(())
    }
}

#[derive(Default)]
pub struct MemoryCategoryRepo {
    categories: Mutex<Vec<Category>>,
}

#[async_trait]
impl CategoryRepository for MemoryCategoryRepo {
    async fn list_categories(&self) -> Result<Vec<Category>, AppError> {
        let mut categories = self.categories.lock().clone();
        categories.sort_by_key(|c| c.category_type);
        Ok(categories)
    }

    async fn get_category_by_id(&self, id: &ObjectId) -> Result<Option<Category>, AppError> {
        Ok(self.categories.lock().iter().find(|c| &c.id == id).cloned())
    }

    async fn get_category_by_kind(&self, kind: CategoryKind) -> Result<Option<Category>, AppError> {
        Ok(self.categories.lock().iter().find(|c| c.category_type == kind).cloned())
    }

    async fn create_category(&self, category: &Category) -> Result<(), AppError> {
        let mut categories = self.categories.lock();
        if categories.iter().any(|c| c.category_type == category.category_type) {
            return Err(AppError::Conflict("A record with the same unique value already exists".into()));
        }
        categories.push(category.clone());
        Ok(())
    }

    async fn update_category(&self, category: &Category) -> Result<bool, AppError> {
        let mut categories = self.categories.lock();
        match categories.iter_mut().find(|c| c.id == category.id) {
            Some(existing) => {
                *existing = category.clone();
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn delete_category(&self, id: &ObjectId) -> Result<bool, AppError> {
        let mut categories = self.categories.lock();
        let before = categories.len();
        categories.retain(|c| &c.id != id);
        Ok(categories.len() < before)
    }

    async fn count_categories(&self, enabled_only: bool) -> Result<u64, AppError> {
        Ok(self
            .categories
            .lock()
            .iter()
            .filter(|c| !enabled_only || c.enabled)
            .count() as u64)
    }
}

/// Stores raw documents so tests can plant category references written by older clients.
#[derive(Default)]
pub struct MemoryProjectRepo {
    docs: Mutex<Vec<Document>>,
}

fn decode_project(doc: &Document) -> Result<Project, AppError> {
    bson::from_document(doc.clone()).map_err(|e| AppError::InternalError(format!("Undecodable project: {e}")))
}

fn encode_project(project: &Project) -> Result<Document, AppError> {
    bson::to_document(project).map_err(|e| AppError::InternalError(format!("Unencodable project: {e}")))
}

fn has_id(doc: &Document, id: &ObjectId) -> bool {
    doc.get_object_id("_id").ok() == Some(*id)
}

fn has_kind(doc: &Document, category: Option<CategoryKind>) -> bool {
    category.is_none_or(|kind| doc.get_str("category").ok() == Some(kind.as_str()))
}

fn references(doc: &Document, category: &Category) -> bool {
    doc.get("category")
        .is_some_and(|value| category_references(category).contains(value))
}

impl MemoryProjectRepo {
    /// Overwrites the stored `category` field of a project.
    pub fn set_raw_category(&self, id: &str, value: Bson) {
        let id = ObjectId::parse_str(id).expect("valid project id");
        let mut docs = self.docs.lock();
        let doc = docs.iter_mut().find(|d| has_id(d, &id)).expect("project exists");
        doc.insert("category", value);
    }

    pub fn count(&self) -> usize {
        self.docs.lock().len()
    }
}

#[async_trait]
impl ProjectRepository for MemoryProjectRepo {
    async fn list_projects(
        &self,
        category: Option<CategoryKind>,
        page: PageRequest,
    ) -> Result<(Vec<Project>, u64), AppError> {
        let mut matching = self
            .docs
            .lock()
            .iter()
            .filter(|d| has_kind(d, category))
            .map(decode_project)
            .collect::<Result<Vec<_>, _>>()?;
        matching.sort_by(|a, b| b.created_at.cmp(&a.created_at));

        let total = matching.len() as u64;
        let items = matching
            .into_iter()
            .skip(page.offset() as usize)
            .take(page.limit as usize)
            .collect();
        Ok((items, total))
    }

    async fn get_project_by_id(&self, id: &ObjectId) -> Result<Option<Project>, AppError> {
        self.docs.lock().iter().find(|d| has_id(d, id)).map(decode_project).transpose()
    }

    async fn create_project(&self, project: &Project) -> Result<(), AppError> {
        let doc = encode_project(project)?;
        self.docs.lock().push(doc);
        Ok(())
    }

    async fn update_project(&self, project: &Project) -> Result<bool, AppError> {
        let doc = encode_project(project)?;
        let mut docs = self.docs.lock();
        match docs.iter_mut().find(|d| has_id(d, &project.id)) {
            Some(existing) => {
                *existing = doc;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn delete_project(&self, id: &ObjectId) -> Result<bool, AppError> {
        let mut docs = self.docs.lock();
        let before = docs.len();
        docs.retain(|d| !has_id(d, id));
        Ok(docs.len() < before)
    }

    async fn project_images_in_category(&self, category: &Category) -> Result<Vec<StoredImage>, AppError> {
        Ok(self
            .docs
            .lock()
            .iter()
            .filter(|d| references(d, category))
            .filter_map(|d| bson::from_document(d.get_document("image").ok()?.clone()).ok())
            .collect())
    }

    async fn delete_projects_in_category(&self, category: &Category) -> Result<u64, AppError> {
        let mut docs = self.docs.lock();
        let before = docs.len();
        docs.retain(|d| !references(d, category));
        Ok((before - docs.len()) as u64)
    }

    async fn count_projects(&self, category: Option<CategoryKind>) -> Result<u64, AppError> {
        Ok(self.docs.lock().iter().filter(|d| has_kind(d, category)).count() as u64)
    }

    async fn normalize_legacy_categories(&self, _categories: &[Category]) -> Result<u64, AppError> {
        Ok(0)
    }
}

#[derive(Default)]
pub struct MemoryExperienceRepo {
    experiences: Mutex<Vec<WorkExperience>>,
}

#[async_trait]
impl ExperienceRepository for MemoryExperienceRepo {
    async fn list_experiences(&self) -> Result<Vec<WorkExperience>, AppError> {
        let mut items = self.experiences.lock().clone();
        sort_experiences(&mut items);
        Ok(items)
    }

    async fn get_experience_by_id(&self, id: &ObjectId) -> Result<Option<WorkExperience>, AppError> {
        Ok(self.experiences.lock().iter().find(|e| &e.id == id).cloned())
    }

    async fn create_experience(&self, experience: &WorkExperience) -> Result<(), AppError> {
        self.experiences.lock().push(experience.clone());
        Ok(())
    }

    async fn update_experience(&self, experience: &WorkExperience) -> Result<bool, AppError> {
        let mut experiences = self.experiences.lock();
        match experiences.iter_mut().find(|e| e.id == experience.id) {
            Some(existing) => {
                *existing = experience.clone();
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn delete_experience(&self, id: &ObjectId) -> Result<bool, AppError> {
        let mut experiences = self.experiences.lock();
        let before = experiences.len();
        experiences.retain(|e| &e.id != id);
        Ok(experiences.len() < before)
    }

    async fn count_experiences(&self) -> Result<u64, AppError> {
        Ok(self.experiences.lock().len() as u64)
    }
}

#[derive(Default)]
pub struct MemoryBasicInfoRepo {
    info: Mutex<Option<BasicInfo>>,
}

#[async_trait]
impl BasicInfoRepository for MemoryBasicInfoRepo {
    async fn get_basic_info(&self) -> Result<Option<BasicInfo>, AppError> {
        Ok(self.info.lock().clone())
    }

    async fn save_basic_info(&self, info: &BasicInfo) -> Result<(), AppError> {
        *self.info.lock() = Some(info.clone());
        Ok(())
    }
}

#[derive(Default)]
pub struct MemoryLogRepo {
    entries: Mutex<Vec<LogEntry>>,
}

impl MemoryLogRepo {
    pub fn all(&self) -> Vec<LogEntry> {
        self.entries.lock().clone()
    }
}

#[async_trait]
impl LogRepository for MemoryLogRepo {
    async fn insert_many(&self, entries: Vec<LogEntry>) -> Result<(), AppError> {
        self.entries.lock().extend(entries);
        Ok(())
    }

    async fn find_logs(&self, filter: &LogFilter, page: PageRequest) -> Result<(Vec<LogEntry>, u64), AppError> {
        let mut matching: Vec<LogEntry> = self
            .entries
            .lock()
            .iter()
            .filter(|e| e.matches(filter))
            .cloned()
            .collect();
        matching.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));

        let total = matching.len() as u64;
        let items = matching
            .into_iter()
            .skip(page.offset() as usize)
            .take(page.limit as usize)
            .collect();
        Ok((items, total))
    }

    async fn count_logs(&self, filter: &LogFilter) -> Result<u64, AppError> {
        Ok(self.entries.lock().iter().filter(|e| e.matches(filter)).count() as u64)
    }

    async fn delete_logs_before(&self, cutoff: DateTime<Utc>) -> Result<u64, AppError> {
        let mut entries = self.entries.lock();
        let before = entries.len();
        entries.retain(|e| e.timestamp.to_chrono() >= cutoff);
        Ok((before - entries.len()) as u64)
    }
}

/// Keeps blobs in a map keyed by `container/blob_name`.
#[derive(Default)]
pub struct MemoryBlobStore {
    blobs: Mutex<HashMap<String, (Vec<u8>, String)>>,
    fail_deletes: AtomicBool,
}

impl MemoryBlobStore {
    /// While set, every delete fails and leaves the blob in place.
    pub fn fail_deletes(&self, fail: bool) {
        self.fail_deletes.store(fail, Ordering::SeqCst);
    }

    pub fn contains(&self, container: &str, blob_name: &str) -> bool {
        self.blobs.lock().contains_key(&format!("{container}/{blob_name}"))
    }

    pub fn count(&self) -> usize {
        self.blobs.lock().len()
    }
}

#[async_trait]
impl BlobStore for MemoryBlobStore {
    async fn upload(
        &self,
        container: &str,
        blob_name: &str,
        data: Vec<u8>,
        content_type: &str,
    ) -> Result<(), AppError> {
        self.blobs
            .lock()
            .insert(format!("{container}/{blob_name}"), (data, content_type.to_string()));
        Ok(())
    }

    async fn delete(&self, container: &str, blob_name: &str) -> Result<(), AppError> {
        if self.fail_deletes.load(Ordering::SeqCst) {
            return Err(AppError::Storage("Blob service unavailable".into()));
        }
        self.blobs.lock().remove(&format!("{container}/{blob_name}"));
        Ok(())
    }

    async fn read_url(&self, container: &str, blob_name: &str, ttl: Duration) -> Result<String, AppError> {
        Ok(format!(
            "https://blobs.test/{container}/{blob_name}?se={}",
            ttl.as_secs()
        ))
    }
}

// ───── Test server ──────────────────────────────────────────────────

pub struct TestApp {
    pub state: web::Data<AppState>,
    pub address: String,
    pub client: Client,
    pub config: AppConfig,
    pub admins: Arc<MemoryAdminRepo>,
    pub projects: Arc<MemoryProjectRepo>,
    pub logs: Arc<MemoryLogRepo>,
    pub blobs: Arc<MemoryBlobStore>,
}

impl TestApp {
    pub async fn spawn() -> Self {
        TestApp::spawn_with(test_config()).await
    }

    pub async fn spawn_with(config: AppConfig) -> Self {
        let admins = Arc::new(MemoryAdminRepo::default());
        let projects = Arc::new(MemoryProjectRepo::default());
        let logs = Arc::new(MemoryLogRepo::default());
        let blobs = Arc::new(MemoryBlobStore::default());
        let repos = SharedRepositories {
            admin_repo: admins.clone(),
            category_repo: Arc::new(MemoryCategoryRepo::default()),
            project_repo: projects.clone(),
            experience_repo: Arc::new(MemoryExperienceRepo::default()),
            basic_info_repo: Arc::new(MemoryBasicInfoRepo::default()),
            log_repo: logs.clone(),
        };

        let (log_sink, log_rx) = LogSink::channel(DEFAULT_CHANNEL_CAPACITY);
        tokio::spawn(run_log_writer(
            repos.log_repo.clone(),
            log_rx,
            DEFAULT_BATCH_SIZE,
            Duration::from_millis(50),
        ));

        let state = web::Data::new(AppState::new(
            &config,
            repos,
            blobs.clone(),
            log_sink,
            LoginAttemptTracker::default(),
        ));

        state
            .auth_handler
            .bootstrap_admin(ADMIN_USERNAME, ADMIN_PASSWORD)
            .await
            .expect("Failed to seed admin");

        let listener = TcpListener::bind("127.0.0.1:0").expect("Failed to bind random port");
        let port = listener.local_addr().unwrap().port();
        let address = format!("http://127.0.0.1:{}", port);

        let server_state = state.clone();
        let server_config = config.clone();
        let server = HttpServer::new(move || {
            App::new()
                .app_data(server_state.clone())
                .wrap(AuthMiddleware)
                .wrap(RequestLogger)
                .wrap(cors(&server_config))
                .wrap(TracingLogger::default())
                .wrap(NormalizePath::trim())
                .configure(configure_routes)
        })
        .listen(listener)
        .expect("Failed to bind server")
        .workers(config.worker_count)
        .disable_signals()
        .run();

        tokio::spawn(server);

        let client = Client::new();
        while client.get(format!("{}/health", address)).send().await.is_err() {
            tokio::time::sleep(Duration::from_millis(10)).await;
        }

        TestApp {
            state,
            address,
            client,
            config,
            admins,
            projects,
            logs,
            blobs,
        }
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.address, path)
    }

    pub async fn login(&self, username: &str, password: &str) -> reqwest::Response {
        self.client
            .post(self.url("/api/admin/auth/login"))
            .json(&serde_json::json!({ "username": username, "password": password }))
            .send()
            .await
            .expect("Failed to send login request")
    }

    /// Logs in as the seeded admin and returns the bearer token.
    pub async fn admin_token(&self) -> String {
        let response = self.login(ADMIN_USERNAME, ADMIN_PASSWORD).await;
        assert!(response.status().is_success(), "seeded admin login failed");
        let body: Value = response.json().await.unwrap();
        body["access_token"].as_str().unwrap().to_string()
    }

    pub async fn get(&self, path: &str, token: &str) -> reqwest::Response {
        self.client
            .get(self.url(path))
            .bearer_auth(token)
            .send()
            .await
            .expect("GET request failed")
    }

    pub async fn post_json(&self, path: &str, token: &str, body: &Value) -> reqwest::Response {
        self.client
            .post(self.url(path))
            .bearer_auth(token)
            .json(body)
            .send()
            .await
            .expect("POST request failed")
    }

    pub async fn put_json(&self, path: &str, token: &str, body: &Value) -> reqwest::Response {
        self.client
            .put(self.url(path))
            .bearer_auth(token)
            .json(body)
            .send()
            .await
            .expect("PUT request failed")
    }

    pub async fn delete(&self, path: &str, token: &str) -> reqwest::Response {
        self.client
            .delete(self.url(path))
            .bearer_auth(token)
            .send()
            .await
            .expect("DELETE request failed")
    }

    /// Creates a project and returns its id.
    pub async fn create_project(&self, token: &str, title: &str, category: &str) -> String {
        let response = self
            .post_json(
                "/api/admin/projects",
                token,
                &serde_json::json!({
                    "title": title,
                    "description": format!("{title} description"),
                    "category": category,
                }),
            )
            .await;
        assert_eq!(response.status().as_u16(), 200);
        let body: Value = response.json().await.unwrap();
        body["id"].as_str().unwrap().to_string()
    }

    /// Waits until queued activity log entries are persisted.
    pub async fn flush_logs(&self) {
        self.state.log_sink.flush().await;
    }
}

pub fn test_config() -> AppConfig {
    AppConfig {
        env: AppEnvironment::Testing,
        name: "Portfolio Admin Test".to_string(),
        port: 0,
        host: "127.0.0.1".to_string(),
        worker_count: 1,
        mongo_uri: "mongodb://localhost:27017".to_string(),
        database_name: "portfolio_test".to_string(),
        blob_connection_string: "UseDevelopmentStorage=true".to_string(),
        originals_container: "originals".to_string(),
        thumbnails_container: "thumbnails".to_string(),
        cors_allowed_origins: vec!["*".to_string()],
        trust_x_forwarded_for: false,
        session_secret: "integration-test-session-secret-that-is-long-enough".to_string(),
        session_expiration_minutes: 30,
        bootstrap_admin_username: None,
        bootstrap_admin_password: None,
    }
}

/// A small PNG for upload tests.
pub fn png_bytes(width: u32, height: u32) -> Vec<u8> {
    let img = image::RgbImage::from_pixel(width, height, image::Rgb([200, 80, 40]));
    let mut out = std::io::Cursor::new(Vec::new());
    img.write_to(&mut out, image::ImageFormat::Png)
        .expect("Failed to encode PNG");
    out.into_inner()
}
