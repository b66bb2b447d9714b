use std::{collections::HashMap, str::FromStr, sync::Arc};

use bson::{oid::ObjectId, DateTime as BsonDateTime};
use futures::future::join_all;
use validator::Validate;

use crate::entities::{
    category::{Category, CategoryKind},
    image::ImageFolder,
    pagination::{PageRequest, Paginated, DEFAULT_PAGE_SIZE},
    project::{DeletedResponse, NewProjectRequest, Project, ProjectListQuery, ProjectResponse, UpdateProjectRequest},
};
use crate::errors::AppError;
use crate::repositories::{category::CategoryRepository, project::ProjectRepository};
use crate::storage::images::ImageService;
use crate::utils::object_id::parse_object_id;

pub struct ProjectHandler {
    pub project_repo: Arc<dyn ProjectRepository>,
    pub category_repo: Arc<dyn CategoryRepository>,
    pub images: ImageService,
}

impl ProjectHandler {
    pub fn new(
        project_repo: Arc<dyn ProjectRepository>,
        category_repo: Arc<dyn CategoryRepository>,
        images: ImageService,
    ) -> Self {
        ProjectHandler {
            project_repo,
            category_repo,
            images,
        }
    }

    pub async fn list_projects(&self, query: ProjectListQuery) -> Result<Paginated<ProjectResponse>, AppError> {
        let category = match query.category.as_deref().map(str::trim) {
            None | Some("") => None,
            Some(raw) => Some(CategoryKind::from_str(raw).map_err(|msg| AppError::validation("category", &msg))?),
        };
        let page = PageRequest::new(query.page, query.limit, DEFAULT_PAGE_SIZE);

        let (projects, total) = self.project_repo.list_projects(category, page).await?;
        let categories = self.categories_by_kind().await?;

        let items = join_all(projects.into_iter().map(|p| self.to_response(p, &categories))).await;
        Ok(Paginated::new(items, total, page))
    }

    pub async fn get_project(&self, id: &str) -> Result<ProjectResponse, AppError> {
        let project = self.find(id).await?;
        self.respond(project).await
    }

    pub async fn create_project(
        &self,
        request: NewProjectRequest,
        created_by: Option<ObjectId>,
    ) -> Result<ProjectResponse, AppError> {
        request.validate()?;
        let project = request
            .prepare_for_insert(created_by)
            .map_err(|msg| AppError::validation("category", &msg))?;

        let category = self.ensure_category(project.category).await?;
        self.project_repo.create_project(&project).await?;

        tracing::info!(project_id = %project.id, category = %project.category, "Project created");
        Ok(self
            .to_response(project, &HashMap::from([(category.category_type, category)]))
            .await)
    }

    pub async fn update_project(&self, id: &str, request: UpdateProjectRequest) -> Result<ProjectResponse, AppError> {
        request.validate()?;
        let mut project = self.find(id).await?;

        request
            .apply_to(&mut project)
            .map_err(|msg| AppError::validation("category", &msg))?;
        self.ensure_category(project.category).await?;

        if !self.project_repo.update_project(&project).await? {
            return Err(not_found());
        }

        tracing::info!(project_id = %project.id, "Project updated");
        self.respond(project).await
    }

    /// Removes the record, then the image blobs on a best-effort basis.
    pub async fn delete_project(&self, id: &str) -> Result<DeletedResponse, AppError> {
        let project = self.find(id).await?;

        if !self.project_repo.delete_project(&project.id).await? {
            return Err(not_found());
        }
        if let Some(image) = &project.image {
            self.images.discard(image).await;
        }

        tracing::info!(project_id = %project.id, "Project deleted");
        Ok(DeletedResponse {
            message: "Project deleted successfully".to_string(),
            id: project.id.to_hex(),
        })
    }

    /// Uploads a new image, stores its reference, then drops the previous one.
    pub async fn set_project_image(&self, id: &str, bytes: Vec<u8>) -> Result<ProjectResponse, AppError> {
        let mut project = self.find(id).await?;
        let uploaded = self.images.upload(ImageFolder::Projects, bytes).await?;

        let previous = project.image.replace(uploaded.clone());
        project.updated_at = BsonDateTime::now();

        match self.project_repo.update_project(&project).await {
            Ok(true) => {}
            Ok(false) => {
                self.images.discard(&uploaded).await;
                return Err(not_found());
            }
            Err(e) => {
                self.images.discard(&uploaded).await;
                return Err(e);
            }
        }
        if let Some(previous) = previous {
            self.images.discard(&previous).await;
        }

        tracing::info!(project_id = %project.id, blob = %uploaded.blob_name, "Project image replaced");
        self.respond(project).await
    }

    pub async fn remove_project_image(&self, id: &str) -> Result<ProjectResponse, AppError> {
        let mut project = self.find(id).await?;
        let Some(image) = project.image.take() else {
            return Err(AppError::NotFound("Project has no image".into()));
        };
        project.updated_at = BsonDateTime::now();

        if !self.project_repo.update_project(&project).await? {
            return Err(not_found());
        }
        self.images.discard(&image).await;
        self.respond(project).await
    }

    /// Returns the category document for `kind`, creating it with defaults if absent.
    pub async fn ensure_category(&self, kind: CategoryKind) -> Result<Category, AppError> {
        if let Some(existing) = self.category_repo.get_category_by_kind(kind).await? {
            return Ok(existing);
        }

        let category = Category::with_defaults(kind);
        match self.category_repo.create_category(&category).await {
            Ok(()) => {
                tracing::info!(category = %kind, "Created missing category with defaults");
                Ok(category)
            }
            // Another request created it first.
            Err(AppError::Conflict(_)) => self
                .category_repo
                .get_category_by_kind(kind)
                .await?
                .ok_or_else(|| AppError::InternalError(format!("Category '{}' vanished", kind))),
            Err(e) => Err(e),
        }
    }

    async fn find(&self, id: &str) -> Result<Project, AppError> {
        let id = parse_object_id(id)?;
        self.project_repo
            .get_project_by_id(&id)
            .await?
            .ok_or_else(not_found)
    }

    async fn respond(&self, project: Project) -> Result<ProjectResponse, AppError> {
        let category = self.category_repo.get_category_by_kind(project.category).await?;
        let categories: HashMap<CategoryKind, Category> =
            category.into_iter().map(|c| (c.category_type, c)).collect();
        Ok(self.to_response(project, &categories).await)
    }

    async fn categories_by_kind(&self) -> Result<HashMap<CategoryKind, Category>, AppError> {
        Ok(self
            .category_repo
            .list_categories()
            .await?
            .into_iter()
            .map(|c| (c.category_type, c))
            .collect())
    }

    async fn to_response(&self, mut project: Project, categories: &HashMap<CategoryKind, Category>) -> ProjectResponse {
        project.image = self.images.resign(project.image.take()).await;
        let category = categories.get(&project.category);
        ProjectResponse::new(project, category)
    }
}

fn not_found() -> AppError {
    AppError::NotFound("Project not found".into())
}
