use std::sync::Arc;

use validator::Validate;

use crate::entities::category::{
    Category, CategoryResponse, ColorPalette, DeleteCategoryResponse, InitializeCategoriesResponse,
    NewCategoryRequest, PaletteColors, UpdateCategoryRequest, CategoryKind,
};
use crate::errors::AppError;
use crate::repositories::{category::CategoryRepository, project::ProjectRepository};
use crate::storage::images::ImageService;
use crate::utils::object_id::parse_object_id;

pub struct CategoryHandler {
    pub category_repo: Arc<dyn CategoryRepository>,
    pub project_repo: Arc<dyn ProjectRepository>,
    pub images: ImageService,
}

impl CategoryHandler {
    pub fn new(
        category_repo: Arc<dyn CategoryRepository>,
        project_repo: Arc<dyn ProjectRepository>,
        images: ImageService,
    ) -> Self {
        CategoryHandler {
            category_repo,
            project_repo,
            images,
        }
    }

    pub async fn list_categories(&self) -> Result<Vec<CategoryResponse>, AppError> {
        let categories = self.category_repo.list_categories().await?;
        Ok(categories.into_iter().map(CategoryResponse::from).collect())
    }

    /// Creates a default document for every kind that has none yet.
    pub async fn initialize_categories(&self) -> Result<InitializeCategoriesResponse, AppError> {
        let mut created = 0;
        for kind in CategoryKind::ALL {
            if self.category_repo.get_category_by_kind(kind).await?.is_some() {
                continue;
            }
            match self.category_repo.create_category(&Category::with_defaults(kind)).await {
                Ok(()) => created += 1,
                Err(AppError::Conflict(_)) => {}
                Err(e) => return Err(e),
            }
        }

        if created > 0 {
            tracing::info!(created, "Initialized default categories");
        }
        Ok(InitializeCategoriesResponse {
            created,
            categories: self.list_categories().await?,
        })
    }

    pub async fn get_category(&self, id: &str) -> Result<CategoryResponse, AppError> {
        Ok(CategoryResponse::from(self.find(id).await?))
    }

    pub async fn create_category(&self, request: NewCategoryRequest) -> Result<CategoryResponse, AppError> {
        request.validate()?;
        let category = request
            .into_category()
            .map_err(|msg| AppError::validation("category_type", &msg))?;

        self.category_repo.create_category(&category).await?;

        tracing::info!(category = %category.category_type, "Category created");
        Ok(CategoryResponse::from(category))
    }

    pub async fn update_category(&self, id: &str, request: UpdateCategoryRequest) -> Result<CategoryResponse, AppError> {
        request.validate()?;
        let mut category = self.find(id).await?;

        request
            .apply_to(&mut category)
            .map_err(|msg| AppError::validation("color_palette", &msg))?;

        if !self.category_repo.update_category(&category).await? {
            return Err(not_found());
        }
        Ok(CategoryResponse::from(category))
    }

    /// Deletes the category along with every project that references it, by kind
    /// or by the category id. `deletedCount` is the number of projects removed.
    pub async fn delete_category(&self, id: &str) -> Result<DeleteCategoryResponse, AppError> {
        let category = self.find(id).await?;
        let kind = category.category_type;

        let images = self.project_repo.project_images_in_category(&category).await?;
        let deleted_count = self.project_repo.delete_projects_in_category(&category).await?;
        if !self.category_repo.delete_category(&category.id).await? {
            return Err(not_found());
        }

        for image in &images {
            self.images.discard(image).await;
        }

        tracing::info!(category = %kind, deleted_count, "Category deleted with its projects");
        Ok(DeleteCategoryResponse {
            message: format!("Category '{}' and its projects were deleted", category.title),
            deleted_count,
        })
    }

    pub fn palettes(&self) -> Vec<PaletteColors> {
        ColorPalette::ALL.iter().map(ColorPalette::colors).collect()
    }

    async fn find(&self, id: &str) -> Result<Category, AppError> {
        let id = parse_object_id(id)?;
        self.category_repo
            .get_category_by_id(&id)
            .await?
            .ok_or_else(not_found)
    }
}

fn not_found() -> AppError {
    AppError::NotFound("Category not found".into())
}
