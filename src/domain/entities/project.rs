use std::str::FromStr;

use bson::{oid::ObjectId, DateTime as BsonDateTime};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::{Validate, ValidationError};

use crate::domain::validators::{
    normalize_labels, validate_not_blank, validate_skills, validate_tags, validate_url,
};
use crate::entities::{
    category::{validate_category_kind, Category, CategoryKind, CategorySummary},
    image::{ImageResponse, StoredImage},
    option_fields::PatchString,
};

pub const MAX_PROJECT_TITLE_LENGTH: u64 = 50;
pub const MAX_PROJECT_DESCRIPTION_LENGTH: u64 = 300;

// ───── Database Models ──────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Project {
    #[serde(rename = "_id")]
    pub id: ObjectId,
    pub title: String,
    pub description: String,
    pub category: CategoryKind,
    #[serde(default)]
    pub image: Option<StoredImage>,
    #[serde(default)]
    pub link: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub skills: Vec<String>,
    #[serde(default)]
    pub created_by: Option<ObjectId>,
    pub created_at: BsonDateTime,
    pub updated_at: BsonDateTime,
}

// ───── API Response Models ──────────────────────────────────────────

#[derive(Debug, Serialize)]
pub struct ProjectResponse {
    pub id: String,
    pub title: String,
    pub description: String,
    pub category: CategoryKind,
    pub category_info: Option<CategorySummary>,
    pub image: Option<ImageResponse>,
    pub link: Option<String>,
    pub tags: Vec<String>,
    pub skills: Vec<String>,
    pub created_by: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ProjectResponse {
    pub fn new(project: Project, category: Option<&Category>) -> Self {
        ProjectResponse {
            id: project.id.to_hex(),
            title: project.title,
            description: project.description,
            category: project.category,
            category_info: category.map(CategorySummary::from),
            image: project.image.map(ImageResponse::from),
            link: project.link,
            tags: project.tags,
            skills: project.skills,
            created_by: project.created_by.map(|id| id.to_hex()),
            created_at: project.created_at.to_chrono(),
            updated_at: project.updated_at.to_chrono(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct DeletedResponse {
    pub message: String,
    pub id: String,
}

// ───── Input & Validation ───────────────────────────────────────────

#[derive(Debug, Serialize, Deserialize, Validate)]
pub struct NewProjectRequest {
    #[validate(
        length(min = 1, max = MAX_PROJECT_TITLE_LENGTH, message = "Title must be between 1 and 50 characters"),
        custom(function = "validate_not_blank", message = "Title cannot be blank")
    )]
    pub title: String,

    #[validate(
        length(min = 1, max = MAX_PROJECT_DESCRIPTION_LENGTH, message = "Description must be between 1 and 300 characters"),
        custom(function = "validate_not_blank", message = "Description cannot be blank")
    )]
    pub description: String,

    #[validate(custom(function = "validate_category_kind"))]
    pub category: String,

    #[validate(custom(function = "validate_url"))]
    pub link: Option<String>,

    #[validate(custom(function = "validate_tags"))]
    pub tags: Option<Vec<String>>,

    #[validate(custom(function = "validate_skills"))]
    pub skills: Option<Vec<String>>,
}

impl NewProjectRequest {
    /// Builds the stored document. Call after `validate()`.
    pub fn prepare_for_insert(self, created_by: Option<ObjectId>) -> Result<Project, String> {
        let category = CategoryKind::from_str(&self.category)?;
        let now = BsonDateTime::now();

        Ok(Project {
            id: ObjectId::new(),
            title: self.title.trim().to_string(),
            description: self.description.trim().to_string(),
            category,
            image: None,
            link: self.link.map(|l| l.trim().to_string()).filter(|l| !l.is_empty()),
            tags: normalize_labels(self.tags.unwrap_or_default()),
            skills: normalize_labels(self.skills.unwrap_or_default()),
            created_by,
            created_at: now,
            updated_at: now,
        })
    }
}

#[derive(Debug, Default, Deserialize, Validate)]
pub struct UpdateProjectRequest {
    #[validate(
        length(min = 1, max = MAX_PROJECT_TITLE_LENGTH, message = "Title must be between 1 and 50 characters"),
        custom(function = "validate_not_blank", message = "Title cannot be blank")
    )]
    pub title: Option<String>,

    #[validate(
        length(min = 1, max = MAX_PROJECT_DESCRIPTION_LENGTH, message = "Description must be between 1 and 300 characters"),
        custom(function = "validate_not_blank", message = "Description cannot be blank")
    )]
    pub description: Option<String>,

    #[validate(custom(function = "validate_category_kind"))]
    pub category: Option<String>,

    #[serde(default)]
    #[validate(custom(function = "validate_optional_url_field"))]
    pub link: PatchString,

    #[validate(custom(function = "validate_tags"))]
    pub tags: Option<Vec<String>>,

    #[validate(custom(function = "validate_skills"))]
    pub skills: Option<Vec<String>>,
}

impl UpdateProjectRequest {
    /// Target category if the update moves the project. Call after `validate()`.
    pub fn category_kind(&self) -> Result<Option<CategoryKind>, String> {
        self.category.as_deref().map(CategoryKind::from_str).transpose()
    }

    pub fn apply_to(self, project: &mut Project) -> Result<(), String> {
        if let Some(kind) = self.category_kind()? {
            project.category = kind;
        }
        if let Some(title) = self.title {
            project.title = title.trim().to_string();
        }
        if let Some(description) = self.description {
            project.description = description.trim().to_string();
        }
        self.link
            .map_value(|l| l.trim().to_string())
            .apply(&mut project.link);
        if let Some(tags) = self.tags {
            project.tags = normalize_labels(tags);
        }
        if let Some(skills) = self.skills {
            project.skills = normalize_labels(skills);
        }
        project.updated_at = BsonDateTime::now();
        Ok(())
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct ProjectListQuery {
    pub category: Option<String>,
    pub page: Option<u64>,
    pub limit: Option<u64>,
}

pub fn validate_optional_url_field(value: &PatchString) -> Result<(), ValidationError> {
    if let Some(url) = value.value_ref() {
        validate_url(url)?;
    }
    Ok(())
}
