use std::{fmt, str::FromStr};

use bson::{oid::ObjectId, DateTime as BsonDateTime};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::{Validate, ValidationError};

pub const MAX_CATEGORY_TITLE_LENGTH: u64 = 50;
pub const MAX_CATEGORY_DESCRIPTION_LENGTH: u64 = 300;

// ───── Enumerations ─────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CategoryKind {
    Product,
    Software,
    Content,
    Innovation,
}

impl CategoryKind {
    pub const ALL: [CategoryKind; 4] = [
        CategoryKind::Product,
        CategoryKind::Software,
        CategoryKind::Content,
        CategoryKind::Innovation,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            CategoryKind::Product => "product",
            CategoryKind::Software => "software",
            CategoryKind::Content => "content",
            CategoryKind::Innovation => "innovation",
        }
    }

    pub fn default_title(&self) -> &'static str {
        match self {
            CategoryKind::Product => "Product",
            CategoryKind::Software => "Software",
            CategoryKind::Content => "Content",
            CategoryKind::Innovation => "Innovation",
        }
    }

    pub fn default_description(&self) -> &'static str {
        match self {
            CategoryKind::Product => "Products designed and shipped end to end",
            CategoryKind::Software => "Software engineering and development work",
            CategoryKind::Content => "Writing, talks, and other published content",
            CategoryKind::Innovation => "Experiments, prototypes, and research",
        }
    }

    pub fn default_palette(&self) -> ColorPalette {
        match self {
            CategoryKind::Product => ColorPalette::Blue,
            CategoryKind::Software => ColorPalette::Green,
            CategoryKind::Content => ColorPalette::Purple,
            CategoryKind::Innovation => ColorPalette::Orange,
        }
    }
}

impl fmt::Display for CategoryKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CategoryKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        CategoryKind::ALL
            .into_iter()
            .find(|kind| kind.as_str() == s.trim().to_lowercase())
            .ok_or_else(|| format!(
                "Category must be one of: {}",
                CategoryKind::ALL.map(|k| k.as_str()).join(", ")
            ))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColorPalette {
    Blue,
    Green,
    Purple,
    Orange,
    Rose,
    Teal,
    Amber,
    Slate,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct PaletteColors {
    pub name: ColorPalette,
    pub primary: &'static str,
    pub secondary: &'static str,
    pub accent: &'static str,
}

impl ColorPalette {
    pub const ALL: [ColorPalette; 8] = [
        ColorPalette::Blue,
        ColorPalette::Green,
        ColorPalette::Purple,
        ColorPalette::Orange,
        ColorPalette::Rose,
        ColorPalette::Teal,
        ColorPalette::Amber,
        ColorPalette::Slate,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ColorPalette::Blue => "blue",
            ColorPalette::Green => "green",
            ColorPalette::Purple => "purple",
            ColorPalette::Orange => "orange",
            ColorPalette::Rose => "rose",
            ColorPalette::Teal => "teal",
            ColorPalette::Amber => "amber",
            ColorPalette::Slate => "slate",
        }
    }

    pub fn colors(&self) -> PaletteColors {
        let (primary, secondary, accent) = match self {
            ColorPalette::Blue => ("#2563eb", "#dbeafe", "#1e40af"),
            ColorPalette::Green => ("#16a34a", "#dcfce7", "#166534"),
            ColorPalette::Purple => ("#9333ea", "#f3e8ff", "#6b21a8"),
            ColorPalette::Orange => ("#ea580c", "#ffedd5", "#9a3412"),
            ColorPalette::Rose => ("#e11d48", "#ffe4e6", "#9f1239"),
            ColorPalette::Teal => ("#0d9488", "#ccfbf1", "#115e59"),
            ColorPalette::Amber => ("#d97706", "#fef3c7", "#92400e"),
            ColorPalette::Slate => ("#475569", "#f1f5f9", "#1e293b"),
        };
        PaletteColors { name: *self, primary, secondary, accent }
    }
}

impl FromStr for ColorPalette {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ColorPalette::ALL
            .into_iter()
            .find(|palette| palette.as_str() == s.trim().to_lowercase())
            .ok_or_else(|| format!("Unknown color palette '{}'", s))
    }
}

// ───── Database Models ──────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Category {
    #[serde(rename = "_id")]
    pub id: ObjectId,
    pub category_type: CategoryKind,
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    pub color_palette: ColorPalette,
    pub created_at: BsonDateTime,
    pub updated_at: BsonDateTime,
}

fn default_enabled() -> bool {
    true
}

impl Category {
    /// A category carrying the built-in defaults for `kind`.
    pub fn with_defaults(kind: CategoryKind) -> Self {
        let now = BsonDateTime::now();
        Category {
            id: ObjectId::new(),
            category_type: kind,
            title: kind.default_title().to_string(),
            description: kind.default_description().to_string(),
            enabled: true,
            color_palette: kind.default_palette(),
            created_at: now,
            updated_at: now,
        }
    }
}

// ───── API Response Models ──────────────────────────────────────────

#[derive(Debug, Clone, Serialize)]
pub struct CategoryResponse {
    pub id: String,
    pub category_type: CategoryKind,
    pub title: String,
    pub description: String,
    pub enabled: bool,
    pub color_palette: ColorPalette,
    pub colors: PaletteColors,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<Category> for CategoryResponse {
    fn from(category: Category) -> Self {
        CategoryResponse {
            id: category.id.to_hex(),
            category_type: category.category_type,
            title: category.title,
            description: category.description,
            enabled: category.enabled,
            colors: category.color_palette.colors(),
            color_palette: category.color_palette,
            created_at: category.created_at.to_chrono(),
            updated_at: category.updated_at.to_chrono(),
        }
    }
}

/// Compact form embedded in project responses.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct CategorySummary {
    pub id: String,
    pub category_type: CategoryKind,
    pub title: String,
    pub enabled: bool,
    pub color_palette: ColorPalette,
}

impl From<&Category> for CategorySummary {
    fn from(category: &Category) -> Self {
        CategorySummary {
            id: category.id.to_hex(),
            category_type: category.category_type,
            title: category.title.clone(),
            enabled: category.enabled,
            color_palette: category.color_palette,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct InitializeCategoriesResponse {
    pub created: usize,
    pub categories: Vec<CategoryResponse>,
}

#[derive(Debug, Serialize)]
pub struct DeleteCategoryResponse {
    pub message: String,
    #[serde(rename = "deletedCount")]
    pub deleted_count: u64,
}

// ───── Input & Validation ───────────────────────────────────────────

#[derive(Debug, Deserialize, Validate)]
pub struct NewCategoryRequest {
    #[validate(custom(function = "validate_category_kind"))]
    pub category_type: String,

    #[validate(length(min = 1, max = MAX_CATEGORY_TITLE_LENGTH, message = "Title must be between 1 and 50 characters"))]
    pub title: Option<String>,

    #[validate(length(max = MAX_CATEGORY_DESCRIPTION_LENGTH, message = "Description must be at most 300 characters"))]
    pub description: Option<String>,

    pub enabled: Option<bool>,

    #[validate(custom(function = "validate_palette"))]
    pub color_palette: Option<String>,
}

impl NewCategoryRequest {
    /// Builds the stored document, falling back to per-kind defaults. Call after `validate()`.
    pub fn into_category(self) -> Result<Category, String> {
        let kind = CategoryKind::from_str(&self.category_type)?;
        let mut category = Category::with_defaults(kind);

        if let Some(title) = self.title {
            category.title = title.trim().to_string();
        }
        if let Some(description) = self.description {
            category.description = description.trim().to_string();
        }
        if let Some(enabled) = self.enabled {
            category.enabled = enabled;
        }
        if let Some(palette) = self.color_palette {
            category.color_palette = ColorPalette::from_str(&palette)?;
        }
        Ok(category)
    }
}

#[derive(Debug, Default, Deserialize, Validate)]
pub struct UpdateCategoryRequest {
    #[validate(length(min = 1, max = MAX_CATEGORY_TITLE_LENGTH, message = "Title must be between 1 and 50 characters"))]
    pub title: Option<String>,

    #[validate(length(max = MAX_CATEGORY_DESCRIPTION_LENGTH, message = "Description must be at most 300 characters"))]
    pub description: Option<String>,

    pub enabled: Option<bool>,

    #[validate(custom(function = "validate_palette"))]
    pub color_palette: Option<String>,
}

impl UpdateCategoryRequest {
    pub fn apply_to(self, category: &mut Category) -> Result<(), String> {
        if let Some(title) = self.title {
            category.title = title.trim().to_string();
        }
        if let Some(description) = self.description {
            category.description = description.trim().to_string();
        }
        if let Some(enabled) = self.enabled {
            category.enabled = enabled;
        }
        if let Some(palette) = self.color_palette {
            category.color_palette = ColorPalette::from_str(&palette)?;
        }
        category.updated_at = BsonDateTime::now();
        Ok(())
    }
}

pub fn validate_category_kind(value: &str) -> Result<(), ValidationError> {
    CategoryKind::from_str(value).map(|_| ()).map_err(|msg| {
        let mut err = ValidationError::new("invalid_category");
        err.message = Some(msg.into());
        err
    })
}

pub fn validate_palette(value: &str) -> Result<(), ValidationError> {
    ColorPalette::from_str(value).map(|_| ()).map_err(|msg| {
        let mut err = ValidationError::new("invalid_palette");
        err.message = Some(msg.into());
        err
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kind_parsing_is_case_insensitive_and_strict() {
        assert_eq!("Product".parse::<CategoryKind>(), Ok(CategoryKind::Product));
        assert_eq!(" innovation ".parse::<CategoryKind>(), Ok(CategoryKind::Innovation));
        assert!("hardware".parse::<CategoryKind>().is_err());
    }

    #[test]
    fn every_kind_has_a_distinct_default_palette() {
        let palettes: Vec<_> = CategoryKind::ALL.iter().map(|k| k.default_palette()).collect();
        for (i, p) in palettes.iter().enumerate() {
            assert!(!palettes[i + 1..].contains(p));
        }
    }

    #[test]
    fn new_category_request_falls_back_to_kind_defaults() {
        let request = NewCategoryRequest {
            category_type: "content".into(),
            title: None,
            description: None,
            enabled: None,
            color_palette: None,
        };
        let category = request.into_category().unwrap();
        assert_eq!(category.title, "Content");
        assert_eq!(category.color_palette, ColorPalette::Purple);
        assert!(category.enabled);
    }

    #[test]
    fn unknown_palette_fails_validation() {
        let request = NewCategoryRequest {
            category_type: "product".into(),
            title: Some("Products".into()),
            description: None,
            enabled: Some(false),
            color_palette: Some("neon".into()),
        };
        assert!(request.validate().is_err());
    }

    #[test]
    fn update_changes_only_provided_fields() {
        let mut category = Category::with_defaults(CategoryKind::Software);
        UpdateCategoryRequest {
            enabled: Some(false),
            color_palette: Some("teal".into()),
            ..Default::default()
        }
        .apply_to(&mut category)
        .unwrap();

        assert!(!category.enabled);
        assert_eq!(category.color_palette, ColorPalette::Teal);
        assert_eq!(category.title, "Software");
    }
}
