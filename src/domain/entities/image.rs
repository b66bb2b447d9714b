use bson::DateTime as BsonDateTime;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Reference to an uploaded image: the original lives in the originals
/// container and the resized copy in the thumbnails container.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StoredImage {
    pub blob_name: String,
    pub thumbnail_blob_name: String,
    pub original_url: String,
    pub thumbnail_url: String,
    pub content_type: String,
    pub uploaded_at: BsonDateTime,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ImageResponse {
    pub path: String,
    pub original_url: String,
    pub thumbnail_url: String,
    pub content_type: String,
    pub uploaded_at: DateTime<Utc>,
}

impl From<StoredImage> for ImageResponse {
    fn from(image: StoredImage) -> Self {
        ImageResponse {
            path: image.blob_name,
            original_url: image.original_url,
            thumbnail_url: image.thumbnail_url,
            content_type: image.content_type,
            uploaded_at: image.uploaded_at.to_chrono(),
        }
    }
}

/// Blob folder an upload belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageFolder {
    Projects,
    Experiences,
    Profile,
}

impl ImageFolder {
    pub fn as_str(&self) -> &'static str {
        match self {
            ImageFolder::Projects => "projects",
            ImageFolder::Experiences => "experiences",
            ImageFolder::Profile => "profile",
        }
    }
}
