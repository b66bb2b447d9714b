use std::{io::Cursor, sync::Arc, time::Duration};

use bson::DateTime as BsonDateTime;
use image::{codecs::jpeg::JpegEncoder, DynamicImage};
use uuid::Uuid;

use crate::entities::image::{ImageFolder, StoredImage};
use crate::errors::AppError;
use crate::storage::blob_store::BlobStore;

pub const MAX_IMAGE_BYTES: usize = 5 * 1024 * 1024;
pub const THUMBNAIL_MAX_SIDE: u32 = 320;
pub const READ_URL_TTL: Duration = Duration::from_secs(24 * 60 * 60);
const THUMBNAIL_QUALITY: u8 = 82;
const THUMBNAIL_CONTENT_TYPE: &str = "image/jpeg";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AllowedFormat {
    Jpeg,
    Png,
    Webp,
    Gif,
}

impl AllowedFormat {
    /// Sniffs the magic bytes; the client's declared content type is ignored.
    pub fn detect(bytes: &[u8]) -> Option<Self> {
        match infer::get(bytes)?.mime_type() {
            "image/jpeg" => Some(AllowedFormat::Jpeg),
            "image/png" => Some(AllowedFormat::Png),
            "image/webp" => Some(AllowedFormat::Webp),
            "image/gif" => Some(AllowedFormat::Gif),
            _ => None,
        }
    }

    pub fn extension(&self) -> &'static str {
        match self {
            AllowedFormat::Jpeg => "jpg",
            AllowedFormat::Png => "png",
            AllowedFormat::Webp => "webp",
            AllowedFormat::Gif => "gif",
        }
    }

    pub fn content_type(&self) -> &'static str {
        match self {
            AllowedFormat::Jpeg => "image/jpeg",
            AllowedFormat::Png => "image/png",
            AllowedFormat::Webp => "image/webp",
            AllowedFormat::Gif => "image/gif",
        }
    }
}

/// Uploads originals plus thumbnails and hands out signed read URLs.
#[derive(Clone)]
pub struct ImageService {
    store: Arc<dyn BlobStore>,
    originals_container: String,
    thumbnails_container: String,
}

impl ImageService {
    pub fn new(store: Arc<dyn BlobStore>, originals_container: &str, thumbnails_container: &str) -> Self {
        ImageService {
            store,
            originals_container: originals_container.to_string(),
            thumbnails_container: thumbnails_container.to_string(),
        }
    }

    /// Validates, thumbnails, and uploads both blobs. Nothing is persisted in the
    /// database here; callers store the returned reference once this succeeds.
    pub async fn upload(&self, folder: ImageFolder, bytes: Vec<u8>) -> Result<StoredImage, AppError> {
        if bytes.is_empty() {
            return Err(AppError::validation("file", "File is empty"));
        }
        if bytes.len() > MAX_IMAGE_BYTES {
            return Err(AppError::PayloadTooLarge(format!(
                "Image is {} bytes, the limit is {} bytes",
                bytes.len(),
                MAX_IMAGE_BYTES
            )));
        }
        let format = AllowedFormat::detect(&bytes).ok_or_else(|| {
            AppError::UnsupportedMedia("Only JPEG, PNG, WebP, and GIF images are accepted".into())
        })?;

        let (bytes, thumbnail) = tokio::task::spawn_blocking(move || {
            let thumbnail = make_thumbnail(&bytes);
            (bytes, thumbnail)
        })
        .await
        .map_err(|e| AppError::InternalError(format!("Thumbnail task failed: {}", e)))?;
        let thumbnail = thumbnail?;

        let id = Uuid::new_v4();
        let blob_name = format!("{}/{}.{}", folder.as_str(), id, format.extension());
        let thumbnail_blob_name = format!("{}/{}.jpg", folder.as_str(), id);

        self.store
            .upload(&self.originals_container, &blob_name, bytes, format.content_type())
            .await?;

        if let Err(e) = self
            .store
            .upload(&self.thumbnails_container, &thumbnail_blob_name, thumbnail, THUMBNAIL_CONTENT_TYPE)
            .await
        {
            if let Err(cleanup) = self.store.delete(&self.originals_container, &blob_name).await {
                tracing::warn!(blob_name, "Failed to remove orphaned original: {}", cleanup);
            }
            return Err(e);
        }

        tracing::info!(blob_name, thumbnail_blob_name, "Image uploaded");

        let image = StoredImage {
            original_url: String::new(),
            thumbnail_url: String::new(),
            blob_name,
            thumbnail_blob_name,
            content_type: format.content_type().to_string(),
            uploaded_at: BsonDateTime::now(),
        };
        self.sign(image).await
    }

    /// Removes the original and the thumbnail.
    pub async fn delete(&self, image: &StoredImage) -> Result<(), AppError> {
        self.store.delete(&self.originals_container, &image.blob_name).await?;
        self.store
            .delete(&self.thumbnails_container, &image.thumbnail_blob_name)
            .await
    }

    /// Best-effort delete: failures are logged and swallowed.
    pub async fn discard(&self, image: &StoredImage) {
        if let Err(e) = self.delete(image).await {
            tracing::warn!(blob_name = %image.blob_name, "Failed to delete image blobs: {}", e);
        }
    }

    /// Replaces both URLs with freshly signed 24-hour read URLs.
    pub async fn sign(&self, mut image: StoredImage) -> Result<StoredImage, AppError> {
        image.original_url = self
            .store
            .read_url(&self.originals_container, &image.blob_name, READ_URL_TTL)
            .await?;
        image.thumbnail_url = self
            .store
            .read_url(&self.thumbnails_container, &image.thumbnail_blob_name, READ_URL_TTL)
            .await?;
        Ok(image)
    }

    /// Re-signs an optional image, keeping the stored URLs if signing fails.
    pub async fn resign(&self, image: Option<StoredImage>) -> Option<StoredImage> {
        let img = image?;
        match self.sign(img.clone()).await {
            Ok(signed) => Some(signed),
            Err(e) => {
                tracing::warn!(blob_name = %img.blob_name, "Failed to re-sign image URLs: {}", e);
                Some(img)
            }
        }
    }
}

/// Fits the image inside a square of `THUMBNAIL_MAX_SIDE` and encodes it as JPEG.
pub fn make_thumbnail(bytes: &[u8]) -> Result<Vec<u8>, AppError> {
    let decoded = image::load_from_memory(bytes)
        .map_err(|e| AppError::validation("file", &format!("Image could not be decoded: {}", e)))?;

    let resized = if decoded.width() > THUMBNAIL_MAX_SIDE || decoded.height() > THUMBNAIL_MAX_SIDE {
        decoded.thumbnail(THUMBNAIL_MAX_SIDE, THUMBNAIL_MAX_SIDE)
    } else {
        decoded
    };

    let mut out = Cursor::new(Vec::new());
    DynamicImage::ImageRgb8(resized.to_rgb8())
        .write_with_encoder(JpegEncoder::new_with_quality(&mut out, THUMBNAIL_QUALITY))
        .map_err(|e| AppError::InternalError(format!("Thumbnail encoding failed: {}", e)))?;

    Ok(out.into_inner())
}
