use actix_multipart::form::{bytes::Bytes, MultipartForm};

/// `multipart/form-data` body carrying a single image in the `file` field.
/// The size and type checks happen in the image service.
#[derive(Debug, MultipartForm)]
pub struct ImageUpload {
    #[multipart(limit = "6MiB")]
    pub file: Bytes,
}

impl ImageUpload {
    pub fn into_bytes(self) -> Vec<u8> {
        self.file.data.to_vec()
    }
}
