use bson::oid::ObjectId;

use crate::errors::AppError;

/// Parses a path id, mapping malformed input to 400.
pub fn parse_object_id(raw: &str) -> Result<ObjectId, AppError> {
    ObjectId::parse_str(raw.trim())
        .map_err(|_| AppError::BadRequest(format!("Invalid id: {}", raw)))
}
