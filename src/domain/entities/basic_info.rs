use bson::DateTime as BsonDateTime;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::domain::validators::{validate_not_blank, validate_phone};
use crate::entities::image::{ImageResponse, StoredImage};

/// Fixed `_id` of the singleton document.
pub const BASIC_INFO_ID: &str = "basic_info";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BasicInfo {
    #[serde(rename = "_id")]
    pub id: String,
    pub name: String,
    pub years_of_experience: u32,
    pub phone: String,
    pub email: String,
    #[serde(default)]
    pub profile_picture: Option<StoredImage>,
    pub updated_at: BsonDateTime,
}

impl BasicInfo {
    /// Contact details are filled in and a picture is present.
    pub fn is_complete(&self) -> bool {
        !self.name.is_empty()
            && !self.email.is_empty()
            && !self.phone.is_empty()
            && self.profile_picture.is_some()
    }
}

#[derive(Debug, Serialize)]
pub struct BasicInfoResponse {
    pub name: String,
    pub years_of_experience: u32,
    pub phone: String,
    pub email: String,
    pub profile_picture: Option<ImageResponse>,
    pub updated_at: DateTime<Utc>,
}

impl From<BasicInfo> for BasicInfoResponse {
    fn from(info: BasicInfo) -> Self {
        BasicInfoResponse {
            name: info.name,
            years_of_experience: info.years_of_experience,
            phone: info.phone,
            email: info.email,
            profile_picture: info.profile_picture.map(ImageResponse::from),
            updated_at: info.updated_at.to_chrono(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Validate)]
pub struct UpdateBasicInfoRequest {
    #[validate(
        length(min = 1, max = 100, message = "Name must be between 1 and 100 characters"),
        custom(function = "validate_not_blank", message = "Name cannot be blank")
    )]
    pub name: String,

    #[validate(range(max = 80, message = "Years of experience must be between 0 and 80"))]
    pub years_of_experience: u32,

    #[validate(
        length(max = 30, message = "Phone must be at most 30 characters"),
        custom(function = "validate_phone")
    )]
    pub phone: String,

    #[validate(email(message = "Invalid email format"))]
    pub email: String,
}

impl UpdateBasicInfoRequest {
    /// Merges into the existing singleton, keeping its profile picture.
    pub fn into_basic_info(self, existing: Option<BasicInfo>) -> BasicInfo {
        BasicInfo {
            id: BASIC_INFO_ID.to_string(),
            name: self.name.trim().to_string(),
            years_of_experience: self.years_of_experience,
            phone: self.phone.trim().to_string(),
            email: self.email.trim().to_lowercase(),
            profile_picture: existing.and_then(|info| info.profile_picture),
            updated_at: BsonDateTime::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request() -> UpdateBasicInfoRequest {
        UpdateBasicInfoRequest {
            name: "Ada Lovelace".into(),
            years_of_experience: 12,
            phone: "+44 20 7946 0958".into(),
            email: "Ada@Example.com".into(),
        }
    }

    #[test]
    fn valid_request_passes() {
        assert!(request().validate().is_ok());
    }

    #[test]
    fn invalid_email_and_years_are_reported() {
        let mut req = request();
        req.email = "nope".into();
        req.years_of_experience = 200;
        let errors = req.validate().unwrap_err();
        assert!(errors.field_errors().contains_key("email"));
        assert!(errors.field_errors().contains_key("years_of_experience"));
    }

    #[test]
    fn upsert_keeps_picture_and_normalizes_email() {
        let existing = BasicInfo {
            id: BASIC_INFO_ID.into(),
            name: "Old".into(),
            years_of_experience: 1,
            phone: "123456".into(),
            email: "old@example.com".into(),
            profile_picture: Some(StoredImage {
                blob_name: "profile/a.png".into(),
                thumbnail_blob_name: "profile/a.jpg".into(),
                original_url: "https://blob/a.png".into(),
                thumbnail_url: "https://blob/a.jpg".into(),
                content_type: "image/png".into(),
                uploaded_at: BsonDateTime::now(),
            }),
            updated_at: BsonDateTime::now(),
        };

        let info = request().into_basic_info(Some(existing));
        assert_eq!(info.email, "ada@example.com");
        assert!(info.profile_picture.is_some());
        assert!(info.is_complete());
    }
}
