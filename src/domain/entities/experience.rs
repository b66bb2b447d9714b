use bson::{oid::ObjectId, DateTime as BsonDateTime};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use validator::{Validate, ValidationError};

use crate::domain::validators::{validate_not_blank, validate_url};
use crate::entities::{
    image::{ImageResponse, StoredImage},
    option_fields::{OptionField, PatchString},
    project::validate_optional_url_field,
};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct WorkExperience {
    #[serde(rename = "_id")]
    pub id: ObjectId,
    pub company_name: String,
    pub position: String,
    pub start_date: NaiveDate,
    #[serde(default)]
    pub end_date: Option<NaiveDate>,
    #[serde(default)]
    pub is_present: bool,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub website: Option<String>,
    #[serde(default)]
    pub logo: Option<StoredImage>,
    pub created_at: BsonDateTime,
    pub updated_at: BsonDateTime,
}

impl WorkExperience {
    /// Date-range rules that span more than one field.
    pub fn check_date_range(&self) -> Result<(), (&'static str, &'static str)> {
        check_date_range(self.start_date, self.end_date, self.is_present)
    }
}

fn check_date_range(
    start: NaiveDate,
    end: Option<NaiveDate>,
    is_present: bool,
) -> Result<(), (&'static str, &'static str)> {
    match (end, is_present) {
        (Some(_), true) => Err(("end_date", "A current position cannot have an end date")),
        (None, false) => Err(("end_date", "End date is required unless the position is current")),
        (Some(end), false) if end < start => Err(("end_date", "End date cannot be before start date")),
        _ => Ok(()),
    }
}

/// Present positions first, then most recent start date.
pub fn sort_experiences(items: &mut [WorkExperience]) {
    items.sort_by(|a, b| {
        b.is_present
            .cmp(&a.is_present)
            .then_with(|| b.start_date.cmp(&a.start_date))
    });
}

#[derive(Debug, Serialize)]
pub struct ExperienceResponse {
    pub id: String,
    pub company_name: String,
    pub position: String,
    pub start_date: NaiveDate,
    pub end_date: Option<NaiveDate>,
    pub is_present: bool,
    pub description: String,
    pub website: Option<String>,
    pub logo: Option<ImageResponse>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<WorkExperience> for ExperienceResponse {
    fn from(experience: WorkExperience) -> Self {
        ExperienceResponse {
            id: experience.id.to_hex(),
            company_name: experience.company_name,
            position: experience.position,
            start_date: experience.start_date,
            end_date: experience.end_date,
            is_present: experience.is_present,
            description: experience.description,
            website: experience.website,
            logo: experience.logo.map(ImageResponse::from),
            created_at: experience.created_at.to_chrono(),
            updated_at: experience.updated_at.to_chrono(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Validate)]
pub struct NewExperienceRequest {
    #[validate(
        length(min = 1, max = 100, message = "Company name must be between 1 and 100 characters"),
        custom(function = "validate_not_blank", message = "Company name cannot be blank")
    )]
    pub company_name: String,

    #[validate(
        length(min = 1, max = 100, message = "Position must be between 1 and 100 characters"),
        custom(function = "validate_not_blank", message = "Position cannot be blank")
    )]
    pub position: String,

    pub start_date: NaiveDate,

    pub end_date: Option<NaiveDate>,

    #[serde(default)]
    pub is_present: bool,

    #[validate(length(max = 2000, message = "Description must be at most 2000 characters"))]
    #[serde(default)]
    pub description: String,

    #[validate(custom(function = "validate_url"))]
    pub website: Option<String>,
}

impl NewExperienceRequest {
    pub fn prepare_for_insert(self) -> WorkExperience {
        let now = BsonDateTime::now();
        WorkExperience {
            id: ObjectId::new(),
            company_name: self.company_name.trim().to_string(),
            position: self.position.trim().to_string(),
            start_date: self.start_date,
            end_date: self.end_date,
            is_present: self.is_present,
            description: self.description.trim().to_string(),
            website: self.website.map(|w| w.trim().to_string()).filter(|w| !w.is_empty()),
            logo: None,
            created_at: now,
            updated_at: now,
        }
    }
}

#[derive(Debug, Default, Deserialize, Validate)]
pub struct UpdateExperienceRequest {
    #[validate(
        length(min = 1, max = 100, message = "Company name must be between 1 and 100 characters"),
        custom(function = "validate_not_blank", message = "Company name cannot be blank")
    )]
    pub company_name: Option<String>,

    #[validate(
        length(min = 1, max = 100, message = "Position must be between 1 and 100 characters"),
        custom(function = "validate_not_blank", message = "Position cannot be blank")
    )]
    pub position: Option<String>,

    pub start_date: Option<NaiveDate>,

    #[serde(default)]
    pub end_date: OptionField<NaiveDate>,

    pub is_present: Option<bool>,

    #[validate(length(max = 2000, message = "Description must be at most 2000 characters"))]
    pub description: Option<String>,

    #[serde(default)]
    #[validate(custom(function = "validate_optional_url_field"))]
    pub website: PatchString,
}

impl UpdateExperienceRequest {
    pub fn apply_to(self, experience: &mut WorkExperience) {
        if let Some(company_name) = self.company_name {
            experience.company_name = company_name.trim().to_string();
        }
        if let Some(position) = self.position {
            experience.position = position.trim().to_string();
        }
        if let Some(start_date) = self.start_date {
            experience.start_date = start_date;
        }
        if let Some(is_present) = self.is_present {
            experience.is_present = is_present;
            // Switching to "present" drops a stale end date unless one is sent explicitly.
            if is_present && self.end_date.is_unchanged() {
                experience.end_date = None;
            }
        }
        self.end_date.apply(&mut experience.end_date);
        if let Some(description) = self.description {
            experience.description = description.trim().to_string();
        }
        self.website
            .map_value(|w| w.trim().to_string())
            .apply(&mut experience.website);
        experience.updated_at = BsonDateTime::now();
    }
}

pub fn validate_new_experience_dates(request: &NewExperienceRequest) -> Result<(), ValidationError> {
    check_date_range(request.start_date, request.end_date, request.is_present).map_err(|(_, msg)| {
        let mut err = ValidationError::new("invalid_date_range");
        err.message = Some(msg.into());
        err
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    fn new_request(end: Option<&str>, is_present: bool) -> NewExperienceRequest {
        NewExperienceRequest {
            company_name: "Acme".into(),
            position: "Engineer".into(),
            start_date: date("2020-01-01"),
            end_date: end.map(date),
            is_present,
            description: String::new(),
            website: Some("https://acme.test".into()),
        }
    }

    #[test]
    fn date_range_rules() {
        assert!(validate_new_experience_dates(&new_request(None, true)).is_ok());
        assert!(validate_new_experience_dates(&new_request(Some("2022-06-30"), false)).is_ok());
        assert!(validate_new_experience_dates(&new_request(None, false)).is_err());
        assert!(validate_new_experience_dates(&new_request(Some("2022-06-30"), true)).is_err());
        assert!(validate_new_experience_dates(&new_request(Some("2019-12-31"), false)).is_err());
    }

    #[test]
    fn switching_to_present_clears_end_date() {
        let mut experience = new_request(Some("2022-06-30"), false).prepare_for_insert();
        UpdateExperienceRequest { is_present: Some(true), ..Default::default() }.apply_to(&mut experience);

        assert!(experience.is_present);
        assert_eq!(experience.end_date, None);
        assert!(experience.check_date_range().is_ok());
    }

    #[test]
    fn experiences_sort_present_first_then_newest() {
        let mut old = new_request(Some("2021-01-01"), false).prepare_for_insert();
        old.start_date = date("2018-01-01");
        let mut newer = new_request(Some("2023-01-01"), false).prepare_for_insert();
        newer.start_date = date("2022-01-01");
        let current = new_request(None, true).prepare_for_insert();

        let mut items = vec![old.clone(), current.clone(), newer.clone()];
        sort_experiences(&mut items);

        assert_eq!(items[0].id, current.id);
        assert_eq!(items[1].id, newer.id);
        assert_eq!(items[2].id, old.id);
    }
}
