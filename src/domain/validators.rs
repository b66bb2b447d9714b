use std::borrow::Cow;

use once_cell::sync::Lazy;
use regex::Regex;
use validator::ValidationError;

pub const MAX_TAGS: usize = 10;
pub const MAX_TAG_LENGTH: usize = 30;
pub const MAX_SKILLS: usize = 20;
pub const MAX_SKILL_LENGTH: usize = 50;

static PHONE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\+?[0-9 ()\-]{5,30}$").expect("phone pattern is valid")
});

pub fn validate_url(url: &str) -> Result<(), ValidationError> {
    match url::Url::parse(url) {
        Ok(parsed) => {
            if parsed.scheme() == "http" || parsed.scheme() == "https" {
                Ok(())
            } else {
                Err(new_validation_error("invalid_url_scheme", "URL must start with http:// or https://"))
            }
        }
        Err(_) => Err(new_validation_error("invalid_url", "Invalid URL format")),
    }
}

pub fn validate_not_blank(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(new_validation_error("blank", "Value cannot be blank"));
    }
    Ok(())
}

pub fn validate_tags(tags: &[String]) -> Result<(), ValidationError> {
    validate_labels(tags, MAX_TAGS, MAX_TAG_LENGTH, "tags")
}

pub fn validate_skills(skills: &[String]) -> Result<(), ValidationError> {
    validate_labels(skills, MAX_SKILLS, MAX_SKILL_LENGTH, "skills")
}

fn validate_labels(values: &[String], max_count: usize, max_len: usize, what: &str) -> Result<(), ValidationError> {
    if values.len() > max_count {
        let mut err = ValidationError::new("too_many_items");
        err.message = Some(format!("At most {} {} are allowed", max_count, what).into());
        return Err(err);
    }
    for value in values {
        let len = value.trim().chars().count();
        if len == 0 || len > max_len {
            let mut err = ValidationError::new("invalid_item_length");
            err.message = Some(format!("Each entry in {} must be 1 to {} characters", what, max_len).into());
            return Err(err);
        }
    }
    Ok(())
}

pub fn validate_phone(phone: &str) -> Result<(), ValidationError> {
    if !PHONE_RE.is_match(phone.trim()) {
        return Err(new_validation_error("invalid_phone", "Phone may only contain digits, spaces, +, -, and parentheses"));
    }
    Ok(())
}

/// Trims every entry and drops duplicates while keeping the first occurrence.
pub fn normalize_labels(values: Vec<String>) -> Vec<String> {
    let mut seen = Vec::with_capacity(values.len());
    for value in values {
        let trimmed = value.trim().to_string();
        if !trimmed.is_empty() && !seen.iter().any(|s: &String| s.eq_ignore_ascii_case(&trimmed)) {
            seen.push(trimmed);
        }
    }
    seen
}

pub fn new_validation_error(code: &'static str, msg: &'static str) -> ValidationError {
    let mut err = ValidationError::new(code);
    err.message = Some(Cow::Borrowed(msg));
    err
}
