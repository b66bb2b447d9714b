use std::{fmt, str::FromStr};

use bson::{oid::ObjectId, DateTime as BsonDateTime};
use chrono::{DateTime, NaiveDate, NaiveTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::entities::pagination::PageRequest;
use crate::errors::AppError;

pub const DEFAULT_LOG_PAGE_SIZE: u64 = 50;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Debug,
    Info,
    Warn,
    Error,
}

impl LogLevel {
    pub const ALL: [LogLevel; 4] = [LogLevel::Debug, LogLevel::Info, LogLevel::Warn, LogLevel::Error];

    pub fn as_str(&self) -> &'static str {
        match self {
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warn => "warn",
            LogLevel::Error => "error",
        }
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LogLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase();
        LogLevel::ALL
            .into_iter()
            .find(|level| level.as_str() == wanted)
            .ok_or_else(|| "Level must be one of: debug, info, warn, error".to_string())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogCategory {
    Auth,
    Project,
    Category,
    Experience,
    BasicInfo,
    Dashboard,
    System,
    Client,
    Request,
}

impl LogCategory {
    pub const ALL: [LogCategory; 9] = [
        LogCategory::Auth,
        LogCategory::Project,
        LogCategory::Category,
        LogCategory::Experience,
        LogCategory::BasicInfo,
        LogCategory::Dashboard,
        LogCategory::System,
        LogCategory::Client,
        LogCategory::Request,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            LogCategory::Auth => "auth",
            LogCategory::Project => "project",
            LogCategory::Category => "category",
            LogCategory::Experience => "experience",
            LogCategory::BasicInfo => "basic_info",
            LogCategory::Dashboard => "dashboard",
            LogCategory::System => "system",
            LogCategory::Client => "client",
            LogCategory::Request => "request",
        }
    }
}

impl fmt::Display for LogCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LogCategory {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase();
        LogCategory::ALL
            .into_iter()
            .find(|category| category.as_str() == wanted)
            .ok_or_else(|| {
                let names: Vec<&str> = LogCategory::ALL.iter().map(|c| c.as_str()).collect();
                format!("Category must be one of: {}", names.join(", "))
            })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RequestMeta {
    pub method: String,
    pub path: String,
    pub ip: String,
    #[serde(default)]
    pub user_agent: Option<String>,
    #[serde(default)]
    pub status: Option<u16>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LogEntry {
    #[serde(rename = "_id")]
    pub id: ObjectId,
    pub timestamp: BsonDateTime,
    pub level: LogLevel,
    pub category: LogCategory,
    pub message: String,
    #[serde(default)]
    pub details: serde_json::Value,
    #[serde(default)]
    pub user: Option<String>,
    #[serde(default)]
    pub request: Option<RequestMeta>,
}

impl LogEntry {
    pub fn new(level: LogLevel, category: LogCategory, message: impl Into<String>) -> Self {
        LogEntry {
            id: ObjectId::new(),
            timestamp: BsonDateTime::now(),
            level,
            category,
            message: message.into(),
            details: serde_json::Value::Null,
            user: None,
            request: None,
        }
    }

    pub fn info(category: LogCategory, message: impl Into<String>) -> Self {
        LogEntry::new(LogLevel::Info, category, message)
    }

    pub fn warn(category: LogCategory, message: impl Into<String>) -> Self {
        LogEntry::new(LogLevel::Warn, category, message)
    }

    pub fn error(category: LogCategory, message: impl Into<String>) -> Self {
        LogEntry::new(LogLevel::Error, category, message)
    }

    pub fn with_details(mut self, details: serde_json::Value) -> Self {
        self.details = details;
        self
    }

    pub fn with_user(mut self, user: impl Into<String>) -> Self {
        self.user = Some(user.into());
        self
    }

    pub fn with_request(mut self, request: RequestMeta) -> Self {
        self.request = Some(request);
        self
    }

    /// Checks the entry against a filter the same way the database query does.
    pub fn matches(&self, filter: &LogFilter) -> bool {
        let at = self.timestamp.to_chrono();
        filter.level.is_none_or(|level| level == self.level)
            && filter.category.is_none_or(|category| category == self.category)
            && filter.start.is_none_or(|start| at >= start)
            && filter.end.is_none_or(|end| at <= end)
    }
}

#[derive(Debug, Serialize)]
pub struct LogEntryResponse {
    pub id: String,
    pub timestamp: DateTime<Utc>,
    pub level: LogLevel,
    pub category: LogCategory,
    pub message: String,
    pub details: serde_json::Value,
    pub user: Option<String>,
    pub request: Option<RequestMeta>,
}

impl From<LogEntry> for LogEntryResponse {
    fn from(entry: LogEntry) -> Self {
        LogEntryResponse {
            id: entry.id.to_hex(),
            timestamp: entry.timestamp.to_chrono(),
            level: entry.level,
            category: entry.category,
            message: entry.message,
            details: entry.details,
            user: entry.user,
            request: entry.request,
        }
    }
}

/// Event reported by the admin client.
#[derive(Debug, Serialize, Deserialize, Validate)]
pub struct NewClientLogRequest {
    pub level: String,

    pub category: Option<String>,

    #[validate(length(min = 1, max = 1000, message = "Message must be between 1 and 1000 characters"))]
    pub message: String,

    #[serde(default)]
    pub details: Option<serde_json::Value>,
}

impl NewClientLogRequest {
    pub fn into_entry(self, user: &str) -> Result<LogEntry, AppError> {
        let level = LogLevel::from_str(&self.level)
            .map_err(|msg| AppError::validation("level", &msg))?;
        let category = match self.category.as_deref().map(str::trim) {
            None | Some("") => LogCategory::Client,
            Some(raw) => LogCategory::from_str(raw).map_err(|msg| AppError::validation("category", &msg))?,
        };

        Ok(LogEntry::new(level, category, self.message.trim())
            .with_details(self.details.unwrap_or(serde_json::Value::Null))
            .with_user(user))
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct LogFilter {
    pub level: Option<LogLevel>,
    pub category: Option<LogCategory>,
    pub start: Option<DateTime<Utc>>,
    pub end: Option<DateTime<Utc>>,
}

#[derive(Debug, Default, Deserialize)]
pub struct LogQueryParams {
    pub level: Option<String>,
    pub category: Option<String>,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    pub page: Option<u64>,
    pub limit: Option<u64>,
}

impl LogQueryParams {
    pub fn into_filter(self) -> Result<(LogFilter, PageRequest), AppError> {
        let level = non_empty(self.level.as_deref())
            .map(|raw| LogLevel::from_str(raw).map_err(|msg| AppError::validation("level", &msg)))
            .transpose()?;
        let category = non_empty(self.category.as_deref())
            .map(|raw| LogCategory::from_str(raw).map_err(|msg| AppError::validation("category", &msg)))
            .transpose()?;
        let start = non_empty(self.start_date.as_deref())
            .map(|raw| parse_boundary(raw, Boundary::Start).ok_or_else(|| invalid_date("start_date")))
            .transpose()?;
        let end = non_empty(self.end_date.as_deref())
            .map(|raw| parse_boundary(raw, Boundary::End).ok_or_else(|| invalid_date("end_date")))
            .transpose()?;

        if let (Some(start), Some(end)) = (start, end) {
            if start > end {
                return Err(AppError::validation("start_date", "Start date must not be after end date"));
            }
        }

        let filter = LogFilter { level, category, start, end };
        Ok((filter, PageRequest::new(self.page, self.limit, DEFAULT_LOG_PAGE_SIZE)))
    }
}

#[derive(Debug, Deserialize)]
pub struct PurgeLogsQuery {
    pub before: String,
}

impl PurgeLogsQuery {
    pub fn cutoff(&self) -> Result<DateTime<Utc>, AppError> {
        parse_boundary(self.before.trim(), Boundary::Start).ok_or_else(|| invalid_date("before"))
    }
}

#[derive(Debug, Serialize)]
pub struct PurgeLogsResponse {
    #[serde(rename = "deletedCount")]
    pub deleted_count: u64,
}

#[derive(Debug, Clone, Copy)]
enum Boundary {
    Start,
    End,
}

/// `all` and empty values mean "no filter".
fn non_empty(value: Option<&str>) -> Option<&str> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty() && !v.eq_ignore_ascii_case("all"))
}

/// Accepts RFC 3339 or a bare `YYYY-MM-DD`. A bare end date covers the whole day.
fn parse_boundary(raw: &str, boundary: Boundary) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    let date = NaiveDate::parse_from_str(raw, "%Y-%m-%d").ok()?;
    let time = match boundary {
        Boundary::Start => NaiveTime::MIN,
        Boundary::End => NaiveTime::from_hms_milli_opt(23, 59, 59, 999)?,
    };
    Some(Utc.from_utc_datetime(&date.and_time(time)))
}

fn invalid_date(field: &str) -> AppError {
    AppError::validation(field, "Date must be RFC 3339 or YYYY-MM-DD")
}
