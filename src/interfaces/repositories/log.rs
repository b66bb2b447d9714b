use async_trait::async_trait;
use bson::{doc, DateTime as BsonDateTime, Document};
use chrono::{DateTime, Utc};
use futures::TryStreamExt;

use crate::{
    entities::{
        log_entry::{LogEntry, LogFilter},
        pagination::PageRequest,
    },
    errors::AppError,
    repositories::mongo_repo::MongoLogRepo,
};

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait LogRepository: Send + Sync {
    async fn insert_many(&self, entries: Vec<LogEntry>) -> Result<(), AppError>;
    /// Newest first, with the total count matching the filter.
    async fn find_logs(&self, filter: &LogFilter, page: PageRequest) -> Result<(Vec<LogEntry>, u64), AppError>;
    async fn count_logs(&self, filter: &LogFilter) -> Result<u64, AppError>;
    async fn delete_logs_before(&self, cutoff: DateTime<Utc>) -> Result<u64, AppError>;
}

pub fn log_filter_document(filter: &LogFilter) -> Document {
    let mut query = Document::new();
    if let Some(level) = filter.level {
        query.insert("level", level.as_str());
    }
    if let Some(category) = filter.category {
        query.insert("category", category.as_str());
    }

    let mut range = Document::new();
    if let Some(start) = filter.start {
        range.insert("$gte", BsonDateTime::from_chrono(start));
    }
    if let Some(end) = filter.end {
        range.insert("$lte", BsonDateTime::from_chrono(end));
    }
    if !range.is_empty() {
        query.insert("timestamp", range);
    }
    query
}

#[async_trait]
impl LogRepository for MongoLogRepo {
    async fn insert_many(&self, entries: Vec<LogEntry>) -> Result<(), AppError> {
        if entries.is_empty() {
            return Ok(());
        }
        self.collection.insert_many(entries).ordered(false).await?;
        Ok(())
    }

    async fn find_logs(&self, filter: &LogFilter, page: PageRequest) -> Result<(Vec<LogEntry>, u64), AppError> {
        let query = log_filter_document(filter);
        let total = self.collection.count_documents(query.clone()).await?;

        let items = self
            .collection
            .find(query)
            .sort(doc! { "timestamp": -1, "_id": -1 })
            .skip(page.offset())
            .limit(page.limit as i64)
            .await?
            .try_collect()
            .await?;

        Ok((items, total))
    }

    async fn count_logs(&self, filter: &LogFilter) -> Result<u64, AppError> {
        Ok(self.collection.count_documents(log_filter_document(filter)).await?)
    }

    async fn delete_logs_before(&self, cutoff: DateTime<Utc>) -> Result<u64, AppError> {
        let result = self
            .collection
            .delete_many(doc! { "timestamp": { "$lt": BsonDateTime::from_chrono(cutoff) } })
            .await?;
        Ok(result.deleted_count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::log_entry::{LogCategory, LogLevel};
    use chrono::TimeZone;

    #[test]
    fn empty_filter_matches_everything() {
        assert!(log_filter_document(&LogFilter::default()).is_empty());
    }

    #[test]
    fn filter_document_uses_wire_names_and_inclusive_range() {
        let start = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let filter = LogFilter {
            level: Some(LogLevel::Warn),
            category: Some(LogCategory::BasicInfo),
            start: Some(start),
            end: None,
        };

        let query = log_filter_document(&filter);
        assert_eq!(query.get_str("level").unwrap(), "warn");
        assert_eq!(query.get_str("category").unwrap(), "basic_info");

        let range = query.get_document("timestamp").unwrap();
        assert_eq!(range.get_datetime("$gte").unwrap(), &BsonDateTime::from_chrono(start));
        assert!(!range.contains_key("$lte"));
    }
}
