use std::sync::Arc;

use validator::Validate;

use crate::entities::{
    log_entry::{
        LogEntryResponse, LogQueryParams, NewClientLogRequest, PurgeLogsQuery, PurgeLogsResponse,
    },
    pagination::Paginated,
};
use crate::errors::AppError;
use crate::logging::log_sink::LogSink;
use crate::repositories::log::LogRepository;

pub struct LogHandler {
    pub log_repo: Arc<dyn LogRepository>,
    pub log_sink: LogSink,
}

impl LogHandler {
    pub fn new(log_repo: Arc<dyn LogRepository>, log_sink: LogSink) -> Self {
        LogHandler { log_repo, log_sink }
    }

    /// Newest entries first. Level and category must be known values or `all`.
    pub async fn list_logs(&self, params: LogQueryParams) -> Result<Paginated<LogEntryResponse>, AppError> {
        let (filter, page) = params.into_filter()?;
        let (entries, total) = self.log_repo.find_logs(&filter, page).await?;
        Ok(Paginated::new(entries, total, page).map(LogEntryResponse::from))
    }

    /// Queues a client-reported event for the background writer.
    pub fn record_client_log(&self, request: NewClientLogRequest, user: &str) -> Result<(), AppError> {
        request.validate()?;
        let entry = request.into_entry(user)?;
        self.log_sink.record(entry);
        Ok(())
    }

    /// Deletes every entry older than the cutoff. Pending writes are flushed first.
    pub async fn purge_logs(&self, query: PurgeLogsQuery) -> Result<PurgeLogsResponse, AppError> {
        let cutoff = query.cutoff()?;
        self.log_sink.flush().await;

        let deleted_count = self.log_repo.delete_logs_before(cutoff).await?;
        tracing::info!(%cutoff, deleted_count, "Purged old log entries");
        Ok(PurgeLogsResponse { deleted_count })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::log_entry::{LogCategory, LogLevel};
    use crate::repositories::log::MockLogRepository;

    fn handler(repo: MockLogRepository) -> LogHandler {
        let (sink, _rx) = LogSink::channel(8);
        LogHandler::new(Arc::new(repo), sink)
    }

    #[tokio::test]
    async fn unknown_level_is_rejected_before_querying() {
        let mut repo = MockLogRepository::new();
        repo.expect_find_logs().never();

        let params = LogQueryParams {
            level: Some("verbose".into()),
            ..Default::default()
        };
        match handler(repo).list_logs(params).await {
            Err(AppError::ValidationError(fields)) => assert_eq!(fields[0].field, "level"),
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[tokio::test]
    async fn filter_is_passed_through_to_the_repository() {
        let mut repo = MockLogRepository::new();
        repo.expect_find_logs()
            .withf(|filter, _| {
                filter.level == Some(LogLevel::Error) && filter.category == Some(LogCategory::Project)
            })
            .times(1)
            .returning(|_, _| Ok((vec![], 0)));

        let params = LogQueryParams {
            level: Some("error".into()),
            category: Some("project".into()),
            ..Default::default()
        };
        let page = handler(repo).list_logs(params).await.unwrap();
        assert_eq!(page.total, 0);
        assert_eq!(page.total_pages, 0);
    }

    #[test]
    fn client_log_with_bad_category_is_rejected() {
        let result = handler(MockLogRepository::new()).record_client_log(
            NewClientLogRequest {
                level: "info".into(),
                category: Some("nonsense".into()),
                message: "clicked".into(),
                details: None,
            },
            "owner",
        );
        assert!(matches!(result, Err(AppError::ValidationError(_))));
    }
}
