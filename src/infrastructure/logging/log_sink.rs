use std::{sync::Arc, time::Duration};

use tokio::sync::{mpsc, oneshot};
use tokio::time::{interval, MissedTickBehavior};

use crate::entities::log_entry::LogEntry;
use crate::repositories::log::LogRepository;

pub const DEFAULT_CHANNEL_CAPACITY: usize = 1024;
pub const DEFAULT_BATCH_SIZE: usize = 50;
pub const DEFAULT_FLUSH_INTERVAL: Duration = Duration::from_secs(2);

#[derive(Debug)]
pub enum LogCommand {
    Write(LogEntry),
    /// Persist everything buffered so far, then acknowledge.
    Flush(oneshot::Sender<()>),
}

/// Non-blocking handle for appending activity log entries.
#[derive(Clone, Debug)]
pub struct LogSink {
    tx: mpsc::Sender<LogCommand>,
}

impl LogSink {
    pub fn channel(capacity: usize) -> (LogSink, mpsc::Receiver<LogCommand>) {
        let (tx, rx) = mpsc::channel(capacity.max(1));
        (LogSink { tx }, rx)
    }

    /// Queues an entry. Drops it with a warning if the writer is saturated.
    pub fn record(&self, entry: LogEntry) {
        match self.tx.try_send(LogCommand::Write(entry)) {
            Ok(()) => {}
            Err(mpsc::error::TrySendError::Full(LogCommand::Write(entry))) => {
                tracing::warn!(
                    category = %entry.category,
                    message = %entry.message,
                    "Activity log buffer full, dropping entry"
                );
            }
            Err(mpsc::error::TrySendError::Full(_)) => {}
            Err(mpsc::error::TrySendError::Closed(_)) => {
                tracing::debug!("Activity log writer stopped, entry discarded");
            }
        }
    }

    /// Waits until every entry queued before this call has been written.
    pub async fn flush(&self) {
        let (ack_tx, ack_rx) = oneshot::channel();
        if self.tx.send(LogCommand::Flush(ack_tx)).await.is_ok() {
            let _ = ack_rx.await;
        }
    }
}

/// Background writer: batches entries and inserts them when the batch is full,
/// on every tick, on explicit flush, and when all senders are gone.
pub async fn run_log_writer(
    repo: Arc<dyn LogRepository>,
    mut rx: mpsc::Receiver<LogCommand>,
    batch_size: usize,
    flush_every: Duration,
) {
    let batch_size = batch_size.max(1);
    let mut buffer: Vec<LogEntry> = Vec::with_capacity(batch_size);
    let mut ticker = interval(flush_every);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            command = rx.recv() => match command {
                Some(LogCommand::Write(entry)) => {
                    buffer.push(entry);
                    if buffer.len() >= batch_size {
                        write_batch(repo.as_ref(), &mut buffer).await;
                    }
                }
                Some(LogCommand::Flush(ack)) => {
                    write_batch(repo.as_ref(), &mut buffer).await;
                    let _ = ack.send(());
                }
                None => {
                    write_batch(repo.as_ref(), &mut buffer).await;
                    tracing::info!("Activity log writer stopped");
                    return;
                }
            },
            _ = ticker.tick() => {
                write_batch(repo.as_ref(), &mut buffer).await;
            }
        }
    }
}

async fn write_batch(repo: &dyn LogRepository, buffer: &mut Vec<LogEntry>) {
    if buffer.is_empty() {
        return;
    }
    let batch = std::mem::take(buffer);
    let count = batch.len();
    match repo.insert_many(batch).await {
        Ok(()) => tracing::debug!(count, "Activity log batch written"),
        Err(e) => tracing::error!(count, "Failed to write activity log batch: {}", e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::log_entry::LogCategory;
    use crate::repositories::log::MockLogRepository;
    use parking_lot::Mutex;

    fn capturing_repo(sink: Arc<Mutex<Vec<usize>>>) -> Arc<dyn LogRepository> {
        let mut repo = MockLogRepository::new();
        repo.expect_insert_many().returning(move |batch| {
            sink.lock().push(batch.len());
            Ok(())
        });
        Arc::new(repo)
    }

    #[tokio::test]
    async fn full_batch_is_written_without_waiting_for_the_tick() {
        let batches = Arc::new(Mutex::new(Vec::new()));
        let (sink, rx) = LogSink::channel(16);
        let writer = tokio::spawn(run_log_writer(
            capturing_repo(batches.clone()),
            rx,
            3,
            Duration::from_secs(3600),
        ));

        for i in 0..4 {
            sink.record(LogEntry::info(LogCategory::System, format!("event {i}")));
        }
        sink.flush().await;

        assert_eq!(*batches.lock(), vec![3, 1]);
        drop(sink);
        writer.await.unwrap();
    }

    #[tokio::test]
    async fn dropping_every_sender_flushes_the_remainder() {
        let batches = Arc::new(Mutex::new(Vec::new()));
        let (sink, rx) = LogSink::channel(16);
        let writer = tokio::spawn(run_log_writer(
            capturing_repo(batches.clone()),
            rx,
            50,
            Duration::from_secs(3600),
        ));

        sink.record(LogEntry::warn(LogCategory::Auth, "failed login"));
        drop(sink);
        writer.await.unwrap();

        assert_eq!(*batches.lock(), vec![1]);
    }

    #[tokio::test]
    async fn full_channel_drops_instead_of_blocking() {
        let (sink, mut rx) = LogSink::channel(1);
        sink.record(LogEntry::info(LogCategory::System, "first"));
        sink.record(LogEntry::info(LogCategory::System, "second"));

        assert!(matches!(rx.try_recv(), Ok(LogCommand::Write(e)) if e.message == "first"));
        assert!(rx.try_recv().is_err());
    }
}
