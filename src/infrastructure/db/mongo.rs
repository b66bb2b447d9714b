use std::time::Duration;

use bson::{doc, Document};
use mongodb::{
    options::{ClientOptions, IndexOptions},
    Client, Database, IndexModel,
};

use crate::errors::AppError;

pub const ADMINS: &str = "admins";
pub const CATEGORIES: &str = "categories";
pub const PROJECTS: &str = "projects";
pub const WORK_EXPERIENCES: &str = "work_experiences";
pub const BASIC_INFO: &str = "basic_info";
pub const LOGS: &str = "logs";

const CONNECT_ATTEMPTS: u32 = 5;
const INITIAL_BACKOFF: Duration = Duration::from_millis(500);

/// Connects and pings, retrying with exponential backoff.
pub async fn connect(uri: &str, database_name: &str, app_name: &str) -> Result<Database, AppError> {
    let mut options = ClientOptions::parse(uri).await?;
    options.app_name = Some(app_name.to_string());
    options.server_selection_timeout = Some(Duration::from_secs(5));

    let client = Client::with_options(options)?;
    let db = client.database(database_name);

    let mut backoff = INITIAL_BACKOFF;
    for attempt in 1..=CONNECT_ATTEMPTS {
        match ping(&db).await {
            Ok(()) => {
                tracing::info!(database = database_name, "Connected to MongoDB");
                return Ok(db);
            }
            Err(e) if attempt < CONNECT_ATTEMPTS => {
                tracing::warn!(
                    attempt,
                    retry_in_ms = backoff.as_millis() as u64,
                    "MongoDB not reachable yet: {}",
                    e
                );
                tokio::time::sleep(backoff).await;
                backoff *= 2;
            }
            Err(e) => {
                tracing::error!("Giving up on MongoDB after {} attempts", CONNECT_ATTEMPTS);
                return Err(e);
            }
        }
    }

    Err(AppError::InternalError("MongoDB connection attempts exhausted".into()))
}

pub async fn ping(db: &Database) -> Result<(), AppError> {
    db.run_command(doc! { "ping": 1 }).await?;
    Ok(())
}

pub async fn ensure_indexes(db: &Database) -> Result<(), AppError> {
    let unique = || IndexOptions::builder().unique(true).build();

    db.collection::<Document>(ADMINS)
        .create_index(IndexModel::builder().keys(doc! { "username": 1 }).options(unique()).build())
        .await?;

    db.collection::<Document>(CATEGORIES)
        .create_index(IndexModel::builder().keys(doc! { "category_type": 1 }).options(unique()).build())
        .await?;

    let projects = db.collection::<Document>(PROJECTS);
    projects
        .create_index(IndexModel::builder().keys(doc! { "category": 1 }).build())
        .await?;
    projects
        .create_index(IndexModel::builder().keys(doc! { "created_at": -1 }).build())
        .await?;

    let logs = db.collection::<Document>(LOGS);
    logs.create_indexes([
        IndexModel::builder().keys(doc! { "timestamp": -1 }).build(),
        IndexModel::builder().keys(doc! { "level": 1, "timestamp": -1 }).build(),
        IndexModel::builder().keys(doc! { "category": 1, "timestamp": -1 }).build(),
    ])
    .await?;

    tracing::info!("MongoDB indexes ensured");
    Ok(())
}
