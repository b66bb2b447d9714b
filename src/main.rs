use std::{sync::Arc, time::Duration};

use actix_web::{middleware::NormalizePath, web, App, HttpServer};
use tracing_actix_web::TracingLogger;

use portfolio_admin::{
    background_task::start_lockout_purge_task,
    db::mongo::{connect, ensure_indexes},
    graceful_shutdown::shutdown_signal,
    handlers::system::START_TIME,
    limiter::login_attempts::LoginAttemptTracker,
    logging::{
        log_sink::{run_log_writer, LogSink, DEFAULT_BATCH_SIZE, DEFAULT_CHANNEL_CAPACITY, DEFAULT_FLUSH_INTERVAL},
        tracing_setup::init_tracing,
    },
    middlewares::{auth::AuthMiddleware, cors::cors, request_log::RequestLogger},
    routes::configure_routes,
    settings::{AppConfig, AppEnvironment},
    shared_repos::SharedRepositories,
    storage::azure::AzureBlobStore,
    AppState,
};

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    once_cell::sync::Lazy::force(&START_TIME);

    let config = match AppConfig::new() {
        Ok(cfg) => {
            init_tracing(&cfg.env);
            tracing::info!("Loaded configuration: {:?}", cfg);
            cfg
        }
        Err(e) => {
            init_tracing(&AppEnvironment::Development);
            tracing::error!("Configuration error: {}", e);
            std::process::exit(1);
        }
    };

    let db = match connect(&config.mongo_uri, &config.database_name, &config.name).await {
        Ok(db) => db,
        Err(e) => {
            tracing::error!("Database connection failed: {}", e);
            std::process::exit(1);
        }
    };
    if let Err(e) = ensure_indexes(&db).await {
        tracing::error!("Failed to create indexes: {}", e);
        std::process::exit(1);
    }

    let blob_store = match AzureBlobStore::new(&config.blob_connection_string) {
        Ok(store) => Arc::new(store),
        Err(e) => {
            tracing::error!("Invalid blob storage configuration: {}", e);
            std::process::exit(1);
        }
    };

    let repos = SharedRepositories::mongo(&db);
    let (log_sink, log_rx) = LogSink::channel(DEFAULT_CHANNEL_CAPACITY);
    let writer = tokio::spawn(run_log_writer(
        repos.log_repo.clone(),
        log_rx,
        DEFAULT_BATCH_SIZE,
        DEFAULT_FLUSH_INTERVAL,
    ));

    let attempts = LoginAttemptTracker::default();
    let app_state = web::Data::new(AppState::new(
        &config,
        repos.clone(),
        blob_store,
        log_sink.clone(),
        attempts.clone(),
    ));

    if let (Some(username), Some(password)) = (&config.bootstrap_admin_username, &config.bootstrap_admin_password) {
        if let Err(e) = app_state.auth_handler.bootstrap_admin(username, password).await {
            tracing::error!("Admin bootstrap failed: {}", e);
        }
    }

    match repos.category_repo.list_categories().await {
        Ok(categories) => match repos.project_repo.normalize_legacy_categories(&categories).await {
            Ok(0) => {}
            Ok(rewritten) => tracing::info!(rewritten, "Normalized legacy project category references"),
            Err(e) => tracing::error!("Category normalization failed: {}", e),
        },
        Err(e) => tracing::error!("Could not load categories for normalization: {}", e),
    }

    tokio::spawn(start_lockout_purge_task(attempts));

    let server_addr = format!("{}:{}", config.host, config.port);
    tracing::info!("Starting {} v{} on {}", config.name, env!("CARGO_PKG_VERSION"), server_addr);

    let server_config = config.clone();
    let server = HttpServer::new(move || {
        App::new()
            .app_data(app_state.clone())
            .wrap(AuthMiddleware)
            .wrap(RequestLogger)
            .wrap(cors(&server_config))
            .wrap(TracingLogger::default())
            .wrap(NormalizePath::trim())
            .configure(configure_routes)
    })
    .workers(config.worker_count)
    .bind(server_addr)?
    .disable_signals()
    .run();

    let handle = server.handle();
    tokio::spawn(async move {
        shutdown_signal().await;
        handle.stop(true).await;
    });
    let result = server.await;

    log_sink.flush().await;
    drop(log_sink);
    match tokio::time::timeout(Duration::from_secs(5), writer).await {
        Ok(Err(e)) => tracing::warn!("Log writer ended abnormally: {}", e),
        Err(_) => tracing::warn!("Log writer did not stop in time"),
        Ok(Ok(())) => {}
    }
    tracing::info!("Server stopped");
    result
}
