use actix_multipart::form::MultipartFormConfig;
use actix_web::web;

use crate::errors::AppError;

/// Upload bodies are capped slightly above the image limit so the image
/// service can answer 413 with a precise message.
const MULTIPART_LIMIT: usize = 6 * 1024 * 1024;

/// Maps extractor failures onto the API's error envelope.
pub fn config_routes(cfg: &mut web::ServiceConfig) {
    cfg.app_data(web::JsonConfig::default().error_handler(|err, _req| AppError::from(err).into()))
        .app_data(web::QueryConfig::default().error_handler(|err, _req| AppError::from(err).into()))
        .app_data(
            MultipartFormConfig::default()
                .total_limit(MULTIPART_LIMIT)
                .memory_limit(MULTIPART_LIMIT)
                .error_handler(|err, _req| AppError::from(err).into()),
        );
}
