use actix_web::{web, HttpResponse, Responder};
use tracing::instrument;

use crate::{
    entities::log_entry::{LogQueryParams, NewClientLogRequest, PurgeLogsQuery},
    errors::AppError,
    use_cases::extractors::AdminClaims,
    AppState,
};

#[instrument(skip(_claims, state, query))]
pub async fn list_logs(
    _claims: AdminClaims,
    state: web::Data<AppState>,
    query: web::Query<LogQueryParams>,
) -> Result<impl Responder, AppError> {
    let page = state.log_handler.list_logs(query.into_inner()).await?;
    Ok(HttpResponse::Ok().json(page))
}

#[instrument(skip(claims, state, data))]
pub async fn create_log(
    claims: AdminClaims,
    state: web::Data<AppState>,
    data: web::Json<NewClientLogRequest>,
) -> Result<impl Responder, AppError> {
    state
        .log_handler
        .record_client_log(data.into_inner(), claims.username())?;
    Ok(HttpResponse::Created().json(serde_json::json!({ "message": "Log entry recorded" })))
}

#[instrument(skip(_claims, state, query))]
pub async fn purge_logs(
    _claims: AdminClaims,
    state: web::Data<AppState>,
    query: web::Query<PurgeLogsQuery>,
) -> Result<impl Responder, AppError> {
    let response = state.log_handler.purge_logs(query.into_inner()).await?;
    Ok(HttpResponse::Ok().json(response))
}
