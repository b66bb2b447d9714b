use actix_web::{web, HttpResponse, Responder};
use tracing::instrument;

use crate::{
    entities::category::{NewCategoryRequest, UpdateCategoryRequest},
    errors::AppError,
    use_cases::extractors::AdminClaims,
    AppState,
};

#[instrument(skip(_claims, state))]
pub async fn list_categories(
    _claims: AdminClaims,
    state: web::Data<AppState>,
) -> Result<impl Responder, AppError> {
    let categories = state.category_handler.list_categories().await?;
    Ok(HttpResponse::Ok().json(categories))
}

#[instrument(skip(_claims, state))]
pub async fn initialize_categories(
    _claims: AdminClaims,
    state: web::Data<AppState>,
) -> Result<impl Responder, AppError> {
    let response = state.category_handler.initialize_categories().await?;
    Ok(HttpResponse::Ok().json(response))
}

#[instrument(skip(_claims, state))]
pub async fn list_palettes(_claims: AdminClaims, state: web::Data<AppState>) -> impl Responder {
    HttpResponse::Ok().json(state.category_handler.palettes())
}

#[instrument(skip(_claims, state, data))]
pub async fn create_category(
    _claims: AdminClaims,
    state: web::Data<AppState>,
    data: web::Json<NewCategoryRequest>,
) -> Result<impl Responder, AppError> {
    let category = state.category_handler.create_category(data.into_inner()).await?;
    Ok(HttpResponse::Ok().json(category))
}

#[instrument(skip(_claims, state))]
pub async fn get_category(
    _claims: AdminClaims,
    category_id: web::Path<String>,
    state: web::Data<AppState>,
) -> Result<impl Responder, AppError> {
    let category = state.category_handler.get_category(&category_id).await?;
    Ok(HttpResponse::Ok().json(category))
}

#[instrument(skip(_claims, state, data))]
pub async fn update_category(
    _claims: AdminClaims,
    category_id: web::Path<String>,
    state: web::Data<AppState>,
    data: web::Json<UpdateCategoryRequest>,
) -> Result<impl Responder, AppError> {
    let category = state
        .category_handler
        .update_category(&category_id, data.into_inner())
        .await?;
    Ok(HttpResponse::Ok().json(category))
}

#[instrument(skip(_claims, state))]
pub async fn delete_category(
    _claims: AdminClaims,
    category_id: web::Path<String>,
    state: web::Data<AppState>,
) -> Result<impl Responder, AppError> {
    let response = state.category_handler.delete_category(&category_id).await?;
    Ok(HttpResponse::Ok().json(response))
}
