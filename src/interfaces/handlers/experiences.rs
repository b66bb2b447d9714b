use actix_multipart::form::MultipartForm;
use actix_web::{web, HttpResponse, Responder};
use tracing::instrument;

use crate::{
    entities::experience::{NewExperienceRequest, UpdateExperienceRequest},
    errors::AppError,
    handlers::uploads::ImageUpload,
    use_cases::extractors::AdminClaims,
    AppState,
};

#[instrument(skip(_claims, state))]
pub async fn list_experiences(
    _claims: AdminClaims,
    state: web::Data<AppState>,
) -> Result<impl Responder, AppError> {
    let experiences = state.experience_handler.list_experiences().await?;
    Ok(HttpResponse::Ok().json(experiences))
}

#[instrument(skip(_claims, state, data))]
pub async fn create_experience(
    _claims: AdminClaims,
    state: web::Data<AppState>,
    data: web::Json<NewExperienceRequest>,
) -> Result<impl Responder, AppError> {
    let experience = state.experience_handler.create_experience(data.into_inner()).await?;
    Ok(HttpResponse::Ok().json(experience))
}

#[instrument(skip(_claims, state))]
pub async fn get_experience(
    _claims: AdminClaims,
    experience_id: web::Path<String>,
    state: web::Data<AppState>,
) -> Result<impl Responder, AppError> {
    let experience = state.experience_handler.get_experience(&experience_id).await?;
    Ok(HttpResponse::Ok().json(experience))
}

#[instrument(skip(_claims, state, data))]
pub async fn update_experience(
    _claims: AdminClaims,
    experience_id: web::Path<String>,
    state: web::Data<AppState>,
    data: web::Json<UpdateExperienceRequest>,
) -> Result<impl Responder, AppError> {
    let experience = state
        .experience_handler
        .update_experience(&experience_id, data.into_inner())
        .await?;
    Ok(HttpResponse::Ok().json(experience))
}

#[instrument(skip(_claims, state))]
pub async fn delete_experience(
    _claims: AdminClaims,
    experience_id: web::Path<String>,
    state: web::Data<AppState>,
) -> Result<impl Responder, AppError> {
    let deleted = state.experience_handler.delete_experience(&experience_id).await?;
    Ok(HttpResponse::Ok().json(deleted))
}

#[instrument(skip(_claims, state, form))]
pub async fn upload_experience_logo(
    _claims: AdminClaims,
    experience_id: web::Path<String>,
    state: web::Data<AppState>,
    MultipartForm(form): MultipartForm<ImageUpload>,
) -> Result<impl Responder, AppError> {
    let experience = state
        .experience_handler
        .set_experience_logo(&experience_id, form.into_bytes())
        .await?;
    Ok(HttpResponse::Ok().json(experience))
}
