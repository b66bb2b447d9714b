use actix_multipart::form::MultipartForm;
use actix_web::{web, HttpResponse, Responder};
use tracing::instrument;

use crate::{
    entities::basic_info::UpdateBasicInfoRequest,
    errors::AppError,
    handlers::uploads::ImageUpload,
    use_cases::extractors::AdminClaims,
    AppState,
};

#[instrument(skip(_claims, state))]
pub async fn get_basic_info(
    _claims: AdminClaims,
    state: web::Data<AppState>,
) -> Result<impl Responder, AppError> {
    let info = state.basic_info_handler.get_basic_info().await?;
    Ok(HttpResponse::Ok().json(info))
}

#[instrument(skip(_claims, state, data))]
pub async fn save_basic_info(
    _claims: AdminClaims,
    state: web::Data<AppState>,
    data: web::Json<UpdateBasicInfoRequest>,
) -> Result<impl Responder, AppError> {
    let info = state.basic_info_handler.save_basic_info(data.into_inner()).await?;
    Ok(HttpResponse::Ok().json(info))
}

#[instrument(skip(_claims, state, form))]
pub async fn upload_profile_picture(
    _claims: AdminClaims,
    state: web::Data<AppState>,
    MultipartForm(form): MultipartForm<ImageUpload>,
) -> Result<impl Responder, AppError> {
    let info = state.basic_info_handler.set_profile_picture(form.into_bytes()).await?;
    Ok(HttpResponse::Ok().json(info))
}

#[instrument(skip(_claims, state))]
pub async fn delete_profile_picture(
    _claims: AdminClaims,
    state: web::Data<AppState>,
) -> Result<impl Responder, AppError> {
    let info = state.basic_info_handler.remove_profile_picture().await?;
    Ok(HttpResponse::Ok().json(info))
}
