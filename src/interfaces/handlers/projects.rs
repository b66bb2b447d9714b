use actix_multipart::form::MultipartForm;
use actix_web::{web, HttpResponse, Responder};
use tracing::instrument;

use crate::{
    entities::project::{NewProjectRequest, ProjectListQuery, UpdateProjectRequest},
    errors::AppError,
    handlers::uploads::ImageUpload,
    use_cases::extractors::AdminClaims,
    AppState,
};

#[instrument(skip(_claims, state, query))]
pub async fn list_projects(
    _claims: AdminClaims,
    state: web::Data<AppState>,
    query: web::Query<ProjectListQuery>,
) -> Result<impl Responder, AppError> {
    let page = state.project_handler.list_projects(query.into_inner()).await?;
    Ok(HttpResponse::Ok().json(page))
}

#[instrument(skip(claims, state, data))]
pub async fn create_project(
    claims: AdminClaims,
    state: web::Data<AppState>,
    data: web::Json<NewProjectRequest>,
) -> Result<impl Responder, AppError> {
    let project = state
        .project_handler
        .create_project(data.into_inner(), claims.admin_id())
        .await?;
    Ok(HttpResponse::Ok().json(project))
}

#[instrument(skip(_claims, state))]
pub async fn get_project(
    _claims: AdminClaims,
    project_id: web::Path<String>,
    state: web::Data<AppState>,
) -> Result<impl Responder, AppError> {
    let project = state.project_handler.get_project(&project_id).await?;
    Ok(HttpResponse::Ok().json(project))
}

#[instrument(skip(_claims, state, data))]
pub async fn update_project(
    _claims: AdminClaims,
    project_id: web::Path<String>,
    state: web::Data<AppState>,
    data: web::Json<UpdateProjectRequest>,
) -> Result<impl Responder, AppError> {
    let project = state
        .project_handler
        .update_project(&project_id, data.into_inner())
        .await?;
    Ok(HttpResponse::Ok().json(project))
}

#[instrument(skip(_claims, state))]
pub async fn delete_project(
    _claims: AdminClaims,
    project_id: web::Path<String>,
    state: web::Data<AppState>,
) -> Result<impl Responder, AppError> {
    let deleted = state.project_handler.delete_project(&project_id).await?;
    Ok(HttpResponse::Ok().json(deleted))
}

#[instrument(skip(_claims, state, form))]
pub async fn upload_project_image(
    _claims: AdminClaims,
    project_id: web::Path<String>,
    state: web::Data<AppState>,
    MultipartForm(form): MultipartForm<ImageUpload>,
) -> Result<impl Responder, AppError> {
    let project = state
        .project_handler
        .set_project_image(&project_id, form.into_bytes())
        .await?;
    Ok(HttpResponse::Ok().json(project))
}

#[instrument(skip(_claims, state))]
pub async fn delete_project_image(
    _claims: AdminClaims,
    project_id: web::Path<String>,
    state: web::Data<AppState>,
) -> Result<impl Responder, AppError> {
    let project = state.project_handler.remove_project_image(&project_id).await?;
    Ok(HttpResponse::Ok().json(project))
}
