use actix_web::{
    cookie::{time::Duration as CookieDuration, Cookie, SameSite},
    get, post, put, web, HttpRequest, HttpResponse, Responder, ResponseError,
};
use tracing::instrument;

use crate::entities::admin::{normalize_username, ChangePasswordRequest, LoginRequest};
use crate::entities::log_entry::{LogCategory, LogEntry, RequestMeta};
use crate::errors::AppError;
use crate::use_cases::{auth::LoginFailure, extractors::AdminClaims};
use crate::utils::get_client_ip::{get_client_ip, user_agent};
use crate::AppState;

pub const SESSION_COOKIE: &str = "admin_session";

fn session_cookie(token: String, max_age_secs: i64, secure: bool) -> Cookie<'static> {
    Cookie::build(SESSION_COOKIE, token)
        .path("/")
        .http_only(true)
        .secure(secure)
        .same_site(SameSite::Strict)
        .max_age(CookieDuration::seconds(max_age_secs))
        .finish()
}

#[post("/login")]
#[instrument(skip(req, state, body))]
pub async fn login(
    req: HttpRequest,
    state: web::Data<AppState>,
    body: web::Json<LoginRequest>,
) -> Result<impl Responder, AppError> {
    let ip = get_client_ip(&req, state.trust_x_forwarded_for);
    let request_meta = RequestMeta {
        method: req.method().to_string(),
        path: req.path().to_string(),
        ip: ip.clone(),
        user_agent: user_agent(&req),
        status: None,
    };
    let request = body.into_inner();
    let username = normalize_username(&request.username);

    match state.auth_handler.login(request, &ip).await {
        Ok(issued) => {
            state.log_sink.record(
                LogEntry::info(LogCategory::Auth, "Admin logged in")
                    .with_user(&username)
                    .with_request(RequestMeta { status: Some(200), ..request_meta }),
            );
            let cookie = session_cookie(issued.access_token.clone(), issued.expires_in, state.cookie_secure);
            Ok(HttpResponse::Ok().cookie(cookie).json(issued))
        }
        Err(failure) => {
            let entry = match &failure {
                LoginFailure::WrongCredentials { locked_now: true } => Some(
                    LogEntry::warn(LogCategory::Auth, "Failed login attempt, pair locked")
                        .with_details(serde_json::json!({ "locked": true })),
                ),
                LoginFailure::WrongCredentials { locked_now: false } => {
                    Some(LogEntry::warn(LogCategory::Auth, "Failed login attempt"))
                }
                LoginFailure::Locked { retry_after } => Some(
                    LogEntry::warn(LogCategory::Auth, "Login attempt while locked")
                        .with_details(serde_json::json!({ "retry_after": retry_after })),
                ),
                LoginFailure::Internal(e) => Some(
                    LogEntry::error(LogCategory::Auth, "Login failed with an internal error")
                        .with_details(serde_json::json!({ "error": e.to_string() })),
                ),
                LoginFailure::Invalid(_) => None,
            };

            let error = AppError::from(failure);
            if let Some(entry) = entry {
                let status = error.status_code().as_u16();
                state.log_sink.record(
                    entry
                        .with_user(&username)
                        .with_request(RequestMeta { status: Some(status), ..request_meta }),
                );
            }
            Err(error)
        }
    }
}

#[post("/logout")]
#[instrument(skip(state, claims))]
pub async fn logout(state: web::Data<AppState>, claims: AdminClaims) -> impl Responder {
    state
        .log_sink
        .record(LogEntry::info(LogCategory::Auth, "Admin logged out").with_user(claims.username()));

    let mut removal = session_cookie(String::new(), 0, state.cookie_secure);
    removal.make_removal();
    HttpResponse::Ok()
        .cookie(removal)
        .json(serde_json::json!({ "message": "Logged out successfully" }))
}

#[get("/session")]
#[instrument(skip(state, claims))]
pub async fn session(state: web::Data<AppState>, claims: AdminClaims) -> Result<impl Responder, AppError> {
    let admin = state.auth_handler.session(&claims.0).await?;
    Ok(HttpResponse::Ok().json(admin))
}

#[put("/password")]
#[instrument(skip(state, claims, body))]
pub async fn change_password(
    state: web::Data<AppState>,
    claims: AdminClaims,
    body: web::Json<ChangePasswordRequest>,
) -> Result<impl Responder, AppError> {
    state.auth_handler.change_password(&claims.0, body.into_inner()).await?;

    state
        .log_sink
        .record(LogEntry::info(LogCategory::Auth, "Password changed").with_user(claims.username()));
    Ok(HttpResponse::Ok().json(serde_json::json!({ "message": "Password updated successfully" })))
}
