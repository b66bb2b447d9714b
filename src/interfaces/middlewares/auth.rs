use actix_web::{
    body::BoxBody,
    dev::{Service, ServiceRequest, ServiceResponse, Transform},
    web, Error, HttpMessage, ResponseError,
};
use futures_util::future::{ok, LocalBoxFuture, Ready};
use std::{rc::Rc, task::{Context, Poll}};

use crate::{errors::AuthError, handlers::auth::SESSION_COOKIE, AppState};

pub const ADMIN_PREFIX: &str = "/api/admin";

/// Decodes the session token and puts its claims in request extensions.
/// Requests under the admin prefix without a valid session get a 401.
pub struct AuthMiddleware;

impl<S> Transform<S, ServiceRequest> for AuthMiddleware
where
    S: Service<ServiceRequest, Response = ServiceResponse<BoxBody>, Error = Error> + 'static,
{
    type Response = ServiceResponse<BoxBody>;
    type Error = Error;
    type InitError = ();
    type Transform = AuthMiddlewareService<S>;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ok(AuthMiddlewareService {
            service: Rc::new(service),
        })
    }
}

pub struct AuthMiddlewareService<S> {
    service: Rc<S>,
}

impl<S> Service<ServiceRequest> for AuthMiddlewareService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<BoxBody>, Error = Error> + 'static,
{
    type Response = ServiceResponse<BoxBody>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    fn poll_ready(&self, ctx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.service.poll_ready(ctx)
    }

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let service = Rc::clone(&self.service);

        Box::pin(async move {
            if is_public_route(req.path(), req.method().as_str()) {
                return service.call(req).await;
            }

            let Some(state) = req.app_data::<web::Data<AppState>>().cloned() else {
                tracing::error!("AppState missing in auth middleware");
                return Ok(unauthorized(req, AuthError::MissingCredentials));
            };

            let Some(token) = extract_token(&req) else {
                tracing::debug!(path = %req.path(), "Request without session token");
                return Ok(unauthorized(req, AuthError::MissingCredentials));
            };

            match state.auth_handler.decode_session(&token) {
                Ok(claims) => {
                    req.extensions_mut().insert(claims);
                    service.call(req).await
                }
                Err(e) => {
                    tracing::warn!(path = %req.path(), "Rejected session token: {}", e);
                    Ok(unauthorized(req, e))
                }
            }
        })
    }
}

pub fn is_public_route(path: &str, method: &str) -> bool {
    if method == "OPTIONS" || !path.starts_with(ADMIN_PREFIX) {
        return true;
    }
    matches!(
        (path.trim_end_matches('/'), method),
        ("/api/admin/auth/login", "POST")
    )
}

/// Bearer header first, then the session cookie.
fn extract_token(req: &ServiceRequest) -> Option<String> {
    let from_header = req
        .headers()
        .get("Authorization")
        .and_then(|header| header.to_str().ok())
        .and_then(|header| {
            let parts: Vec<&str> = header.split_whitespace().collect();
            if parts.len() == 2 && parts[0].eq_ignore_ascii_case("bearer") {
                Some(parts[1].to_string())
            } else {
                None
            }
        });

    from_header.or_else(|| {
        req.cookie(SESSION_COOKIE)
            .map(|c| c.value().to_string())
            .filter(|v| !v.is_empty())
    })
}

fn unauthorized(req: ServiceRequest, err: AuthError) -> ServiceResponse<BoxBody> {
    req.into_response(err.error_response())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_login_is_public_under_the_admin_prefix() {
        assert!(is_public_route("/api/admin/auth/login", "POST"));
        assert!(is_public_route("/api/admin/projects", "OPTIONS"));
        assert!(is_public_route("/health", "GET"));
        assert!(is_public_route("/", "GET"));
        assert!(!is_public_route("/api/admin/auth/login", "GET"));
        assert!(!is_public_route("/api/admin/projects", "GET"));
        assert!(!is_public_route("/api/admin/auth/logout", "POST"));
    }
}
