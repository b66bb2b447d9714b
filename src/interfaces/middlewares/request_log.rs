use actix_web::{
    body::MessageBody,
    dev::{Service, ServiceRequest, ServiceResponse, Transform},
    web, Error, HttpMessage,
};
use futures_util::future::{ok, LocalBoxFuture, Ready};
use std::{rc::Rc, task::{Context, Poll}};

use crate::{
    entities::{
        log_entry::{LogCategory, LogEntry, LogLevel, RequestMeta},
        token::Claims,
    },
    middlewares::auth::ADMIN_PREFIX,
    utils::get_client_ip::{service_client_ip, user_agent},
    AppState,
};

const LOGIN_PATH: &str = "/api/admin/auth/login";

/// Writes failed admin API requests (status >= 400) to the activity log.
pub struct RequestLogger;

impl<S, B> Transform<S, ServiceRequest> for RequestLogger
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    B: MessageBody + 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type InitError = ();
    type Transform = RequestLoggerService<S>;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ok(RequestLoggerService {
            service: Rc::new(service),
        })
    }
}

pub struct RequestLoggerService<S> {
    service: Rc<S>,
}

impl<S, B> Service<ServiceRequest> for RequestLoggerService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    B: MessageBody + 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    fn poll_ready(&self, ctx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.service.poll_ready(ctx)
    }

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let service = Rc::clone(&self.service);

        Box::pin(async move {
            // Login outcomes are logged by the login handler itself.
            if !req.path().starts_with(ADMIN_PREFIX) || req.path().starts_with(LOGIN_PATH) {
                return service.call(req).await;
            }

            let state = req.app_data::<web::Data<AppState>>().cloned();
            let meta = RequestMeta {
                method: req.method().to_string(),
                path: req.path().to_string(),
                ip: service_client_ip(&req, state.as_ref().is_some_and(|s| s.trust_x_forwarded_for)),
                user_agent: user_agent(req.request()),
                status: None,
            };

            let res = service.call(req).await?;
            let status = res.status();

            if let (Some(state), Some(level)) = (state, level_for(status.as_u16())) {
                let mut entry = LogEntry::new(
                    level,
                    LogCategory::Request,
                    format!("{} {} -> {}", meta.method, meta.path, status.as_u16()),
                )
                .with_request(RequestMeta {
                    status: Some(status.as_u16()),
                    ..meta
                });
                if let Some(claims) = res.request().extensions().get::<Claims>() {
                    entry = entry.with_user(claims.username.clone());
                }
                state.log_sink.record(entry);
            }
            Ok(res)
        })
    }
}

fn level_for(status: u16) -> Option<LogLevel> {
    match status {
        500.. => Some(LogLevel::Error),
        400..=499 => Some(LogLevel::Warn),
        _ => None,
    }
}
