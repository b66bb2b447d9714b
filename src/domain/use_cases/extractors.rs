use actix_web::{FromRequest, HttpMessage, HttpRequest};
use bson::oid::ObjectId;
use futures_util::future::{ready, Ready};

use crate::{entities::token::Claims, errors::AuthError};

/// Claims of the authenticated admin, placed in request extensions by the auth middleware.
/// Handlers taking this parameter answer 401 when no session is present.
#[derive(Debug, Clone)]
pub struct AdminClaims(pub Claims);

impl AdminClaims {
    pub fn admin_id(&self) -> Option<ObjectId> {
        ObjectId::parse_str(&self.0.sub).ok()
    }

    pub fn username(&self) -> &str {
        &self.0.username
    }
}

impl FromRequest for AdminClaims {
    type Error = actix_web::Error;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut actix_web::dev::Payload) -> Self::Future {
        match req.extensions().get::<Claims>() {
            Some(claims) => ready(Ok(AdminClaims(claims.clone()))),
            None => ready(Err(AuthError::MissingCredentials.into())),
        }
    }
}
