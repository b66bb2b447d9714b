use serde::{Serialize, Deserialize};

use crate::entities::admin::AdminResponse;

#[derive(Debug, Serialize)]
pub struct SessionResponse {
    pub access_token: String,
    pub token_type: String,
    pub expires_in: i64,
    pub admin: AdminResponse,
}

impl SessionResponse {
    pub fn new(access_token: String, expires_in: i64, admin: AdminResponse) -> Self {
        SessionResponse {
            access_token,
            token_type: "Bearer".to_string(),
            expires_in,
            admin,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Claims {
    pub sub: String,
    pub username: String,
    pub exp: usize,
    pub iat: usize,
}
