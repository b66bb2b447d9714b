use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, Header, TokenData, Validation};

use crate::entities::{admin::Admin, token::Claims};
use crate::errors::AuthError;
use crate::settings::{AppConfig, SessionKeys};

const JWT_ALGORITHM: Algorithm = Algorithm::HS512;

#[derive(Clone)]
pub struct JwtService {
    keys: SessionKeys,
    session_expiration: Duration,
}

impl JwtService {
    pub fn new(config: &AppConfig) -> Self {
        JwtService {
            keys: SessionKeys::from(config),
            session_expiration: Duration::minutes(config.session_expiration_minutes),
        }
    }

    /// Session lifetime in seconds.
    pub fn expires_in(&self) -> i64 {
        self.session_expiration.num_seconds()
    }

    pub fn create_jwt(&self, admin: &Admin) -> Result<String, AuthError> {
        let now = Utc::now();
        let exp = (now + self.session_expiration).timestamp() as usize;

        let claims = Claims {
            sub: admin.id.to_hex(),
            username: admin.username.clone(),
            exp,
            iat: now.timestamp() as usize,
        };

        encode(&Header::new(JWT_ALGORITHM), &claims, &self.keys.encoding).map_err(|e| {
            tracing::warn!("Failed to sign session token: {}", e);
            AuthError::TokenCreation
        })
    }

    pub fn decode_jwt(&self, token: &str) -> Result<TokenData<Claims>, AuthError> {
        let mut validation = Validation::new(JWT_ALGORITHM);
        validation.validate_exp = true;
        validation.leeway = 0;

        decode::<Claims>(token, &self.keys.decoding, &validation).map_err(AuthError::from)
    }
}
