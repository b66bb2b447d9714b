use std::sync::Arc;

use validator::Validate;

use crate::auth::jwt::JwtService;
use crate::auth::password::{hash_password, verify_password};
use crate::entities::admin::{normalize_username, Admin, AdminResponse, ChangePasswordRequest, LoginRequest};
use crate::entities::token::{Claims, SessionResponse};
use crate::errors::{AppError, AuthError};
use crate::limiter::login_attempts::{LoginAttemptTracker, UNKNOWN_USER};
use crate::repositories::admin::AdminRepository;
use crate::utils::object_id::parse_object_id;

/// Outcome of a rejected login, kept apart so callers can log it precisely.
#[derive(Debug)]
pub enum LoginFailure {
    Invalid(AppError),
    Locked { retry_after: u64 },
    WrongCredentials { locked_now: bool },
    Internal(AppError),
}

impl From<LoginFailure> for AppError {
    fn from(failure: LoginFailure) -> Self {
        match failure {
            LoginFailure::Invalid(err) | LoginFailure::Internal(err) => err,
            LoginFailure::Locked { retry_after } => AuthError::AccountLocked(retry_after).into(),
            LoginFailure::WrongCredentials { .. } => AuthError::WrongCredentials.into(),
        }
    }
}

pub struct AuthHandler {
    pub admin_repo: Arc<dyn AdminRepository>,
    pub token_service: JwtService,
    pub attempts: LoginAttemptTracker,
}

impl AuthHandler {
    pub fn new(admin_repo: Arc<dyn AdminRepository>, token_service: JwtService, attempts: LoginAttemptTracker) -> Self {
        AuthHandler {
            admin_repo,
            token_service,
            attempts,
        }
    }

    /// Verifies credentials for a (username, client IP) pair, enforcing the lockout.
    /// Unknown usernames share one bucket per client IP.
    pub async fn login(&self, request: LoginRequest, client_ip: &str) -> Result<SessionResponse, LoginFailure> {
        request.validate().map_err(|e| LoginFailure::Invalid(e.into()))?;
        let username = normalize_username(&request.username);

        let admin = self
            .admin_repo
            .get_admin_by_username(&username)
            .await
            .map_err(LoginFailure::Internal)?;

        let bucket = if admin.is_some() { username.as_str() } else { UNKNOWN_USER };
        let permit = self
            .attempts
            .begin(bucket, client_ip)
            .map_err(|retry_after| LoginFailure::Locked { retry_after })?;

        let verified = match &admin {
            Some(admin) => verify_password(&request.password, &admin.password_hash).unwrap_or_else(|e| {
                tracing::error!(username = %admin.username, "Stored password hash unusable: {}", e);
                false
            }),
            None => false,
        };

        let admin = match admin {
            Some(admin) if verified => admin,
            _ => {
                let locked_now = permit.fail().is_some();
                return Err(LoginFailure::WrongCredentials { locked_now });
            }
        };

        permit.succeed();
        if let Err(e) = self.admin_repo.record_login(&admin.id).await {
            tracing::warn!("Failed to record last login: {}", e);
        }

        let token = self
            .token_service
            .create_jwt(&admin)
            .map_err(|e| LoginFailure::Internal(e.into()))?;

        tracing::info!(username = %admin.username, "Admin logged in");
        Ok(SessionResponse::new(token, self.token_service.expires_in(), AdminResponse::from(admin)))
    }

    pub fn decode_session(&self, token: &str) -> Result<Claims, AuthError> {
        Ok(self.token_service.decode_jwt(token)?.claims)
    }

    /// Current admin for a valid session; a deleted admin invalidates the session.
    pub async fn session(&self, claims: &Claims) -> Result<AdminResponse, AppError> {
        let admin = self.load_admin(claims).await?;
        Ok(AdminResponse::from(admin))
    }

    pub async fn change_password(&self, claims: &Claims, request: ChangePasswordRequest) -> Result<(), AppError> {
        request.validate()?;
        let admin = self.load_admin(claims).await?;

        let matches = verify_password(&request.current_password, &admin.password_hash)?;
        if !matches {
            return Err(AppError::validation("current_password", "Current password is incorrect"));
        }
        if request.current_password == request.new_password {
            return Err(AppError::validation(
                "new_password",
                "New password must differ from the current password",
            ));
        }

        let new_hash = hash_password(&request.new_password)?;
        self.admin_repo.update_password(&admin.id, &new_hash).await?;

        tracing::info!(username = %admin.username, "Admin password changed");
        Ok(())
    }

    /// Creates the first admin when none exists. Returns whether one was created.
    pub async fn bootstrap_admin(&self, username: &str, password: &str) -> Result<bool, AppError> {
        if self.admin_repo.count_admins().await? > 0 {
            return Ok(false);
        }
        let password_hash = hash_password(password)?;
        let admin = Admin::new(username, password_hash);
        self.admin_repo.create_admin(&admin).await?;

        tracing::info!(username = %admin.username, "Bootstrapped initial admin account");
        Ok(true)
    }

    async fn load_admin(&self, claims: &Claims) -> Result<Admin, AppError> {
        let id = parse_object_id(&claims.sub).map_err(|_| AppError::from(AuthError::InvalidToken))?;
        self.admin_repo
            .get_admin_by_id(&id)
            .await?
            .ok_or_else(|| AuthError::InvalidToken.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repositories::admin::MockAdminRepository;
    use crate::settings::tests::sample_config;
    use std::time::Duration;

    const PASSWORD: &str = "Sup3r-Secret-Passw0rd!";

    fn stored_admin() -> Admin {
        Admin::new("owner", hash_password(PASSWORD).unwrap())
    }

    fn handler(repo: MockAdminRepository, max_failures: u32) -> AuthHandler {
        AuthHandler::new(
            Arc::new(repo),
            JwtService::new(&sample_config()),
            LoginAttemptTracker::new(max_failures, Duration::from_secs(60)),
        )
    }

    fn login(password: &str) -> LoginRequest {
        LoginRequest {
            username: " Owner ".into(),
            password: password.into(),
        }
    }

    #[tokio::test]
    async fn successful_login_issues_token_for_normalized_username() {
        let admin = stored_admin();
        let mut repo = MockAdminRepository::new();
        let found = admin.clone();
        repo.expect_get_admin_by_username()
            .times(1)
            .returning(move |_| Ok(Some(found.clone())));
        repo.expect_record_login().returning(|_| Ok(()));

        let auth = handler(repo, 5);
        let session = auth.login(login(PASSWORD), "10.0.0.1").await.unwrap();

        assert_eq!(session.token_type, "Bearer");
        assert_eq!(session.admin.username, "owner");
        let claims = auth.decode_session(&session.access_token).unwrap();
        assert_eq!(claims.sub, admin.id.to_hex());
    }

    #[tokio::test]
    async fn repeated_failures_lock_the_pair() {
        let admin = stored_admin();
        let mut repo = MockAdminRepository::new();
        repo.expect_get_admin_by_username()
            .returning(move |_| Ok(Some(admin.clone())));

        let auth = handler(repo, 2);
        assert!(matches!(
            auth.login(login("wrong"), "10.0.0.1").await,
            Err(LoginFailure::WrongCredentials { locked_now: false })
        ));
        assert!(matches!(
            auth.login(login("wrong"), "10.0.0.1").await,
            Err(LoginFailure::WrongCredentials { locked_now: true })
        ));

        let locked = auth.login(login(PASSWORD), "10.0.0.1").await.unwrap_err();
        assert!(matches!(locked, LoginFailure::Locked { .. }));
        assert!(matches!(AppError::from(locked), AppError::RateLimited { .. }));
    }

    #[tokio::test]
    async fn unknown_user_counts_as_a_failure() {
        let mut repo = MockAdminRepository::new();
        repo.expect_get_admin_by_username().returning(|_| Ok(None));

        let auth = handler(repo, 1);
        let result = auth.login(login(PASSWORD), "10.0.0.1").await;
        assert!(matches!(result, Err(LoginFailure::WrongCredentials { locked_now: true })));
    }

    #[tokio::test]
    async fn change_password_rejects_wrong_current_password() {
        let admin = stored_admin();
        let claims = Claims {
            sub: admin.id.to_hex(),
            username: admin.username.clone(),
            exp: 0,
            iat: 0,
        };
        let mut repo = MockAdminRepository::new();
        repo.expect_get_admin_by_id().returning(move |_| Ok(Some(admin.clone())));
        repo.expect_update_password().never();

        let auth = handler(repo, 5);
        let err = auth
            .change_password(
                &claims,
                ChangePasswordRequest {
                    current_password: "not-it".into(),
                    new_password: "N3w-Sturdy-Passphrase!".into(),
                },
            )
            .await
            .unwrap_err();

        match err {
            AppError::ValidationError(fields) => assert_eq!(fields[0].field, "current_password"),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn bootstrap_is_skipped_when_an_admin_exists() {
        let mut repo = MockAdminRepository::new();
        repo.expect_count_admins().returning(|| Ok(1));
        repo.expect_create_admin().never();

        let auth = handler(repo, 5);
        assert!(!auth.bootstrap_admin("owner", PASSWORD).await.unwrap());
    }
}
