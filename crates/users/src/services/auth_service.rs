//! Authentication service for login and bearer tokens.

use std::sync::Arc;

use rental_database::{User, UserError};
use tracing::{info, warn};

use super::profile_service::ProfileRepo;
use super::user_service::{UserRepo, UserService};
use crate::forms::LoginForm;
use crate::types::{AccountError, AccountResult, LoginOutcome};
use crate::utils::jwt::JwtManager;
use crate::utils::password::verify_password;

/// Service for managing authentication operations
pub struct AuthService<R, P> {
    users: Arc<UserService<R, P>>,
    jwt: JwtManager,
}

impl<R, P> AuthService<R, P>
where
    R: UserRepo,
    P: ProfileRepo,
{
    pub fn new(users: Arc<UserService<R, P>>, jwt: JwtManager) -> Self {
        Self { users, jwt }
    }

    pub fn jwt(&self) -> &JwtManager {
        &self.jwt
    }

    /// Login user with email and password
    pub async fn login(&self, form: LoginForm) -> AccountResult<LoginOutcome> {
        let user = self
            .users
            .get_user_by_email(&form.email)
            .await?
            .ok_or(AccountError::InvalidCredentials)?;

        let password_ok = user
            .password_hash
            .as_deref()
            .is_some_and(|hash| verify_password(&form.password, hash));
        if !password_ok {
            warn!(user_id = user.id, "failed login attempt");
            return Err(AccountError::InvalidCredentials);
        }

        if !user.is_active {
            return Err(AccountError::AccountInactive);
        }

        self.users.record_login(user.id).await?;
        let token = self.jwt.generate_token(&user)?;
        let user = self.users.get_user(user.id).await?;

        info!(user_id = user.id, "user logged in");
        Ok(LoginOutcome {
            token,
            expires_in: self.jwt.token_duration().as_secs(),
            user,
        })
    }

    /// Resolve a bearer token to an active account.
    pub async fn authenticate(&self, token: &str) -> AccountResult<User> {
        let claims = self.jwt.validate_token(token)?;

        let user = match self.users.get_user_by_public_id(&claims.sub).await {
            Ok(user) => user,
            Err(AccountError::Store(UserError::UserNotFound)) => {
                return Err(AccountError::InvalidToken("unknown subject".to_string()))
            }
            Err(err) => return Err(err),
        };

        if !user.is_active {
            return Err(AccountError::AccountInactive);
        }
        Ok(user)
    }

    /// Like [`authenticate`](Self::authenticate) but the account must be staff.
    pub async fn authenticate_staff(&self, token: &str) -> AccountResult<User> {
        let user = self.authenticate(token).await?;
        if !user.is_staff {
            return Err(AccountError::StaffRequired);
        }
        Ok(user)
    }
}

impl<R, P> Clone for AuthService<R, P> {
    fn clone(&self) -> Self {
        Self {
            users: Arc::clone(&self.users),
            jwt: self.jwt.clone(),
        }
    }
}
