//! Shared application state for the gateway

use std::sync::Arc;

use rental_config::AppConfig;
use rental_database::SqlitePool;
use rental_users::{JwtManager, NotificationService, SqliteAuthService, SqliteUserService, UserService};

/// Shared application state containing all services
#[derive(Clone)]
pub struct GatewayState {
    /// Account manager, admin actions and profiles
    pub users: Arc<SqliteUserService>,
    /// Login and bearer token resolution
    pub auth: SqliteAuthService,
}

impl GatewayState {
    pub fn new(pool: SqlitePool, notifications: NotificationService, jwt: JwtManager) -> Self {
        let users = Arc::new(UserService::new(pool, notifications));
        let auth = SqliteAuthService::new(users.clone(), jwt);
        Self { users, auth }
    }

    pub fn from_config(
        config: &AppConfig,
        pool: SqlitePool,
        notifications: NotificationService,
    ) -> Self {
        Self::new(pool, notifications, JwtManager::from_config(&config.auth))
    }

    pub fn user_service(&self) -> &SqliteUserService {
        &self.users
    }

    pub fn auth_service(&self) -> &SqliteAuthService {
        &self.auth
    }
}
