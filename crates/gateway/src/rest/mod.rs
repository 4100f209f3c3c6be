//! REST API endpoints for the gateway

pub mod admin;
pub mod auth;
pub mod health;
pub mod models;

use std::str::FromStr;
use std::sync::Arc;

use axum::{
    middleware,
    routing::{get, post, put},
    Router,
};

use crate::error::{GatewayError, GatewayResult};
use crate::middleware::{auth_middleware, staff_middleware};
use crate::state::GatewayState;

/// Create all REST API routes
pub fn create_rest_routes(state: Arc<GatewayState>) -> Router<Arc<GatewayState>> {
    let public = Router::new()
        .route("/health", get(health::health_check))
        .route("/api/auth/login", post(auth::login))
        .route("/api/auth/register", post(auth::register))
        .route("/api/auth/verify", get(auth::verify_email));

    let authenticated = Router::new()
        .route("/api/auth/me", get(auth::me))
        .route_layer(middleware::from_fn_with_state(state.clone(), auth_middleware));

    let admin = Router::new()
        .route("/api/admin/users", get(admin::list_users).post(admin::create_user))
        .route(
            "/api/admin/users/actions/verify",
            post(admin::verify_users),
        )
        .route(
            "/api/admin/users/actions/deactivate",
            post(admin::deactivate_users),
        )
        .route(
            "/api/admin/users/actions/activate",
            post(admin::activate_users),
        )
        .route(
            "/api/admin/users/actions/export",
            post(admin::export_users),
        )
        .route(
            "/api/admin/users/:public_id",
            get(admin::get_user).patch(admin::update_user),
        )
        .route(
            "/api/admin/users/:public_id/reset-password",
            post(admin::reset_password),
        )
        .route("/api/admin/users/:public_id/owner", put(admin::upsert_owner))
        .route(
            "/api/admin/users/:public_id/investor",
            put(admin::upsert_investor),
        )
        .route("/api/admin/users/:public_id/tenant", put(admin::upsert_tenant))
        .route(
            "/api/admin/users/:public_id/profile",
            put(admin::upsert_user_profile),
        )
        .route(
            "/api/admin/users/:public_id/profiles",
            get(admin::get_profiles),
        )
        .route("/api/admin/filters", get(admin::filters))
        .route_layer(middleware::from_fn(staff_middleware))
        .route_layer(middleware::from_fn_with_state(state, auth_middleware));

    Router::new().merge(public).merge(authenticated).merge(admin)
}

/// Parse an optional choice field, naming the field on failure.
pub(crate) fn parse_choice<T>(field: &str, value: Option<&str>) -> GatewayResult<Option<T>>
where
    T: FromStr<Err = String>,
{
    match value.map(str::trim).filter(|v| !v.is_empty()) {
        None => Ok(None),
        Some(raw) => raw
            .parse::<T>()
            .map(Some)
            .map_err(|e| GatewayError::InvalidRequest(format!("{field}: {e}"))),
    }
}
