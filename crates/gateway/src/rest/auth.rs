//! Authentication REST endpoints

use std::sync::Arc;

use axum::{
    extract::{Query, State},
    http::StatusCode,
    Extension, Json,
};
use rental_users::{LoginForm, RegisterForm};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use super::models::UserResponse;
use super::parse_choice;
use crate::error::{GatewayError, GatewayResult};
use crate::middleware::CurrentUser;
use crate::state::GatewayState;

#[derive(Debug, Deserialize, ToSchema)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct LoginResponse {
    pub token: String,
    pub token_type: String,
    pub expires_in: u64,
    pub user: UserResponse,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct RegisterRequest {
    pub email: String,
    pub phone: String,
    /// `OWNER`, `INVESTOR`, `TENANT`, `COMPANY` or `GOVERNMENT`
    #[serde(default)]
    pub user_type: Option<String>,
    pub company_name: String,
    pub commercial_registration: String,
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub last_name: Option<String>,
    /// `OM`, `GCC` or `INT`
    #[serde(default)]
    pub company_type: Option<String>,
    /// `ar` or `en`
    #[serde(default)]
    pub preferred_language: Option<String>,
    pub password1: String,
    pub password2: String,
}

impl RegisterRequest {
    fn into_form(self) -> GatewayResult<RegisterForm> {
        Ok(RegisterForm {
            email: self.email,
            phone: self.phone,
            user_type: parse_choice("user_type", self.user_type.as_deref())?.unwrap_or_default(),
            company_name: self.company_name,
            commercial_registration: self.commercial_registration,
            first_name: self.first_name,
            last_name: self.last_name,
            company_type: parse_choice("company_type", self.company_type.as_deref())?,
            preferred_language: parse_choice(
                "preferred_language",
                self.preferred_language.as_deref(),
            )?
            .unwrap_or_default(),
            password1: self.password1,
            password2: self.password2,
        })
    }
}

#[derive(Debug, Deserialize, IntoParams)]
pub struct VerifyQuery {
    pub token: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct VerifyResponse {
    pub message: String,
    pub user: UserResponse,
}

#[utoipa::path(
    post,
    path = "/api/auth/login",
    tag = "Auth",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Bearer token issued", body = LoginResponse),
        (status = 401, description = "Invalid email or password", body = crate::error::ErrorResponse),
        (status = 403, description = "Account is inactive", body = crate::error::ErrorResponse)
    )
)]
pub async fn login(
    State(state): State<Arc<GatewayState>>,
    Json(payload): Json<LoginRequest>,
) -> GatewayResult<Json<LoginResponse>> {
    let outcome = state
        .auth_service()
        .login(LoginForm {
            email: payload.email,
            password: payload.password,
        })
        .await?;

    Ok(Json(LoginResponse {
        token: outcome.token,
        token_type: "Bearer".to_string(),
        expires_in: outcome.expires_in,
        user: outcome.user.into(),
    }))
}

#[utoipa::path(
    post,
    path = "/api/auth/register",
    tag = "Auth",
    request_body = RegisterRequest,
    responses(
        (status = 201, description = "Account created", body = UserResponse),
        (status = 400, description = "Invalid registration payload", body = crate::error::ErrorResponse),
        (status = 409, description = "Email, phone or registration number already in use", body = crate::error::ErrorResponse),
        (status = 502, description = "Account email could not be delivered", body = crate::error::ErrorResponse)
    )
)]
pub async fn register(
    State(state): State<Arc<GatewayState>>,
    Json(payload): Json<RegisterRequest>,
) -> GatewayResult<(StatusCode, Json<UserResponse>)> {
    let form = payload.into_form()?;
    let user = state.user_service().register(form).await?;
    Ok((StatusCode::CREATED, Json(user.into())))
}

#[utoipa::path(
    get,
    path = "/api/auth/verify",
    tag = "Auth",
    params(VerifyQuery),
    responses(
        (status = 200, description = "Email address verified", body = VerifyResponse),
        (status = 400, description = "Unknown verification token", body = crate::error::ErrorResponse)
    )
)]
pub async fn verify_email(
    State(state): State<Arc<GatewayState>>,
    Query(query): Query<VerifyQuery>,
) -> GatewayResult<Json<VerifyResponse>> {
    if query.token.trim().is_empty() {
        return Err(GatewayError::InvalidRequest(
            "token: a verification token is required".to_string(),
        ));
    }

    let user = state.user_service().verify_email(&query.token).await?;
    Ok(Json(VerifyResponse {
        message: "Email address verified".to_string(),
        user: user.into(),
    }))
}

#[utoipa::path(
    get,
    path = "/api/auth/me",
    tag = "Auth",
    security(("bearerAuth" = [])),
    responses(
        (status = 200, description = "Current user information", body = UserResponse),
        (status = 401, description = "Invalid token", body = crate::error::ErrorResponse)
    )
)]
pub async fn me(Extension(current): Extension<CurrentUser>) -> Json<UserResponse> {
    Json(current.0.into())
}
