//! Staff-only account administration endpoints

use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Extension, Json,
};
use chrono::NaiveDate;
use rental_users::{
    AdminCreateUserForm, FilterLookups, InvestorForm, OwnerForm, PageRequest, TenantForm,
    UserChangeForm, UserFilter, UserProfileData,
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::info;
use utoipa::{IntoParams, ToSchema};

use super::models::{
    BulkActionResponse, ExportRowResponse, InvestorResponse, MessageResponse, OwnerResponse,
    ProfilesResponse, TenantResponse, UserProfileResponse, UserResponse, UsersResponse,
};
use super::parse_choice;
use crate::error::{GatewayError, GatewayResult};
use crate::middleware::CurrentUser;
use crate::state::GatewayState;

#[derive(Debug, Default, Deserialize, IntoParams)]
pub struct ListUsersQuery {
    pub user_type: Option<String>,
    pub company_type: Option<String>,
    pub is_verified: Option<bool>,
    pub is_active: Option<bool>,
    pub is_staff: Option<bool>,
    /// Substring of email, phone, names, company name or registration number
    pub search: Option<String>,
    pub limit: Option<u32>,
    pub offset: Option<u32>,
}

impl ListUsersQuery {
    fn into_parts(self) -> GatewayResult<(UserFilter, PageRequest)> {
        let filter = UserFilter {
            user_type: parse_choice("user_type", self.user_type.as_deref())?,
            company_type: parse_choice("company_type", self.company_type.as_deref())?,
            is_verified: self.is_verified,
            is_active: self.is_active,
            is_staff: self.is_staff,
            search: self.search.filter(|s| !s.trim().is_empty()),
        };
        let defaults = PageRequest::default();
        let page = PageRequest::new(
            self.limit.unwrap_or(defaults.limit),
            self.offset.unwrap_or(defaults.offset),
        );
        Ok((filter, page))
    }
}

#[derive(Debug, Default, Deserialize, ToSchema)]
#[serde(default)]
pub struct CreateUserRequest {
    pub email: String,
    pub company_name: String,
    pub commercial_registration: String,
    pub user_type: Option<String>,
    pub phone: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub company_type: Option<String>,
    pub password1: Option<String>,
    pub password2: Option<String>,
    pub is_verified: bool,
    pub is_active: Option<bool>,
    pub is_staff: Option<bool>,
}

impl CreateUserRequest {
    fn into_form(self) -> GatewayResult<AdminCreateUserForm> {
        Ok(AdminCreateUserForm {
            email: self.email,
            company_name: self.company_name,
            commercial_registration: self.commercial_registration,
            user_type: parse_choice("user_type", self.user_type.as_deref())?.unwrap_or_default(),
            phone: self.phone,
            first_name: self.first_name,
            last_name: self.last_name,
            company_type: parse_choice("company_type", self.company_type.as_deref())?,
            password1: self.password1,
            password2: self.password2,
            is_verified: self.is_verified,
            is_active: self.is_active,
            is_staff: self.is_staff,
        })
    }
}

/// Partial update. A blank string clears an optional text field.
#[derive(Debug, Default, Deserialize, ToSchema)]
#[serde(default)]
pub struct UpdateUserRequest {
    pub email: Option<String>,
    pub phone: Option<String>,
    pub whatsapp: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub id_number: Option<String>,
    pub user_type: Option<String>,
    pub company_name: Option<String>,
    pub company_name_english: Option<String>,
    pub company_type: Option<String>,
    pub commercial_registration: Option<String>,
    pub company_license: Option<String>,
    pub tax_number: Option<String>,
    #[schema(value_type = Option<String>, format = Date)]
    pub establishment_date: Option<NaiveDate>,
    pub country: Option<String>,
    pub city: Option<String>,
    pub address: Option<String>,
    pub postal_code: Option<String>,
    pub website: Option<String>,
    pub preferred_language: Option<String>,
    pub is_verified: Option<bool>,
    pub is_active: Option<bool>,
    pub is_staff: Option<bool>,
}

impl UpdateUserRequest {
    fn into_form(self) -> GatewayResult<UserChangeForm> {
        Ok(UserChangeForm {
            email: self.email,
            phone: self.phone,
            whatsapp: self.whatsapp,
            first_name: self.first_name,
            last_name: self.last_name,
            id_number: self.id_number,
            user_type: parse_choice("user_type", self.user_type.as_deref())?,
            company_name: self.company_name,
            company_name_english: self.company_name_english,
            company_type: parse_choice("company_type", self.company_type.as_deref())?,
            commercial_registration: self.commercial_registration,
            company_license: self.company_license,
            tax_number: self.tax_number,
            establishment_date: self.establishment_date,
            country: self.country,
            city: self.city,
            address: self.address,
            postal_code: self.postal_code,
            website: self.website,
            preferred_language: parse_choice(
                "preferred_language",
                self.preferred_language.as_deref(),
            )?,
            is_verified: self.is_verified,
            is_active: self.is_active,
            is_staff: self.is_staff,
        })
    }
}

#[derive(Debug, Default, Deserialize, ToSchema)]
#[serde(default)]
pub struct OwnerRequest {
    #[schema(value_type = Option<String>, example = "100.00")]
    pub ownership_percentage: Option<Decimal>,
    pub bank_name: Option<String>,
    pub iban_number: Option<String>,
    /// `BANK`, `CHEQUE` or `CASH`
    pub preferred_payment_method: Option<String>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct InvestorRequest {
    #[serde(default)]
    #[schema(value_type = Option<String>)]
    pub investment_amount: Option<Decimal>,
    #[serde(default)]
    #[schema(value_type = Option<String>)]
    pub investment_percentage: Option<Decimal>,
    #[schema(value_type = String, format = Date)]
    pub investment_date: NaiveDate,
    #[serde(default)]
    pub contract_duration_years: Option<u32>,
    #[serde(default)]
    #[schema(value_type = Option<Object>)]
    pub bank_details: Option<serde_json::Value>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct TenantRequest {
    pub company_activity: String,
    pub authorized_person: String,
    pub authorized_person_id: String,
    #[serde(default)]
    pub emergency_contact: Option<String>,
    #[serde(default)]
    pub insurance_policy: Option<String>,
    #[serde(default)]
    #[schema(value_type = Option<String>, format = Date)]
    pub insurance_expiry: Option<NaiveDate>,
}

#[derive(Debug, Default, Deserialize, ToSchema)]
#[serde(default)]
pub struct UserProfileRequest {
    pub avatar_url: Option<String>,
    pub nationality: Option<String>,
    pub address: Option<String>,
    pub emergency_contact: Option<String>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct BulkActionRequest {
    /// Public ids of the selected accounts
    pub user_ids: Vec<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct FilterOptionResponse {
    pub value: String,
    pub label: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct FiltersResponse {
    pub user_type: Vec<FilterOptionResponse>,
    pub company_type: Vec<FilterOptionResponse>,
}

impl From<FilterLookups> for FiltersResponse {
    fn from(lookups: FilterLookups) -> Self {
        let convert = |options: Vec<rental_users::FilterOption>| {
            options
                .into_iter()
                .map(|o| FilterOptionResponse {
                    value: o.value.to_string(),
                    label: o.label.to_string(),
                })
                .collect()
        };
        Self {
            user_type: convert(lookups.user_type),
            company_type: convert(lookups.company_type),
        }
    }
}

async fn resolve_id(state: &GatewayState, public_id: &str) -> GatewayResult<i64> {
    Ok(state.user_service().get_user_by_public_id(public_id).await?.id)
}

async fn resolve_selection(state: &GatewayState, request: &BulkActionRequest) -> GatewayResult<Vec<i64>> {
    if request.user_ids.is_empty() {
        return Err(GatewayError::InvalidRequest(
            "user_ids: select at least one user".to_string(),
        ));
    }
    Ok(state.user_service().ids_for_public_ids(&request.user_ids).await?)
}

#[utoipa::path(
    get,
    path = "/api/admin/users",
    tag = "Admin",
    security(("bearerAuth" = [])),
    params(ListUsersQuery),
    responses(
        (status = 200, description = "Filtered page of accounts", body = UsersResponse),
        (status = 400, description = "Unknown filter value", body = crate::error::ErrorResponse),
        (status = 403, description = "Staff access required", body = crate::error::ErrorResponse)
    )
)]
pub async fn list_users(
    State(state): State<Arc<GatewayState>>,
    Query(query): Query<ListUsersQuery>,
) -> GatewayResult<Json<UsersResponse>> {
    let (filter, page) = query.into_parts()?;
    let page = state.user_service().list_users(&filter, page).await?;
    Ok(Json(page.into()))
}

#[utoipa::path(
    post,
    path = "/api/admin/users",
    tag = "Admin",
    security(("bearerAuth" = [])),
    request_body = CreateUserRequest,
    responses(
        (status = 201, description = "Account created", body = UserResponse),
        (status = 400, description = "Invalid account payload", body = crate::error::ErrorResponse),
        (status = 409, description = "Uniqueness violation", body = crate::error::ErrorResponse)
    )
)]
pub async fn create_user(
    State(state): State<Arc<GatewayState>>,
    Extension(current): Extension<CurrentUser>,
    Json(payload): Json<CreateUserRequest>,
) -> GatewayResult<(StatusCode, Json<UserResponse>)> {
    let user = state
        .user_service()
        .admin_create_user(payload.into_form()?)
        .await?;
    info!(operator = current.0.id, user_id = user.id, "account created by operator");
    Ok((StatusCode::CREATED, Json(user.into())))
}

#[utoipa::path(
    get,
    path = "/api/admin/users/{public_id}",
    tag = "Admin",
    security(("bearerAuth" = [])),
    params(("public_id" = String, Path, description = "User public ID")),
    responses(
        (status = 200, description = "Account details", body = UserResponse),
        (status = 404, description = "User not found", body = crate::error::ErrorResponse)
    )
)]
pub async fn get_user(
    State(state): State<Arc<GatewayState>>,
    Path(public_id): Path<String>,
) -> GatewayResult<Json<UserResponse>> {
    let user = state.user_service().get_user_by_public_id(&public_id).await?;
    Ok(Json(user.into()))
}

#[utoipa::path(
    patch,
    path = "/api/admin/users/{public_id}",
    tag = "Admin",
    security(("bearerAuth" = [])),
    params(("public_id" = String, Path, description = "User public ID")),
    request_body = UpdateUserRequest,
    responses(
        (status = 200, description = "Updated account", body = UserResponse),
        (status = 400, description = "Invalid change", body = crate::error::ErrorResponse),
        (status = 404, description = "User not found", body = crate::error::ErrorResponse),
        (status = 409, description = "Uniqueness violation", body = crate::error::ErrorResponse)
    )
)]
pub async fn update_user(
    State(state): State<Arc<GatewayState>>,
    Path(public_id): Path<String>,
    Json(payload): Json<UpdateUserRequest>,
) -> GatewayResult<Json<UserResponse>> {
    let form = payload.into_form()?;
    let user_id = resolve_id(&state, &public_id).await?;
    let user = state.user_service().update_user(user_id, form).await?;
    Ok(Json(user.into()))
}

#[utoipa::path(
    post,
    path = "/api/admin/users/{public_id}/reset-password",
    tag = "Admin",
    security(("bearerAuth" = [])),
    params(("public_id" = String, Path, description = "User public ID")),
    responses(
        (status = 200, description = "Temporary password emailed", body = MessageResponse),
        (status = 404, description = "User not found", body = crate::error::ErrorResponse),
        (status = 502, description = "Email could not be delivered", body = crate::error::ErrorResponse)
    )
)]
pub async fn reset_password(
    State(state): State<Arc<GatewayState>>,
    Path(public_id): Path<String>,
) -> GatewayResult<Json<MessageResponse>> {
    let user_id = resolve_id(&state, &public_id).await?;
    state.user_service().reset_password(user_id).await?;
    Ok(Json(MessageResponse {
        message: "A temporary password has been emailed to the user".to_string(),
    }))
}

#[utoipa::path(
    put,
    path = "/api/admin/users/{public_id}/owner",
    tag = "Admin",
    security(("bearerAuth" = [])),
    params(("public_id" = String, Path, description = "User public ID")),
    request_body = OwnerRequest,
    responses(
        (status = 200, description = "Owner profile saved", body = OwnerResponse),
        (status = 400, description = "Invalid profile or role mismatch", body = crate::error::ErrorResponse),
        (status = 404, description = "User not found", body = crate::error::ErrorResponse)
    )
)]
pub async fn upsert_owner(
    State(state): State<Arc<GatewayState>>,
    Path(public_id): Path<String>,
    Json(payload): Json<OwnerRequest>,
) -> GatewayResult<Json<OwnerResponse>> {
    let form = OwnerForm {
        ownership_percentage: payload.ownership_percentage,
        bank_name: payload.bank_name,
        iban_number: payload.iban_number,
        preferred_payment_method: parse_choice(
            "preferred_payment_method",
            payload.preferred_payment_method.as_deref(),
        )?,
    };
    let user_id = resolve_id(&state, &public_id).await?;
    let owner = state.user_service().upsert_owner(user_id, form).await?;
    Ok(Json(owner.into()))
}

#[utoipa::path(
    put,
    path = "/api/admin/users/{public_id}/investor",
    tag = "Admin",
    security(("bearerAuth" = [])),
    params(("public_id" = String, Path, description = "User public ID")),
    request_body = InvestorRequest,
    responses(
        (status = 200, description = "Investor profile saved", body = InvestorResponse),
        (status = 400, description = "Invalid profile or role mismatch", body = crate::error::ErrorResponse),
        (status = 404, description = "User not found", body = crate::error::ErrorResponse)
    )
)]
pub async fn upsert_investor(
    State(state): State<Arc<GatewayState>>,
    Path(public_id): Path<String>,
    Json(payload): Json<InvestorRequest>,
) -> GatewayResult<Json<InvestorResponse>> {
    let form = InvestorForm {
        investment_amount: payload.investment_amount,
        investment_percentage: payload.investment_percentage,
        investment_date: payload.investment_date,
        contract_duration_years: payload.contract_duration_years,
        bank_details: payload.bank_details,
    };
    let user_id = resolve_id(&state, &public_id).await?;
    let investor = state.user_service().upsert_investor(user_id, form).await?;
    Ok(Json(investor.into()))
}

#[utoipa::path(
    put,
    path = "/api/admin/users/{public_id}/tenant",
    tag = "Admin",
    security(("bearerAuth" = [])),
    params(("public_id" = String, Path, description = "User public ID")),
    request_body = TenantRequest,
    responses(
        (status = 200, description = "Tenant profile saved", body = TenantResponse),
        (status = 400, description = "Invalid profile or role mismatch", body = crate::error::ErrorResponse),
        (status = 404, description = "User not found", body = crate::error::ErrorResponse)
    )
)]
pub async fn upsert_tenant(
    State(state): State<Arc<GatewayState>>,
    Path(public_id): Path<String>,
    Json(payload): Json<TenantRequest>,
) -> GatewayResult<Json<TenantResponse>> {
    let form = TenantForm {
        company_activity: payload.company_activity,
        authorized_person: payload.authorized_person,
        authorized_person_id: payload.authorized_person_id,
        emergency_contact: payload.emergency_contact,
        insurance_policy: payload.insurance_policy,
        insurance_expiry: payload.insurance_expiry,
    };
    let user_id = resolve_id(&state, &public_id).await?;
    let tenant = state.user_service().upsert_tenant(user_id, form).await?;
    Ok(Json(tenant.into()))
}

#[utoipa::path(
    put,
    path = "/api/admin/users/{public_id}/profile",
    tag = "Admin",
    security(("bearerAuth" = [])),
    params(("public_id" = String, Path, description = "User public ID")),
    request_body = UserProfileRequest,
    responses(
        (status = 200, description = "Profile saved", body = UserProfileResponse),
        (status = 400, description = "Invalid profile", body = crate::error::ErrorResponse),
        (status = 404, description = "User not found", body = crate::error::ErrorResponse)
    )
)]
pub async fn upsert_user_profile(
    State(state): State<Arc<GatewayState>>,
    Path(public_id): Path<String>,
    Json(payload): Json<UserProfileRequest>,
) -> GatewayResult<Json<UserProfileResponse>> {
    let data = UserProfileData {
        avatar_url: payload.avatar_url,
        nationality: payload.nationality,
        address: payload.address,
        emergency_contact: payload.emergency_contact,
    };
    let user_id = resolve_id(&state, &public_id).await?;
    let profile = state.user_service().upsert_user_profile(user_id, data).await?;
    Ok(Json(profile.into()))
}

#[utoipa::path(
    get,
    path = "/api/admin/users/{public_id}/profiles",
    tag = "Admin",
    security(("bearerAuth" = [])),
    params(("public_id" = String, Path, description = "User public ID")),
    responses(
        (status = 200, description = "Every profile attached to the account", body = ProfilesResponse),
        (status = 404, description = "User not found", body = crate::error::ErrorResponse)
    )
)]
pub async fn get_profiles(
    State(state): State<Arc<GatewayState>>,
    Path(public_id): Path<String>,
) -> GatewayResult<Json<ProfilesResponse>> {
    let user_id = resolve_id(&state, &public_id).await?;
    let profiles = state.user_service().get_profiles(user_id).await?;
    Ok(Json(profiles.into()))
}

#[utoipa::path(
    post,
    path = "/api/admin/users/actions/verify",
    tag = "Admin",
    security(("bearerAuth" = [])),
    request_body = BulkActionRequest,
    responses(
        (status = 200, description = "Selected accounts verified", body = BulkActionResponse),
        (status = 400, description = "Empty selection", body = crate::error::ErrorResponse)
    )
)]
pub async fn verify_users(
    State(state): State<Arc<GatewayState>>,
    Json(payload): Json<BulkActionRequest>,
) -> GatewayResult<Json<BulkActionResponse>> {
    let ids = resolve_selection(&state, &payload).await?;
    let result = state.user_service().verify_users(&ids).await?;
    Ok(Json(result.into()))
}

#[utoipa::path(
    post,
    path = "/api/admin/users/actions/deactivate",
    tag = "Admin",
    security(("bearerAuth" = [])),
    request_body = BulkActionRequest,
    responses(
        (status = 200, description = "Selected accounts deactivated", body = BulkActionResponse),
        (status = 400, description = "Empty selection", body = crate::error::ErrorResponse)
    )
)]
pub async fn deactivate_users(
    State(state): State<Arc<GatewayState>>,
    Json(payload): Json<BulkActionRequest>,
) -> GatewayResult<Json<BulkActionResponse>> {
    let ids = resolve_selection(&state, &payload).await?;
    let result = state.user_service().deactivate_users(&ids).await?;
    Ok(Json(result.into()))
}

#[utoipa::path(
    post,
    path = "/api/admin/users/actions/activate",
    tag = "Admin",
    security(("bearerAuth" = [])),
    request_body = BulkActionRequest,
    responses(
        (status = 200, description = "Selected accounts reactivated", body = BulkActionResponse),
        (status = 400, description = "Empty selection", body = crate::error::ErrorResponse)
    )
)]
pub async fn activate_users(
    State(state): State<Arc<GatewayState>>,
    Json(payload): Json<BulkActionRequest>,
) -> GatewayResult<Json<BulkActionResponse>> {
    let ids = resolve_selection(&state, &payload).await?;
    let result = state.user_service().activate_users(&ids).await?;
    Ok(Json(result.into()))
}

#[utoipa::path(
    post,
    path = "/api/admin/users/actions/export",
    tag = "Admin",
    security(("bearerAuth" = [])),
    request_body = BulkActionRequest,
    responses(
        (status = 200, description = "List-display rows of the selection", body = Vec<ExportRowResponse>),
        (status = 400, description = "Empty selection", body = crate::error::ErrorResponse)
    )
)]
pub async fn export_users(
    State(state): State<Arc<GatewayState>>,
    Json(payload): Json<BulkActionRequest>,
) -> GatewayResult<Json<Vec<ExportRowResponse>>> {
    let ids = resolve_selection(&state, &payload).await?;
    let rows = state.user_service().export_users(&ids).await?;
    Ok(Json(rows.into_iter().map(Into::into).collect()))
}

#[utoipa::path(
    get,
    path = "/api/admin/filters",
    tag = "Admin",
    security(("bearerAuth" = [])),
    responses(
        (status = 200, description = "Sidebar filter choices", body = FiltersResponse)
    )
)]
pub async fn filters(State(state): State<Arc<GatewayState>>) -> Json<FiltersResponse> {
    Json(state.user_service().filter_lookups().into())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rental_users::{CompanyType, UserType};

    #[test]
    fn test_list_query_parses_choices_and_caps_limit() {
        let query = ListUsersQuery {
            user_type: Some("owner".to_string()),
            company_type: Some("GCC".to_string()),
            search: Some("  ".to_string()),
            limit: Some(1000),
            ..Default::default()
        };
        let (filter, page) = query.into_parts().unwrap();
        assert_eq!(filter.user_type, Some(UserType::Owner));
        assert_eq!(filter.company_type, Some(CompanyType::Gcc));
        assert!(filter.search.is_none());
        assert_eq!(page.limit, 100);
    }

    #[test]
    fn test_list_query_rejects_unknown_role() {
        let query = ListUsersQuery {
            user_type: Some("landlord".to_string()),
            ..Default::default()
        };
        assert!(matches!(
            query.into_parts(),
            Err(GatewayError::InvalidRequest(_))
        ));
    }
}
