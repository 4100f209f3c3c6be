use utoipa::openapi::security::{Http, HttpAuthScheme, SecurityScheme};
use utoipa::{Modify, OpenApi};

#[derive(OpenApi)]
#[openapi(
    paths(
        crate::rest::health::health_check,
        crate::rest::auth::login,
        crate::rest::auth::register,
        crate::rest::auth::verify_email,
        crate::rest::auth::me,
        crate::rest::admin::list_users,
        crate::rest::admin::create_user,
        crate::rest::admin::get_user,
        crate::rest::admin::update_user,
        crate::rest::admin::reset_password,
        crate::rest::admin::upsert_owner,
        crate::rest::admin::upsert_investor,
        crate::rest::admin::upsert_tenant,
        crate::rest::admin::upsert_user_profile,
        crate::rest::admin::get_profiles,
        crate::rest::admin::verify_users,
        crate::rest::admin::deactivate_users,
        crate::rest::admin::activate_users,
        crate::rest::admin::export_users,
        crate::rest::admin::filters
    ),
    components(
        schemas(
            crate::error::ErrorResponse,
            crate::rest::health::HealthResponse,
            crate::rest::auth::LoginRequest,
            crate::rest::auth::LoginResponse,
            crate::rest::auth::RegisterRequest,
            crate::rest::auth::VerifyResponse,
            crate::rest::models::CompanyResponse,
            crate::rest::models::UserResponse,
            crate::rest::models::UsersResponse,
            crate::rest::models::MessageResponse,
            crate::rest::models::BulkActionResponse,
            crate::rest::models::ExportRowResponse,
            crate::rest::models::OwnerResponse,
            crate::rest::models::InvestorResponse,
            crate::rest::models::TenantResponse,
            crate::rest::models::UserProfileResponse,
            crate::rest::models::ProfilesResponse,
            crate::rest::admin::CreateUserRequest,
            crate::rest::admin::UpdateUserRequest,
            crate::rest::admin::OwnerRequest,
            crate::rest::admin::InvestorRequest,
            crate::rest::admin::TenantRequest,
            crate::rest::admin::UserProfileRequest,
            crate::rest::admin::BulkActionRequest,
            crate::rest::admin::FilterOptionResponse,
            crate::rest::admin::FiltersResponse
        )
    ),
    tags(
        (name = "Health", description = "Service health endpoints"),
        (name = "Auth", description = "Registration, login and email verification"),
        (name = "Admin", description = "Staff account administration")
    ),
    modifiers(&SecurityAddon)
)]
pub struct ApiDoc;

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        let schemes = &mut components.security_schemes;

        let mut scheme = SecurityScheme::Http(Http::new(HttpAuthScheme::Bearer));
        if let SecurityScheme::Http(http) = &mut scheme {
            http.bearer_format = Some("JWT".to_string());
        }

        schemes.insert("bearerAuth".to_string(), scheme);
    }
}
