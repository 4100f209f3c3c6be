//! Response bodies shared by the REST endpoints.

use rental_users::{
    BulkActionResult, Investor, Owner, Tenant, User, UserExportRow, UserPage, UserProfile,
    UserProfiles,
};
use serde::Serialize;
use utoipa::ToSchema;

#[derive(Debug, Serialize, ToSchema)]
pub struct CompanyResponse {
    pub name: Option<String>,
    pub name_english: Option<String>,
    pub company_type: Option<String>,
    pub commercial_registration: Option<String>,
    pub license: Option<String>,
    pub tax_number: Option<String>,
    pub establishment_date: Option<String>,
    /// Full years since establishment.
    pub company_age: Option<i32>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct UserResponse {
    pub id: String,
    pub email: String,
    pub phone: Option<String>,
    pub whatsapp: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub user_type: String,
    pub user_type_label: String,
    pub display_label: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub company: Option<CompanyResponse>,
    pub country: String,
    pub city: String,
    pub address: Option<String>,
    pub postal_code: Option<String>,
    pub website: Option<String>,
    pub preferred_language: String,
    pub is_verified: bool,
    pub is_active: bool,
    pub is_staff: bool,
    pub is_superuser: bool,
    pub last_login_at: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        let display_label = user.display_label();
        let company_age = user.company_age(chrono::Utc::now().date_naive());
        let company = (!user.company.is_empty()).then(|| CompanyResponse {
            name: user.company.name,
            name_english: user.company.name_english,
            company_type: user.company.company_type.map(|t| t.as_str().to_string()),
            commercial_registration: user.company.commercial_registration,
            license: user.company.license,
            tax_number: user.company.tax_number,
            establishment_date: user.company.establishment_date.map(|d| d.to_string()),
            company_age,
        });

        Self {
            id: user.public_id,
            email: user.email,
            phone: user.phone,
            whatsapp: user.whatsapp,
            first_name: user.first_name,
            last_name: user.last_name,
            user_type: user.user_type.as_str().to_string(),
            user_type_label: user.user_type.label().to_string(),
            display_label,
            company,
            country: user.country,
            city: user.city,
            address: user.address,
            postal_code: user.postal_code,
            website: user.website,
            preferred_language: user.preferred_language.as_str().to_string(),
            is_verified: user.is_verified,
            is_active: user.is_active,
            is_staff: user.is_staff,
            is_superuser: user.is_superuser,
            last_login_at: user.last_login_at.map(|t| t.to_rfc3339()),
            created_at: user.created_at.to_rfc3339(),
            updated_at: user.updated_at.to_rfc3339(),
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct UsersResponse {
    pub users: Vec<UserResponse>,
    pub total: i64,
    pub limit: u32,
    pub offset: u32,
}

impl From<UserPage> for UsersResponse {
    fn from(page: UserPage) -> Self {
        Self {
            users: page.users.into_iter().map(UserResponse::from).collect(),
            total: page.total,
            limit: page.limit,
            offset: page.offset,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct MessageResponse {
    pub message: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct BulkActionResponse {
    pub updated: u64,
    pub message: String,
}

impl From<BulkActionResult> for BulkActionResponse {
    fn from(result: BulkActionResult) -> Self {
        Self {
            updated: result.updated,
            message: result.message,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ExportRowResponse {
    pub id: String,
    pub email: String,
    pub phone: Option<String>,
    pub user_type: String,
    pub company_name: Option<String>,
    pub is_verified: bool,
    pub is_active: bool,
}

impl From<UserExportRow> for ExportRowResponse {
    fn from(row: UserExportRow) -> Self {
        Self {
            id: row.public_id,
            email: row.email,
            phone: row.phone,
            user_type: row.user_type,
            company_name: row.company_name,
            is_verified: row.is_verified,
            is_active: row.is_active,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct OwnerResponse {
    pub ownership_percentage: String,
    pub bank_name: Option<String>,
    pub iban_number: Option<String>,
    pub preferred_payment_method: String,
}

impl From<Owner> for OwnerResponse {
    fn from(owner: Owner) -> Self {
        Self {
            ownership_percentage: owner.ownership_percentage.to_string(),
            bank_name: owner.bank_name,
            iban_number: owner.iban_number,
            preferred_payment_method: owner.preferred_payment_method.as_str().to_string(),
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct InvestorResponse {
    pub investment_amount: String,
    pub investment_percentage: String,
    pub investment_date: String,
    pub contract_duration_years: u32,
    pub contract_end_date: Option<String>,
    #[schema(value_type = Option<Object>)]
    pub bank_details: Option<serde_json::Value>,
}

impl From<Investor> for InvestorResponse {
    fn from(investor: Investor) -> Self {
        Self {
            investment_amount: investor.investment_amount.to_string(),
            investment_percentage: investor.investment_percentage.to_string(),
            investment_date: investor.investment_date.to_string(),
            contract_duration_years: investor.contract_duration_years,
            contract_end_date: investor.contract_end_date().map(|d| d.to_string()),
            bank_details: investor.bank_details,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct TenantResponse {
    pub company_activity: String,
    pub authorized_person: String,
    pub authorized_person_id: String,
    pub emergency_contact: Option<String>,
    pub insurance_policy: Option<String>,
    pub insurance_expiry: Option<String>,
    pub has_valid_insurance: bool,
}

impl From<Tenant> for TenantResponse {
    fn from(tenant: Tenant) -> Self {
        let has_valid_insurance = tenant.has_valid_insurance(chrono::Utc::now().date_naive());
        Self {
            company_activity: tenant.company_activity,
            authorized_person: tenant.authorized_person,
            authorized_person_id: tenant.authorized_person_id,
            emergency_contact: tenant.emergency_contact,
            insurance_policy: tenant.insurance_policy,
            insurance_expiry: tenant.insurance_expiry.map(|d| d.to_string()),
            has_valid_insurance,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct UserProfileResponse {
    pub avatar_url: Option<String>,
    pub nationality: Option<String>,
    pub address: Option<String>,
    pub emergency_contact: Option<String>,
    pub updated_at: String,
}

impl From<UserProfile> for UserProfileResponse {
    fn from(profile: UserProfile) -> Self {
        Self {
            avatar_url: profile.avatar_url,
            nationality: profile.nationality,
            address: profile.address,
            emergency_contact: profile.emergency_contact,
            updated_at: profile.updated_at.to_rfc3339(),
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ProfilesResponse {
    pub owner: Option<OwnerResponse>,
    pub investor: Option<InvestorResponse>,
    pub tenant: Option<TenantResponse>,
    pub profile: Option<UserProfileResponse>,
}

impl From<UserProfiles> for ProfilesResponse {
    fn from(profiles: UserProfiles) -> Self {
        Self {
            owner: profiles.owner.map(Into::into),
            investor: profiles.investor.map(Into::into),
            tenant: profiles.tenant.map(Into::into),
            profile: profiles.profile.map(Into::into),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Months, Utc};
    use rental_users::{CompanyDetails, Language, UserType};

    fn company_user(company: CompanyDetails) -> User {
        let now = Utc::now();
        User {
            id: 1,
            public_id: "p1".to_string(),
            email: "a@x.com".to_string(),
            phone: None,
            whatsapp: None,
            first_name: None,
            last_name: None,
            id_number: None,
            user_type: UserType::Company,
            company,
            country: "OM".to_string(),
            city: "Muscat".to_string(),
            address: None,
            postal_code: None,
            website: None,
            preferred_language: Language::Ar,
            password_hash: None,
            is_verified: false,
            verification_token: "t".to_string(),
            is_active: true,
            is_staff: false,
            is_superuser: false,
            last_login_at: None,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_company_response_includes_age() {
        let established = Utc::now()
            .date_naive()
            .checked_sub_months(Months::new(36))
            .unwrap();
        let user = company_user(CompanyDetails {
            name: Some("Acme".to_string()),
            establishment_date: Some(established),
            ..Default::default()
        });

        let response = UserResponse::from(user);
        let company = response.company.unwrap();
        assert_eq!(company.company_age, Some(3));
        assert_eq!(company.establishment_date, Some(established.to_string()));
    }

    #[test]
    fn test_company_response_without_establishment_date() {
        let user = company_user(CompanyDetails {
            name: Some("Acme".to_string()),
            ..Default::default()
        });

        let company = UserResponse::from(user).company.unwrap();
        assert_eq!(company.company_age, None);

        let no_company = UserResponse::from(company_user(CompanyDetails::default()));
        assert!(no_company.company.is_none());
    }
}
