//! Request and result types for the account services.

use chrono::NaiveDate;
use rental_database::{
    CompanyDetails, CompanyType, Investor, Language, Owner, Tenant, User, UserProfile, UserType,
    MAX_PAGE_SIZE,
};
use serde::{Deserialize, Serialize};

use crate::types::AccountResult;
use crate::utils::validation::{
    validate_commercial_registration, validate_company_name, validate_email, validate_length,
    validate_phone, validate_url,
};

/// Input for the account manager's create calls.
///
/// `is_active`, `is_staff` and `is_superuser` are `None` when the caller did
/// not choose a value, so each create call can apply its own defaults.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CreateUserRequest {
    pub email: String,
    pub company_name: String,
    pub commercial_registration: String,
    #[serde(skip_serializing)]
    pub password: Option<String>,
    pub user_type: UserType,
    pub phone: Option<String>,
    pub whatsapp: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub id_number: Option<String>,
    pub company_name_english: Option<String>,
    pub company_type: Option<CompanyType>,
    pub company_license: Option<String>,
    pub tax_number: Option<String>,
    pub establishment_date: Option<NaiveDate>,
    pub country: Option<String>,
    pub city: Option<String>,
    pub address: Option<String>,
    pub postal_code: Option<String>,
    pub website: Option<String>,
    pub preferred_language: Language,
    pub is_verified: bool,
    pub is_active: Option<bool>,
    pub is_staff: Option<bool>,
    pub is_superuser: Option<bool>,
}

impl CreateUserRequest {
    pub fn new(
        email: impl Into<String>,
        company_name: impl Into<String>,
        commercial_registration: impl Into<String>,
    ) -> Self {
        Self {
            email: email.into(),
            company_name: company_name.into(),
            commercial_registration: commercial_registration.into(),
            ..Default::default()
        }
    }

    pub fn with_password(mut self, password: impl Into<String>) -> Self {
        self.password = Some(password.into());
        self
    }

    pub fn with_user_type(mut self, user_type: UserType) -> Self {
        self.user_type = user_type;
        self
    }

    /// Required business fields first, then formats of whatever else was given.
    pub fn validate(&self) -> AccountResult<()> {
        validate_email(&self.email)?;
        validate_company_name(&self.company_name)?;
        validate_commercial_registration(&self.commercial_registration)?;

        validate_optional_fields(&OptionalFields {
            phone: self.phone.as_deref(),
            whatsapp: self.whatsapp.as_deref(),
            website: self.website.as_deref(),
            company_name_english: self.company_name_english.as_deref(),
            tax_number: self.tax_number.as_deref(),
            id_number: self.id_number.as_deref(),
            postal_code: self.postal_code.as_deref(),
            country: self.country.as_deref(),
        })
    }

    pub(crate) fn company_details(&self) -> CompanyDetails {
        CompanyDetails {
            name: Some(self.company_name.trim().to_string()),
            name_english: self.company_name_english.clone(),
            company_type: self.company_type,
            commercial_registration: Some(self.commercial_registration.trim().to_string()),
            license: self.company_license.clone(),
            tax_number: self.tax_number.clone(),
            establishment_date: self.establishment_date,
        }
    }
}

/// Optional columns shared by the create and change paths.
pub(crate) struct OptionalFields<'a> {
    pub phone: Option<&'a str>,
    pub whatsapp: Option<&'a str>,
    pub website: Option<&'a str>,
    pub company_name_english: Option<&'a str>,
    pub tax_number: Option<&'a str>,
    pub id_number: Option<&'a str>,
    pub postal_code: Option<&'a str>,
    pub country: Option<&'a str>,
}

pub(crate) fn validate_optional_fields(fields: &OptionalFields<'_>) -> AccountResult<()> {
    if let Some(phone) = fields.phone {
        validate_phone("phone", phone)?;
    }
    if let Some(whatsapp) = fields.whatsapp {
        validate_phone("whatsapp", whatsapp)?;
    }
    if let Some(website) = fields.website {
        validate_url("website", website)?;
    }
    if let Some(name) = fields.company_name_english {
        validate_length("company_name_english", name, 150)?;
    }
    if let Some(tax_number) = fields.tax_number {
        validate_length("tax_number", tax_number, 50)?;
    }
    if let Some(id_number) = fields.id_number {
        validate_length("id_number", id_number, 20)?;
    }
    if let Some(postal_code) = fields.postal_code {
        validate_length("postal_code", postal_code, 10)?;
    }
    if let Some(country) = fields.country {
        if country.len() != 2 || !country.chars().all(|c| c.is_ascii_uppercase()) {
            return Err(crate::types::AccountError::validation(
                "country: expected a two-letter ISO country code",
            ));
        }
    }
    Ok(())
}

/// Pagination window for the admin list.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct PageRequest {
    pub limit: u32,
    pub offset: u32,
}

impl PageRequest {
    pub fn new(limit: u32, offset: u32) -> Self {
        Self {
            limit: limit.clamp(1, MAX_PAGE_SIZE),
            offset,
        }
    }
}

impl Default for PageRequest {
    fn default() -> Self {
        Self::new(MAX_PAGE_SIZE, 0)
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct UserPage {
    pub users: Vec<User>,
    pub total: i64,
    pub limit: u32,
    pub offset: u32,
}

/// Outcome of a bulk admin action.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BulkActionResult {
    pub updated: u64,
    pub message: String,
}

/// One row of the admin list display, as exported.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UserExportRow {
    pub public_id: String,
    pub email: String,
    pub phone: Option<String>,
    pub user_type: String,
    pub company_name: Option<String>,
    pub is_verified: bool,
    pub is_active: bool,
}

impl From<&User> for UserExportRow {
    fn from(user: &User) -> Self {
        Self {
            public_id: user.public_id.clone(),
            email: user.email.clone(),
            phone: user.phone.clone(),
            user_type: user.user_type.label().to_string(),
            company_name: user.company.name.clone(),
            is_verified: user.is_verified,
            is_active: user.is_active,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FilterOption {
    pub value: &'static str,
    pub label: &'static str,
}

/// Sidebar filter choices of the admin list.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FilterLookups {
    pub user_type: Vec<FilterOption>,
    pub company_type: Vec<FilterOption>,
}

impl FilterLookups {
    pub fn build() -> Self {
        Self {
            user_type: UserType::ALL
                .iter()
                .map(|t| FilterOption {
                    value: t.as_str(),
                    label: t.label(),
                })
                .collect(),
            company_type: CompanyType::ALL
                .iter()
                .map(|t| FilterOption {
                    value: t.as_str(),
                    label: t.label(),
                })
                .collect(),
        }
    }
}

/// Every profile attached to one user.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct UserProfiles {
    pub owner: Option<Owner>,
    pub investor: Option<Investor>,
    pub tenant: Option<Tenant>,
    pub profile: Option<UserProfile>,
}

/// Successful login.
#[derive(Debug, Clone, Serialize)]
pub struct LoginOutcome {
    pub token: String,
    pub expires_in: u64,
    pub user: User,
}

/// What the post-create hook did.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct PostCreateReport {
    pub welcome_sent: bool,
    pub verification_sent: bool,
    pub profile_created: bool,
}
