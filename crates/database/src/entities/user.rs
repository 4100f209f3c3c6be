//! User entity definitions

use chrono::{DateTime, Datelike, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Account role tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum UserType {
    Owner,
    Investor,
    Tenant,
    Company,
    Government,
}

impl UserType {
    pub const ALL: [UserType; 5] = [
        UserType::Owner,
        UserType::Investor,
        UserType::Tenant,
        UserType::Company,
        UserType::Government,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            UserType::Owner => "OWNER",
            UserType::Investor => "INVESTOR",
            UserType::Tenant => "TENANT",
            UserType::Company => "COMPANY",
            UserType::Government => "GOVERNMENT",
        }
    }

    /// Human readable label used in list views and email subjects.
    pub fn label(&self) -> &'static str {
        match self {
            UserType::Owner => "Property owner",
            UserType::Investor => "Investor",
            UserType::Tenant => "Unit tenant",
            UserType::Company => "Tenant company",
            UserType::Government => "Government entity",
        }
    }

    pub fn is_company(&self) -> bool {
        matches!(self, UserType::Company)
    }
}

impl Default for UserType {
    fn default() -> Self {
        UserType::Company
    }
}

impl FromStr for UserType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "OWNER" => Ok(UserType::Owner),
            "INVESTOR" => Ok(UserType::Investor),
            "TENANT" => Ok(UserType::Tenant),
            "COMPANY" => Ok(UserType::Company),
            "GOVERNMENT" => Ok(UserType::Government),
            other => Err(format!("unknown user type: {other}")),
        }
    }
}

impl fmt::Display for UserType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Where a company is registered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CompanyType {
    #[serde(rename = "OM")]
    Omani,
    #[serde(rename = "GCC")]
    Gcc,
    #[serde(rename = "INT")]
    International,
}

impl CompanyType {
    pub const ALL: [CompanyType; 3] = [
        CompanyType::Omani,
        CompanyType::Gcc,
        CompanyType::International,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            CompanyType::Omani => "OM",
            CompanyType::Gcc => "GCC",
            CompanyType::International => "INT",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            CompanyType::Omani => "Omani companies",
            CompanyType::Gcc => "GCC companies",
            CompanyType::International => "Foreign companies",
        }
    }
}

impl FromStr for CompanyType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "OM" => Ok(CompanyType::Omani),
            "GCC" => Ok(CompanyType::Gcc),
            "INT" => Ok(CompanyType::International),
            other => Err(format!("unknown company type: {other}")),
        }
    }
}

impl fmt::Display for CompanyType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    Ar,
    En,
}

impl Language {
    pub fn as_str(&self) -> &'static str {
        match self {
            Language::Ar => "ar",
            Language::En => "en",
        }
    }
}

impl Default for Language {
    fn default() -> Self {
        Language::Ar
    }
}

impl FromStr for Language {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "ar" => Ok(Language::Ar),
            "en" => Ok(Language::En),
            other => Err(format!("unknown language: {other}")),
        }
    }
}

/// Fields that only carry meaning for company accounts.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CompanyDetails {
    pub name: Option<String>,
    pub name_english: Option<String>,
    pub company_type: Option<CompanyType>,
    pub commercial_registration: Option<String>,
    pub license: Option<String>,
    pub tax_number: Option<String>,
    pub establishment_date: Option<NaiveDate>,
}

impl CompanyDetails {
    pub fn is_empty(&self) -> bool {
        *self == CompanyDetails::default()
    }
}

/// Clears company details unless the role is [`UserType::Company`].
///
/// Runs on every insert and update. Returns `true` when non-empty details
/// were discarded.
pub fn enforce_company_fields(user_type: UserType, company: &mut CompanyDetails) -> bool {
    if user_type.is_company() || company.is_empty() {
        return false;
    }
    *company = CompanyDetails::default();
    true
}

/// User entity representing an account in the system
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
    pub public_id: String,
    pub email: String,
    pub phone: Option<String>,
    pub whatsapp: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub id_number: Option<String>,
    pub user_type: UserType,
    pub company: CompanyDetails,
    pub country: String,
    pub city: String,
    pub address: Option<String>,
    pub postal_code: Option<String>,
    pub website: Option<String>,
    pub preferred_language: Language,
    #[serde(skip_serializing, default)]
    pub password_hash: Option<String>,
    pub is_verified: bool,
    #[serde(skip_serializing, default)]
    pub verification_token: String,
    pub is_active: bool,
    pub is_staff: bool,
    pub is_superuser: bool,
    pub last_login_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    pub fn is_owner(&self) -> bool {
        self.user_type == UserType::Owner
    }

    pub fn is_investor(&self) -> bool {
        self.user_type == UserType::Investor
    }

    pub fn is_tenant(&self) -> bool {
        self.user_type == UserType::Tenant
    }

    pub fn is_company(&self) -> bool {
        self.user_type == UserType::Company
    }

    pub fn is_government(&self) -> bool {
        self.user_type == UserType::Government
    }

    pub fn has_usable_password(&self) -> bool {
        self.password_hash.is_some()
    }

    /// Full years since the company was established, as of `today`.
    pub fn company_age(&self, today: NaiveDate) -> Option<i32> {
        let established = self.company.establishment_date?;
        let mut age = today.year() - established.year();
        if (today.month(), today.day()) < (established.month(), established.day()) {
            age -= 1;
        }
        Some(age)
    }

    pub fn full_name(&self) -> Option<String> {
        match (&self.first_name, &self.last_name) {
            (Some(f), Some(l)) => Some(format!("{} {}", f, l)),
            (Some(f), None) => Some(f.clone()),
            (None, Some(l)) => Some(l.clone()),
            _ => None,
        }
    }

    /// `"<company name or email> (<role label>)"`
    pub fn display_label(&self) -> String {
        let name = self.company.name.as_deref().unwrap_or(&self.email);
        format!("{} ({})", name, self.user_type.label())
    }
}

/// Values for a new user row. The password is already hashed.
#[derive(Debug, Clone, Default)]
pub struct NewUser {
    pub email: String,
    pub phone: Option<String>,
    pub whatsapp: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub id_number: Option<String>,
    pub user_type: UserType,
    pub company: CompanyDetails,
    pub country: Option<String>,
    pub city: Option<String>,
    pub address: Option<String>,
    pub postal_code: Option<String>,
    pub website: Option<String>,
    pub preferred_language: Language,
    pub password_hash: Option<String>,
    pub is_verified: bool,
    pub is_active: bool,
    pub is_staff: bool,
    pub is_superuser: bool,
}

/// Admin list filter, mirrors the list view's sidebar filters and search box.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UserFilter {
    pub user_type: Option<UserType>,
    pub company_type: Option<CompanyType>,
    pub is_verified: Option<bool>,
    pub is_active: Option<bool>,
    pub is_staff: Option<bool>,
    pub search: Option<String>,
}

impl UserFilter {
    /// Whether `user` passes every set criterion.
    pub fn matches(&self, user: &User) -> bool {
        if self.user_type.is_some_and(|t| t != user.user_type) {
            return false;
        }
        if self.company_type.is_some() && self.company_type != user.company.company_type {
            return false;
        }
        if self.is_verified.is_some_and(|v| v != user.is_verified)
            || self.is_active.is_some_and(|v| v != user.is_active)
            || self.is_staff.is_some_and(|v| v != user.is_staff)
        {
            return false;
        }
        match self.search.as_deref().map(str::trim) {
            Some(term) if !term.is_empty() => {
                let term = term.to_lowercase();
                [
                    Some(user.email.as_str()),
                    user.phone.as_deref(),
                    user.first_name.as_deref(),
                    user.last_name.as_deref(),
                    user.company.name.as_deref(),
                    user.company.commercial_registration.as_deref(),
                ]
                .into_iter()
                .flatten()
                .any(|field| field.to_lowercase().contains(&term))
            }
            _ => true,
        }
    }
}
