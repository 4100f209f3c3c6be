//! Input forms accepted by the account services.
//!
//! Each form validates its own fields before it is turned into a store
//! call. Uniqueness is left to the store.

use chrono::NaiveDate;
use rental_database::{
    CompanyType, Investor, Language, Owner, PaymentMethod, Tenant, User, UserType,
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::types::requests::{validate_optional_fields, OptionalFields};
use crate::types::{AccountError, AccountResult, CreateUserRequest};
use crate::utils::validation::{
    validate_commercial_registration, validate_company_name, validate_email, validate_iban,
    validate_length, validate_password_pair, validate_percentage, validate_phone,
};

/// Self-service registration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegisterForm {
    pub email: String,
    pub phone: String,
    #[serde(default)]
    pub user_type: UserType,
    pub company_name: String,
    pub commercial_registration: String,
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub last_name: Option<String>,
    #[serde(default)]
    pub company_type: Option<CompanyType>,
    #[serde(default)]
    pub preferred_language: Language,
    #[serde(skip_serializing)]
    pub password1: String,
    #[serde(skip_serializing)]
    pub password2: String,
}

impl RegisterForm {
    pub fn validate(&self) -> AccountResult<()> {
        validate_email(&self.email)?;
        validate_phone("phone", &self.phone)?;
        validate_password_pair(&self.password1, &self.password2)
    }

    pub fn into_request(self) -> AccountResult<CreateUserRequest> {
        self.validate()?;
        Ok(CreateUserRequest {
            phone: Some(self.phone.trim().to_string()),
            first_name: non_blank(self.first_name),
            last_name: non_blank(self.last_name),
            company_type: self.company_type,
            preferred_language: self.preferred_language,
            ..CreateUserRequest::new(self.email, self.company_name, self.commercial_registration)
                .with_password(self.password1)
                .with_user_type(self.user_type)
        })
    }
}

/// Account created by an operator. The password pair may be left out, in
/// which case the account has no usable password.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AdminCreateUserForm {
    pub email: String,
    pub company_name: String,
    pub commercial_registration: String,
    pub user_type: UserType,
    pub phone: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub company_type: Option<CompanyType>,
    #[serde(skip_serializing)]
    pub password1: Option<String>,
    #[serde(skip_serializing)]
    pub password2: Option<String>,
    pub is_verified: bool,
    pub is_active: Option<bool>,
    pub is_staff: Option<bool>,
}

impl AdminCreateUserForm {
    pub fn validate(&self) -> AccountResult<()> {
        validate_email(&self.email)?;
        if let Some(phone) = self.phone.as_deref() {
            validate_phone("phone", phone)?;
        }
        match (non_blank_ref(&self.password1), non_blank_ref(&self.password2)) {
            (None, None) => Ok(()),
            (Some(p1), Some(p2)) => validate_password_pair(p1, p2),
            _ => Err(AccountError::PasswordMismatch),
        }
    }

    pub fn into_request(self) -> AccountResult<CreateUserRequest> {
        self.validate()?;
        let password = non_blank(self.password1);
        Ok(CreateUserRequest {
            password,
            phone: non_blank(self.phone),
            first_name: non_blank(self.first_name),
            last_name: non_blank(self.last_name),
            company_type: self.company_type,
            is_verified: self.is_verified,
            is_active: self.is_active,
            is_staff: self.is_staff,
            ..CreateUserRequest::new(self.email, self.company_name, self.commercial_registration)
                .with_user_type(self.user_type)
        })
    }
}

/// Partial update of an account. Unset fields are left alone; a blank
/// string clears an optional column.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct UserChangeForm {
    pub email: Option<String>,
    pub phone: Option<String>,
    pub whatsapp: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub id_number: Option<String>,
    pub user_type: Option<UserType>,
    pub company_name: Option<String>,
    pub company_name_english: Option<String>,
    pub company_type: Option<CompanyType>,
    pub commercial_registration: Option<String>,
    pub company_license: Option<String>,
    pub tax_number: Option<String>,
    pub establishment_date: Option<NaiveDate>,
    pub country: Option<String>,
    pub city: Option<String>,
    pub address: Option<String>,
    pub postal_code: Option<String>,
    pub website: Option<String>,
    pub preferred_language: Option<Language>,
    pub is_verified: Option<bool>,
    pub is_active: Option<bool>,
    pub is_staff: Option<bool>,
}

impl UserChangeForm {
    pub fn validate(&self) -> AccountResult<()> {
        if let Some(email) = self.email.as_deref() {
            validate_email(email)?;
        }
        if let Some(name) = non_blank_ref(&self.company_name) {
            validate_company_name(name)?;
        }
        if let Some(registration) = non_blank_ref(&self.commercial_registration) {
            validate_commercial_registration(registration)?;
        }
        if let Some(city) = self.city.as_deref() {
            validate_length("city", city, 100)?;
        }

        validate_optional_fields(&OptionalFields {
            phone: non_blank_ref(&self.phone),
            whatsapp: non_blank_ref(&self.whatsapp),
            website: non_blank_ref(&self.website),
            company_name_english: non_blank_ref(&self.company_name_english),
            tax_number: non_blank_ref(&self.tax_number),
            id_number: non_blank_ref(&self.id_number),
            postal_code: non_blank_ref(&self.postal_code),
            country: self.country.as_deref(),
        })
    }

    /// Copy every set field onto `user`.
    pub fn apply(self, user: &mut User) {
        if let Some(email) = self.email {
            user.email = crate::utils::validation::normalize_email(&email);
        }
        if let Some(user_type) = self.user_type {
            user.user_type = user_type;
        }

        replace(&mut user.phone, self.phone);
        replace(&mut user.whatsapp, self.whatsapp);
        replace(&mut user.first_name, self.first_name);
        replace(&mut user.last_name, self.last_name);
        replace(&mut user.id_number, self.id_number);
        replace(&mut user.address, self.address);
        replace(&mut user.postal_code, self.postal_code);
        replace(&mut user.website, self.website);

        replace(&mut user.company.name, self.company_name);
        replace(&mut user.company.name_english, self.company_name_english);
        replace(&mut user.company.commercial_registration, self.commercial_registration);
        replace(&mut user.company.license, self.company_license);
        replace(&mut user.company.tax_number, self.tax_number);
        if let Some(company_type) = self.company_type {
            user.company.company_type = Some(company_type);
        }
        if let Some(date) = self.establishment_date {
            user.company.establishment_date = Some(date);
        }

        if let Some(country) = self.country {
            user.country = country;
        }
        if let Some(city) = self.city {
            user.city = city;
        }
        if let Some(language) = self.preferred_language {
            user.preferred_language = language;
        }
        if let Some(verified) = self.is_verified {
            user.is_verified = verified;
        }
        if let Some(active) = self.is_active {
            user.is_active = active;
        }
        if let Some(staff) = self.is_staff {
            user.is_staff = staff;
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginForm {
    pub email: String,
    #[serde(skip_serializing)]
    pub password: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct OwnerForm {
    pub ownership_percentage: Option<Decimal>,
    pub bank_name: Option<String>,
    pub iban_number: Option<String>,
    pub preferred_payment_method: Option<PaymentMethod>,
}

impl OwnerForm {
    pub fn validate(&self) -> AccountResult<()> {
        if let Some(percentage) = self.ownership_percentage {
            validate_percentage("ownership_percentage", percentage)?;
        }
        if let Some(bank) = self.bank_name.as_deref() {
            validate_length("bank_name", bank, 100)?;
        }
        if let Some(iban) = non_blank_ref(&self.iban_number) {
            validate_iban(iban)?;
        }
        Ok(())
    }

    pub fn into_owner(self, user_id: i64) -> Owner {
        let defaults = Owner::new(user_id);
        Owner {
            ownership_percentage: self
                .ownership_percentage
                .unwrap_or(defaults.ownership_percentage),
            bank_name: non_blank(self.bank_name),
            iban_number: non_blank(self.iban_number),
            preferred_payment_method: self.preferred_payment_method.unwrap_or_default(),
            ..defaults
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InvestorForm {
    #[serde(default)]
    pub investment_amount: Option<Decimal>,
    #[serde(default)]
    pub investment_percentage: Option<Decimal>,
    pub investment_date: NaiveDate,
    #[serde(default)]
    pub contract_duration_years: Option<u32>,
    #[serde(default)]
    pub bank_details: Option<serde_json::Value>,
}

impl InvestorForm {
    pub fn validate(&self) -> AccountResult<()> {
        if self.investment_amount.is_some_and(|amount| amount < Decimal::ZERO) {
            return Err(AccountError::validation(
                "investment_amount: must not be negative",
            ));
        }
        if let Some(percentage) = self.investment_percentage {
            validate_percentage("investment_percentage", percentage)?;
        }
        if self.contract_duration_years == Some(0) {
            return Err(AccountError::validation(
                "contract_duration_years: must be at least 1",
            ));
        }
        Ok(())
    }

    pub fn into_investor(self, user_id: i64) -> Investor {
        let defaults = Investor::new(user_id, self.investment_date);
        Investor {
            investment_amount: self.investment_amount.unwrap_or(defaults.investment_amount),
            investment_percentage: self
                .investment_percentage
                .unwrap_or(defaults.investment_percentage),
            contract_duration_years: self
                .contract_duration_years
                .unwrap_or(defaults.contract_duration_years),
            bank_details: self.bank_details,
            ..defaults
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TenantForm {
    pub company_activity: String,
    pub authorized_person: String,
    pub authorized_person_id: String,
    #[serde(default)]
    pub emergency_contact: Option<String>,
    #[serde(default)]
    pub insurance_policy: Option<String>,
    #[serde(default)]
    pub insurance_expiry: Option<NaiveDate>,
}

impl TenantForm {
    pub fn validate(&self) -> AccountResult<()> {
        for (field, value, max) in [
            ("company_activity", &self.company_activity, 100),
            ("authorized_person", &self.authorized_person, 100),
            ("authorized_person_id", &self.authorized_person_id, 20),
        ] {
            if value.trim().is_empty() {
                return Err(AccountError::validation(format!(
                    "{field}: this field is required"
                )));
            }
            validate_length(field, value, max)?;
        }
        if let Some(contact) = non_blank_ref(&self.emergency_contact) {
            validate_length("emergency_contact", contact, 100)?;
        }
        Ok(())
    }

    pub fn into_tenant(self, user_id: i64) -> Tenant {
        Tenant {
            user_id,
            company_activity: self.company_activity.trim().to_string(),
            authorized_person: self.authorized_person.trim().to_string(),
            authorized_person_id: self.authorized_person_id.trim().to_string(),
            emergency_contact: non_blank(self.emergency_contact),
            insurance_policy: non_blank(self.insurance_policy),
            insurance_expiry: self.insurance_expiry,
        }
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn non_blank_ref(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

/// `None` keeps the current value, a blank string clears it.
fn replace(target: &mut Option<String>, value: Option<String>) {
    if let Some(value) = value {
        *target = non_blank(Some(value));
    }
}
