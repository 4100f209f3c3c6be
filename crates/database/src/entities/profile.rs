//! Role-specific profile records and the generic user profile.

use chrono::{DateTime, Datelike, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::user::UserType;

/// The three role profiles that hang off a user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProfileKind {
    Owner,
    Investor,
    Tenant,
}

impl ProfileKind {
    /// Role the owning user must carry.
    pub fn required_user_type(&self) -> UserType {
        match self {
            ProfileKind::Owner => UserType::Owner,
            ProfileKind::Investor => UserType::Investor,
            ProfileKind::Tenant => UserType::Tenant,
        }
    }
}

impl fmt::Display for ProfileKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProfileKind::Owner => f.write_str("owner"),
            ProfileKind::Investor => f.write_str("investor"),
            ProfileKind::Tenant => f.write_str("tenant"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum PaymentMethod {
    Bank,
    Cheque,
    Cash,
}

impl PaymentMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentMethod::Bank => "BANK",
            PaymentMethod::Cheque => "CHEQUE",
            PaymentMethod::Cash => "CASH",
        }
    }
}

impl Default for PaymentMethod {
    fn default() -> Self {
        PaymentMethod::Bank
    }
}

impl FromStr for PaymentMethod {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "BANK" => Ok(PaymentMethod::Bank),
            "CHEQUE" => Ok(PaymentMethod::Cheque),
            "CASH" => Ok(PaymentMethod::Cash),
            other => Err(format!("unknown payment method: {other}")),
        }
    }
}

/// Building owner details.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Owner {
    pub user_id: i64,
    pub ownership_percentage: Decimal,
    pub bank_name: Option<String>,
    pub iban_number: Option<String>,
    pub preferred_payment_method: PaymentMethod,
}

impl Owner {
    pub fn new(user_id: i64) -> Self {
        Self {
            user_id,
            ownership_percentage: Decimal::new(10000, 2),
            bank_name: None,
            iban_number: None,
            preferred_payment_method: PaymentMethod::Bank,
        }
    }
}

/// Building investor details.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Investor {
    pub user_id: i64,
    pub investment_amount: Decimal,
    pub investment_percentage: Decimal,
    pub investment_date: NaiveDate,
    pub contract_duration_years: u32,
    pub bank_details: Option<serde_json::Value>,
}

impl Investor {
    pub fn new(user_id: i64, investment_date: NaiveDate) -> Self {
        Self {
            user_id,
            investment_amount: Decimal::ZERO,
            investment_percentage: Decimal::ZERO,
            investment_date,
            contract_duration_years: 1,
            bank_details: None,
        }
    }

    /// Investment date shifted by the contract duration. A 29 February
    /// start ending in a non-leap year falls back to 28 February.
    pub fn contract_end_date(&self) -> Option<NaiveDate> {
        let year = self
            .investment_date
            .year()
            .checked_add(i32::try_from(self.contract_duration_years).ok()?)?;
        self.investment_date.with_year(year).or_else(|| {
            NaiveDate::from_ymd_opt(year, self.investment_date.month(), 28)
        })
    }
}

/// Tenant company details.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tenant {
    pub user_id: i64,
    pub company_activity: String,
    pub authorized_person: String,
    pub authorized_person_id: String,
    pub emergency_contact: Option<String>,
    pub insurance_policy: Option<String>,
    pub insurance_expiry: Option<NaiveDate>,
}

impl Tenant {
    pub fn has_valid_insurance(&self, today: NaiveDate) -> bool {
        self.insurance_expiry.is_some_and(|expiry| expiry >= today)
    }
}

/// Generic profile every account may carry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserProfile {
    pub user_id: i64,
    pub avatar_url: Option<String>,
    pub nationality: Option<String>,
    pub address: Option<String>,
    pub emergency_contact: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Editable part of [`UserProfile`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UserProfileData {
    pub avatar_url: Option<String>,
    pub nationality: Option<String>,
    pub address: Option<String>,
    pub emergency_contact: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_contract_end_date_adds_duration() {
        let mut investor = Investor::new(1, NaiveDate::from_ymd_opt(2022, 3, 10).unwrap());
        investor.contract_duration_years = 5;
        assert_eq!(
            investor.contract_end_date(),
            NaiveDate::from_ymd_opt(2027, 3, 10)
        );
    }

    #[test]
    fn test_contract_end_date_handles_leap_day() {
        let investor = Investor::new(1, NaiveDate::from_ymd_opt(2024, 2, 29).unwrap());
        assert_eq!(
            investor.contract_end_date(),
            NaiveDate::from_ymd_opt(2025, 2, 28)
        );
    }

    #[test]
    fn test_insurance_validity() {
        let today = NaiveDate::from_ymd_opt(2024, 5, 1).unwrap();
        let mut tenant = Tenant {
            user_id: 1,
            company_activity: "Retail".to_string(),
            authorized_person: "Aisha".to_string(),
            authorized_person_id: "998877".to_string(),
            emergency_contact: None,
            insurance_policy: Some("POL-1".to_string()),
            insurance_expiry: None,
        };
        assert!(!tenant.has_valid_insurance(today));

        tenant.insurance_expiry = Some(today);
        assert!(tenant.has_valid_insurance(today));

        tenant.insurance_expiry = today.pred_opt();
        assert!(!tenant.has_valid_insurance(today));
    }

    #[test]
    fn test_owner_defaults_to_full_ownership() {
        let owner = Owner::new(3);
        assert_eq!(owner.ownership_percentage.to_string(), "100.00");
        assert_eq!(owner.preferred_payment_method, PaymentMethod::Bank);
    }

    #[test]
    fn test_profile_kind_maps_to_role() {
        assert_eq!(ProfileKind::Owner.required_user_type(), UserType::Owner);
        assert_eq!(ProfileKind::Investor.required_user_type(), UserType::Investor);
        assert_eq!(ProfileKind::Tenant.required_user_type(), UserType::Tenant);
    }
}
