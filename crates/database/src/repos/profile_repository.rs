//! Repository for the owner, investor, tenant and generic profile tables.

use crate::entities::profile::{Investor, Owner, Tenant, UserProfile, UserProfileData};
use crate::types::{UserError, UserResult};
use chrono::Utc;
use rust_decimal::Decimal;
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};
use std::str::FromStr;

#[derive(Clone)]
pub struct ProfileRepository {
    pool: SqlitePool,
}

impl ProfileRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn find_owner(&self, user_id: i64) -> UserResult<Option<Owner>> {
        let row = sqlx::query(
            "SELECT user_id, ownership_percentage, bank_name, iban_number, preferred_payment_method \
             FROM owners WHERE user_id = ?",
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(|row| {
            Ok(Owner {
                user_id: row.try_get("user_id")?,
                ownership_percentage: decimal_column(&row, "ownership_percentage")?,
                bank_name: row.try_get("bank_name")?,
                iban_number: row.try_get("iban_number")?,
                preferred_payment_method: row
                    .try_get::<String, _>("preferred_payment_method")?
                    .parse()
                    .map_err(UserError::SerializationError)?,
            })
        })
        .transpose()
    }

    /// Insert or replace the owner record for `owner.user_id`.
    pub async fn upsert_owner(&self, owner: &Owner) -> UserResult<Owner> {
        sqlx::query(
            r#"
            INSERT INTO owners (user_id, ownership_percentage, bank_name, iban_number, preferred_payment_method)
            VALUES (?, ?, ?, ?, ?)
            ON CONFLICT(user_id) DO UPDATE SET
                ownership_percentage = excluded.ownership_percentage,
                bank_name = excluded.bank_name,
                iban_number = excluded.iban_number,
                preferred_payment_method = excluded.preferred_payment_method
            "#,
        )
        .bind(owner.user_id)
        .bind(owner.ownership_percentage.to_string())
        .bind(&owner.bank_name)
        .bind(&owner.iban_number)
        .bind(owner.preferred_payment_method.as_str())
        .execute(&self.pool)
        .await?;

        self.find_owner(owner.user_id)
            .await?
            .ok_or(UserError::UserNotFound)
    }

    pub async fn find_investor(&self, user_id: i64) -> UserResult<Option<Investor>> {
        let row = sqlx::query(
            "SELECT user_id, investment_amount, investment_percentage, investment_date, \
             contract_duration_years, bank_details FROM investors WHERE user_id = ?",
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(|row| map_investor_row(&row)).transpose()
    }

    pub async fn upsert_investor(&self, investor: &Investor) -> UserResult<Investor> {
        let bank_details = investor
            .bank_details
            .as_ref()
            .map(serde_json::to_string)
            .transpose()
            .map_err(|e| UserError::SerializationError(e.to_string()))?;

        sqlx::query(
            r#"
            INSERT INTO investors (
                user_id, investment_amount, investment_percentage, investment_date,
                contract_duration_years, bank_details
            ) VALUES (?, ?, ?, ?, ?, ?)
            ON CONFLICT(user_id) DO UPDATE SET
                investment_amount = excluded.investment_amount,
                investment_percentage = excluded.investment_percentage,
                investment_date = excluded.investment_date,
                contract_duration_years = excluded.contract_duration_years,
                bank_details = excluded.bank_details
            "#,
        )
        .bind(investor.user_id)
        .bind(investor.investment_amount.to_string())
        .bind(investor.investment_percentage.to_string())
        .bind(investor.investment_date)
        .bind(i64::from(investor.contract_duration_years))
        .bind(bank_details)
        .execute(&self.pool)
        .await?;

        self.find_investor(investor.user_id)
            .await?
            .ok_or(UserError::UserNotFound)
    }

    pub async fn find_tenant(&self, user_id: i64) -> UserResult<Option<Tenant>> {
        let row = sqlx::query(
            "SELECT user_id, company_activity, authorized_person, authorized_person_id, \
             emergency_contact, insurance_policy, insurance_expiry FROM tenants WHERE user_id = ?",
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(|row| {
            Ok(Tenant {
                user_id: row.try_get("user_id")?,
                company_activity: row.try_get("company_activity")?,
                authorized_person: row.try_get("authorized_person")?,
                authorized_person_id: row.try_get("authorized_person_id")?,
                emergency_contact: row.try_get("emergency_contact")?,
                insurance_policy: row.try_get("insurance_policy")?,
                insurance_expiry: row.try_get("insurance_expiry")?,
            })
        })
        .transpose()
    }

    pub async fn upsert_tenant(&self, tenant: &Tenant) -> UserResult<Tenant> {
        sqlx::query(
            r#"
            INSERT INTO tenants (
                user_id, company_activity, authorized_person, authorized_person_id,
                emergency_contact, insurance_policy, insurance_expiry
            ) VALUES (?, ?, ?, ?, ?, ?, ?)
            ON CONFLICT(user_id) DO UPDATE SET
                company_activity = excluded.company_activity,
                authorized_person = excluded.authorized_person,
                authorized_person_id = excluded.authorized_person_id,
                emergency_contact = excluded.emergency_contact,
                insurance_policy = excluded.insurance_policy,
                insurance_expiry = excluded.insurance_expiry
            "#,
        )
        .bind(tenant.user_id)
        .bind(&tenant.company_activity)
        .bind(&tenant.authorized_person)
        .bind(&tenant.authorized_person_id)
        .bind(&tenant.emergency_contact)
        .bind(&tenant.insurance_policy)
        .bind(tenant.insurance_expiry)
        .execute(&self.pool)
        .await?;

        self.find_tenant(tenant.user_id)
            .await?
            .ok_or(UserError::UserNotFound)
    }

    pub async fn find_user_profile(&self, user_id: i64) -> UserResult<Option<UserProfile>> {
        let row = sqlx::query(
            "SELECT user_id, avatar_url, nationality, address, emergency_contact, created_at, updated_at \
             FROM user_profiles WHERE user_id = ?",
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(|row| map_user_profile_row(&row)).transpose()
    }

    pub async fn upsert_user_profile(
        &self,
        user_id: i64,
        data: &UserProfileData,
    ) -> UserResult<UserProfile> {
        let now = Utc::now();

        sqlx::query(
            r#"
            INSERT INTO user_profiles (
                user_id, avatar_url, nationality, address, emergency_contact, created_at, updated_at
            ) VALUES (?, ?, ?, ?, ?, ?, ?)
            ON CONFLICT(user_id) DO UPDATE SET
                avatar_url = excluded.avatar_url,
                nationality = excluded.nationality,
                address = excluded.address,
                emergency_contact = excluded.emergency_contact,
                updated_at = excluded.updated_at
            "#,
        )
        .bind(user_id)
        .bind(&data.avatar_url)
        .bind(&data.nationality)
        .bind(&data.address)
        .bind(&data.emergency_contact)
        .bind(now)
        .bind(now)
        .execute(&self.pool)
        .await?;

        self.find_user_profile(user_id)
            .await?
            .ok_or(UserError::UserNotFound)
    }

    /// Create an empty generic profile unless one exists. Returns `true` when a row was created.
    pub async fn create_user_profile_if_missing(&self, user_id: i64) -> UserResult<bool> {
        let now = Utc::now();

        let result = sqlx::query(
            "INSERT INTO user_profiles (user_id, created_at, updated_at) VALUES (?, ?, ?) \
             ON CONFLICT(user_id) DO NOTHING",
        )
        .bind(user_id)
        .bind(now)
        .bind(now)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }
}

fn decimal_column(row: &SqliteRow, column: &str) -> UserResult<Decimal> {
    let raw: String = row.try_get(column)?;
    Decimal::from_str(&raw).map_err(|e| UserError::SerializationError(format!("{column}: {e}")))
}

fn map_investor_row(row: &SqliteRow) -> UserResult<Investor> {
    let duration: i64 = row.try_get("contract_duration_years")?;
    let bank_details: Option<String> = row.try_get("bank_details")?;

    Ok(Investor {
        user_id: row.try_get("user_id")?,
        investment_amount: decimal_column(row, "investment_amount")?,
        investment_percentage: decimal_column(row, "investment_percentage")?,
        investment_date: row.try_get("investment_date")?,
        contract_duration_years: u32::try_from(duration)
            .map_err(|e| UserError::SerializationError(format!("contract_duration_years: {e}")))?,
        bank_details: bank_details
            .map(|raw| serde_json::from_str(&raw))
            .transpose()
            .map_err(|e| UserError::SerializationError(format!("bank_details: {e}")))?,
    })
}

fn map_user_profile_row(row: &SqliteRow) -> UserResult<UserProfile> {
    Ok(UserProfile {
        user_id: row.try_get("user_id")?,
        avatar_url: row.try_get("avatar_url")?,
        nationality: row.try_get("nationality")?,
        address: row.try_get("address")?,
        emergency_contact: row.try_get("emergency_contact")?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::profile::PaymentMethod;
    use crate::entities::user::{NewUser, UserType};
    use crate::migrations::run_migrations;
    use crate::repos::UserRepository;
    use chrono::NaiveDate;
    use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
    use tempfile::TempDir;

    async fn setup() -> (ProfileRepository, UserRepository, TempDir) {
        let temp_dir = TempDir::new().unwrap();
        let options = SqliteConnectOptions::new()
            .filename(temp_dir.path().join("profiles.db"))
            .create_if_missing(true)
            .foreign_keys(true);
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect_with(options)
            .await
            .unwrap();
        run_migrations(&pool).await.unwrap();

        (
            ProfileRepository::new(pool.clone()),
            UserRepository::new(pool),
            temp_dir,
        )
    }

    async fn user(users: &UserRepository, email: &str, user_type: UserType) -> i64 {
        users
            .create(&NewUser {
                email: email.to_string(),
                user_type,
                is_active: true,
                ..Default::default()
            })
            .await
            .unwrap()
            .id
    }

    #[tokio::test]
    async fn test_owner_upsert_replaces_existing_row() {
        let (profiles, users, _dir) = setup().await;
        let user_id = user(&users, "owner@x.com", UserType::Owner).await;

        let created = profiles.upsert_owner(&Owner::new(user_id)).await.unwrap();
        assert_eq!(created.ownership_percentage, Decimal::new(10000, 2));

        let mut changed = created.clone();
        changed.ownership_percentage = Decimal::new(5050, 2);
        changed.preferred_payment_method = PaymentMethod::Cheque;
        changed.iban_number = Some("OM810180000001299123456".to_string());
        let updated = profiles.upsert_owner(&changed).await.unwrap();

        assert_eq!(updated, changed);
    }

    #[tokio::test]
    async fn test_investor_round_trips_decimals_and_bank_details() {
        let (profiles, users, _dir) = setup().await;
        let user_id = user(&users, "inv@x.com", UserType::Investor).await;

        let mut investor = Investor::new(user_id, NaiveDate::from_ymd_opt(2023, 1, 1).unwrap());
        investor.investment_amount = Decimal::new(250_000_000, 3);
        investor.investment_percentage = Decimal::new(1250, 2);
        investor.contract_duration_years = 3;
        investor.bank_details = Some(serde_json::json!({"bank": "Bank Muscat", "branch": "Ruwi"}));

        let stored = profiles.upsert_investor(&investor).await.unwrap();
        assert_eq!(stored, investor);
        assert_eq!(stored.contract_end_date(), NaiveDate::from_ymd_opt(2026, 1, 1));
    }

    #[tokio::test]
    async fn test_tenant_round_trip() {
        let (profiles, users, _dir) = setup().await;
        let user_id = user(&users, "tenant@x.com", UserType::Tenant).await;

        let tenant = Tenant {
            user_id,
            company_activity: "Cafe".to_string(),
            authorized_person: "Maryam".to_string(),
            authorized_person_id: "12345678".to_string(),
            emergency_contact: None,
            insurance_policy: Some("P-1".to_string()),
            insurance_expiry: NaiveDate::from_ymd_opt(2030, 12, 31),
        };

        assert_eq!(profiles.upsert_tenant(&tenant).await.unwrap(), tenant);
        assert!(profiles.find_tenant(user_id + 1).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_profile_for_missing_user_is_rejected() {
        let (profiles, _users, _dir) = setup().await;

        let result = profiles.upsert_owner(&Owner::new(42)).await;
        assert_eq!(result.unwrap_err(), UserError::UserNotFound);
    }

    #[tokio::test]
    async fn test_user_profile_created_once() {
        let (profiles, users, _dir) = setup().await;
        let user_id = user(&users, "a@x.com", UserType::Company).await;

        assert!(profiles.create_user_profile_if_missing(user_id).await.unwrap());
        assert!(!profiles.create_user_profile_if_missing(user_id).await.unwrap());

        let data = UserProfileData {
            nationality: Some("Omani".to_string()),
            ..Default::default()
        };
        let profile = profiles.upsert_user_profile(user_id, &data).await.unwrap();
        assert_eq!(profile.nationality.as_deref(), Some("Omani"));
        assert!(profile.avatar_url.is_none());
    }
}
