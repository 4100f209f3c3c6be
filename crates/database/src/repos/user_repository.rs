//! User repository for database operations.

use crate::entities::user::{
    enforce_company_fields, CompanyDetails, CompanyType, NewUser, User, UserFilter,
};
use crate::types::{UserError, UserResult};
use chrono::Utc;
use sqlx::sqlite::SqliteRow;
use sqlx::{QueryBuilder, Row, Sqlite, SqlitePool};
use tracing::warn;

const USER_COLUMNS: &str = "id, public_id, email, phone, whatsapp, first_name, last_name, id_number, \
     user_type, company_name, company_name_english, company_type, commercial_registration, \
     company_license, tax_number, establishment_date, country, city, address, postal_code, \
     website, preferred_language, password_hash, is_verified, verification_token, is_active, \
     is_staff, is_superuser, last_login_at, created_at, updated_at";

/// Hard cap on rows returned by a single list call.
pub const MAX_PAGE_SIZE: u32 = 100;

/// Repository for user database operations
#[derive(Clone)]
pub struct UserRepository {
    pool: SqlitePool,
}

impl UserRepository {
    /// Create a new user repository
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Find user by ID
    pub async fn find_by_id(&self, id: i64) -> UserResult<Option<User>> {
        let query = format!("SELECT {USER_COLUMNS} FROM users WHERE id = ?");
        let row = sqlx::query(&query)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        row.as_ref().map(map_user_row).transpose()
    }

    /// Find user by public ID
    pub async fn find_by_public_id(&self, public_id: &str) -> UserResult<Option<User>> {
        let query = format!("SELECT {USER_COLUMNS} FROM users WHERE public_id = ?");
        let row = sqlx::query(&query)
            .bind(public_id)
            .fetch_optional(&self.pool)
            .await?;
        row.as_ref().map(map_user_row).transpose()
    }

    /// Find user by email, case-insensitively
    pub async fn find_by_email(&self, email: &str) -> UserResult<Option<User>> {
        let query = format!("SELECT {USER_COLUMNS} FROM users WHERE email = ? COLLATE NOCASE");
        let row = sqlx::query(&query)
            .bind(email.trim())
            .fetch_optional(&self.pool)
            .await?;
        row.as_ref().map(map_user_row).transpose()
    }

    /// Find the user a verification token was issued to
    pub async fn find_by_verification_token(&self, token: &str) -> UserResult<Option<User>> {
        let query = format!("SELECT {USER_COLUMNS} FROM users WHERE verification_token = ?");
        let row = sqlx::query(&query)
            .bind(token)
            .fetch_optional(&self.pool)
            .await?;
        row.as_ref().map(map_user_row).transpose()
    }

    /// Insert a new user. Unique violations surface as the matching `*AlreadyExists` error.
    pub async fn create(&self, new_user: &NewUser) -> UserResult<User> {
        let now = Utc::now();
        let public_id = cuid2::cuid();
        let verification_token = uuid::Uuid::new_v4().to_string();

        let mut company = new_user.company.clone();
        enforce_company_fields(new_user.user_type, &mut company);

        let result = sqlx::query(
            r#"
            INSERT INTO users (
                public_id, email, phone, whatsapp, first_name, last_name, id_number,
                user_type, company_name, company_name_english, company_type,
                commercial_registration, company_license, tax_number, establishment_date,
                country, city, address, postal_code, website, preferred_language,
                password_hash, is_verified, verification_token, is_active, is_staff,
                is_superuser, created_at, updated_at
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&public_id)
        .bind(&new_user.email)
        .bind(&new_user.phone)
        .bind(&new_user.whatsapp)
        .bind(&new_user.first_name)
        .bind(&new_user.last_name)
        .bind(&new_user.id_number)
        .bind(new_user.user_type.as_str())
        .bind(&company.name)
        .bind(&company.name_english)
        .bind(company.company_type.map(|t| t.as_str()))
        .bind(&company.commercial_registration)
        .bind(&company.license)
        .bind(&company.tax_number)
        .bind(company.establishment_date)
        .bind(new_user.country.as_deref().unwrap_or("OM"))
        .bind(new_user.city.as_deref().unwrap_or("Muscat"))
        .bind(&new_user.address)
        .bind(&new_user.postal_code)
        .bind(&new_user.website)
        .bind(new_user.preferred_language.as_str())
        .bind(&new_user.password_hash)
        .bind(new_user.is_verified)
        .bind(&verification_token)
        .bind(new_user.is_active)
        .bind(new_user.is_staff)
        .bind(new_user.is_superuser)
        .bind(now)
        .bind(now)
        .execute(&self.pool)
        .await?;

        let user_id = result.last_insert_rowid();

        self.find_by_id(user_id).await?.ok_or_else(|| {
            UserError::DatabaseError("Failed to retrieve created user".to_string())
        })
    }

    /// Persist every mutable column of `user`.
    ///
    /// Company details are cleared first when the role is not company; the
    /// verification token and creation time are never written.
    pub async fn save(&self, user: &User) -> UserResult<User> {
        let now = Utc::now();
        let mut company: CompanyDetails = user.company.clone();
        if enforce_company_fields(user.user_type, &mut company) {
            warn!(
                user_id = user.id,
                user_type = %user.user_type,
                "discarding company details for non-company account"
            );
        }

        let result = sqlx::query(
            r#"
            UPDATE users SET
                email = ?, phone = ?, whatsapp = ?, first_name = ?, last_name = ?, id_number = ?,
                user_type = ?, company_name = ?, company_name_english = ?, company_type = ?,
                commercial_registration = ?, company_license = ?, tax_number = ?,
                establishment_date = ?, country = ?, city = ?, address = ?, postal_code = ?,
                website = ?, preferred_language = ?, password_hash = ?, is_verified = ?,
                is_active = ?, is_staff = ?, is_superuser = ?, last_login_at = ?, updated_at = ?
            WHERE id = ?
            "#,
        )
        .bind(&user.email)
        .bind(&user.phone)
        .bind(&user.whatsapp)
        .bind(&user.first_name)
        .bind(&user.last_name)
        .bind(&user.id_number)
        .bind(user.user_type.as_str())
        .bind(&company.name)
        .bind(&company.name_english)
        .bind(company.company_type.map(|t| t.as_str()))
        .bind(&company.commercial_registration)
        .bind(&company.license)
        .bind(&company.tax_number)
        .bind(company.establishment_date)
        .bind(&user.country)
        .bind(&user.city)
        .bind(&user.address)
        .bind(&user.postal_code)
        .bind(&user.website)
        .bind(user.preferred_language.as_str())
        .bind(&user.password_hash)
        .bind(user.is_verified)
        .bind(user.is_active)
        .bind(user.is_staff)
        .bind(user.is_superuser)
        .bind(user.last_login_at)
        .bind(now)
        .bind(user.id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(UserError::UserNotFound);
        }

        self.find_by_id(user.id).await?.ok_or(UserError::UserNotFound)
    }

    /// Update user last login
    pub async fn update_last_login(&self, id: i64) -> UserResult<()> {
        let now = Utc::now();

        let result = sqlx::query("UPDATE users SET last_login_at = ?, updated_at = ? WHERE id = ?")
            .bind(now)
            .bind(now)
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(UserError::UserNotFound);
        }

        Ok(())
    }

    /// Replace the stored password hash; `None` makes the password unusable
    pub async fn update_password(&self, user_id: i64, password_hash: Option<&str>) -> UserResult<()> {
        let now = Utc::now();

        let result = sqlx::query("UPDATE users SET password_hash = ?, updated_at = ? WHERE id = ?")
            .bind(password_hash)
            .bind(now)
            .bind(user_id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(UserError::UserNotFound);
        }

        Ok(())
    }

    /// Set `is_verified` on every listed user in one statement
    pub async fn batch_set_verified(&self, user_ids: &[i64], verified: bool) -> UserResult<u64> {
        self.batch_set_flag("is_verified", user_ids, verified).await
    }

    /// Set `is_active` on every listed user in one statement
    pub async fn batch_set_active(&self, user_ids: &[i64], active: bool) -> UserResult<u64> {
        self.batch_set_flag("is_active", user_ids, active).await
    }

    async fn batch_set_flag(&self, column: &'static str, user_ids: &[i64], value: bool) -> UserResult<u64> {
        if user_ids.is_empty() {
            return Ok(0);
        }

        // Every matched row counts, including ones already carrying the flag.
        let mut builder: QueryBuilder<Sqlite> = QueryBuilder::new("UPDATE users SET ");
        builder.push(column).push(" = ");
        builder.push_bind(value);
        builder.push(", updated_at = ");
        builder.push_bind(Utc::now());
        builder.push(" WHERE id IN (");
        let mut separated = builder.separated(", ");
        for id in user_ids {
            separated.push_bind(*id);
        }
        separated.push_unseparated(")");

        let result = builder.build().execute(&self.pool).await?;
        Ok(result.rows_affected())
    }

    /// Users with the given ids, ordered like the admin list
    pub async fn find_many(&self, user_ids: &[i64]) -> UserResult<Vec<User>> {
        if user_ids.is_empty() {
            return Ok(Vec::new());
        }

        let mut builder: QueryBuilder<Sqlite> = QueryBuilder::new("SELECT ");
        builder.push(USER_COLUMNS).push(" FROM users WHERE id IN (");
        let mut separated = builder.separated(", ");
        for id in user_ids {
            separated.push_bind(*id);
        }
        separated.push_unseparated(")");
        builder.push(" ORDER BY company_name IS NULL, company_name, id");

        let rows = builder.build().fetch_all(&self.pool).await?;
        rows.iter().map(map_user_row).collect()
    }

    /// Filtered, searched and paginated list ordered by company name
    pub async fn list(&self, filter: &UserFilter, limit: u32, offset: u32) -> UserResult<Vec<User>> {
        let mut builder: QueryBuilder<Sqlite> = QueryBuilder::new("SELECT ");
        builder.push(USER_COLUMNS).push(" FROM users");
        push_filter(&mut builder, filter);
        builder.push(" ORDER BY company_name IS NULL, company_name, id LIMIT ");
        builder.push_bind(i64::from(limit.min(MAX_PAGE_SIZE)));
        builder.push(" OFFSET ");
        builder.push_bind(i64::from(offset));

        let rows = builder.build().fetch_all(&self.pool).await?;
        rows.iter().map(map_user_row).collect()
    }

    /// Number of users matching `filter`
    pub async fn count(&self, filter: &UserFilter) -> UserResult<i64> {
        let mut builder: QueryBuilder<Sqlite> = QueryBuilder::new("SELECT COUNT(*) FROM users");
        push_filter(&mut builder, filter);
        let count: i64 = builder.build_query_scalar().fetch_one(&self.pool).await?;
        Ok(count)
    }
}

fn push_filter(builder: &mut QueryBuilder<'_, Sqlite>, filter: &UserFilter) {
    builder.push(" WHERE 1 = 1");

    if let Some(user_type) = filter.user_type {
        builder.push(" AND user_type = ").push_bind(user_type.as_str());
    }
    if let Some(company_type) = filter.company_type {
        builder.push(" AND company_type = ").push_bind(company_type.as_str());
    }
    if let Some(verified) = filter.is_verified {
        builder.push(" AND is_verified = ").push_bind(verified);
    }
    if let Some(active) = filter.is_active {
        builder.push(" AND is_active = ").push_bind(active);
    }
    if let Some(staff) = filter.is_staff {
        builder.push(" AND is_staff = ").push_bind(staff);
    }
    if let Some(term) = filter.search.as_deref().map(str::trim).filter(|t| !t.is_empty()) {
        let pattern = format!("%{}%", term);
        builder.push(" AND (");
        let mut separated = builder.separated(" OR ");
        for column in [
            "email",
            "phone",
            "first_name",
            "last_name",
            "company_name",
            "commercial_registration",
        ] {
            separated.push(column);
            separated.push_unseparated(" LIKE ");
            separated.push_bind_unseparated(pattern.clone());
        }
        separated.push_unseparated(")");
    }
}

fn parse_column<T>(row: &SqliteRow, column: &str) -> UserResult<T>
where
    T: std::str::FromStr<Err = String>,
{
    let raw: String = row.try_get(column)?;
    raw.parse::<T>()
        .map_err(|e| UserError::SerializationError(format!("{column}: {e}")))
}

fn map_user_row(row: &SqliteRow) -> UserResult<User> {
    let company_type: Option<String> = row.try_get("company_type")?;
    let company_type = company_type
        .map(|raw| raw.parse::<CompanyType>())
        .transpose()
        .map_err(|e| UserError::SerializationError(format!("company_type: {e}")))?;

    Ok(User {
        id: row.try_get("id")?,
        public_id: row.try_get("public_id")?,
        email: row.try_get("email")?,
        phone: row.try_get("phone")?,
        whatsapp: row.try_get("whatsapp")?,
        first_name: row.try_get("first_name")?,
        last_name: row.try_get("last_name")?,
        id_number: row.try_get("id_number")?,
        user_type: parse_column(row, "user_type")?,
        company: CompanyDetails {
            name: row.try_get("company_name")?,
            name_english: row.try_get("company_name_english")?,
            company_type,
            commercial_registration: row.try_get("commercial_registration")?,
            license: row.try_get("company_license")?,
            tax_number: row.try_get("tax_number")?,
            establishment_date: row.try_get("establishment_date")?,
        },
        country: row.try_get("country")?,
        city: row.try_get("city")?,
        address: row.try_get("address")?,
        postal_code: row.try_get("postal_code")?,
        website: row.try_get("website")?,
        preferred_language: parse_column(row, "preferred_language")?,
        password_hash: row.try_get("password_hash")?,
        is_verified: row.try_get("is_verified")?,
        verification_token: row.try_get("verification_token")?,
        is_active: row.try_get("is_active")?,
        is_staff: row.try_get("is_staff")?,
        is_superuser: row.try_get("is_superuser")?,
        last_login_at: row.try_get("last_login_at")?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}
