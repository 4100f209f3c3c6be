//! In-memory repository implementations for exercising the services without SQLite.

use chrono::Utc;
use rental_database::{
    enforce_company_fields, Investor, NewUser, Owner, Tenant, User, UserError, UserFilter,
    UserProfile, UserProfileData, UserResult, MAX_PAGE_SIZE,
};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

/// Mock user repository with the same uniqueness rules as the SQLite schema
#[derive(Clone, Default)]
pub struct MockUserRepository {
    users: Arc<RwLock<HashMap<i64, User>>>,
    next_id: Arc<RwLock<i64>>,
}

impl MockUserRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn find_by_id(&self, user_id: i64) -> UserResult<Option<User>> {
        let users = self.users.read().await;
        Ok(users.get(&user_id).cloned())
    }

    pub async fn find_by_public_id(&self, public_id: &str) -> UserResult<Option<User>> {
        let users = self.users.read().await;
        Ok(users.values().find(|u| u.public_id == public_id).cloned())
    }

    pub async fn find_by_email(&self, email: &str) -> UserResult<Option<User>> {
        let users = self.users.read().await;
        let email = email.trim();
        Ok(users
            .values()
            .find(|u| u.email.eq_ignore_ascii_case(email))
            .cloned())
    }

    pub async fn find_by_verification_token(&self, token: &str) -> UserResult<Option<User>> {
        let users = self.users.read().await;
        Ok(users
            .values()
            .find(|u| u.verification_token == token)
            .cloned())
    }

    pub async fn create(&self, new_user: &NewUser) -> UserResult<User> {
        let mut users = self.users.write().await;
        let mut next_id = self.next_id.write().await;
        *next_id += 1;
        let user_id = *next_id;
        let now = Utc::now();

        let mut company = new_user.company.clone();
        enforce_company_fields(new_user.user_type, &mut company);

        let user = User {
            id: user_id,
            public_id: cuid2::cuid(),
            email: new_user.email.clone(),
            phone: new_user.phone.clone(),
            whatsapp: new_user.whatsapp.clone(),
            first_name: new_user.first_name.clone(),
            last_name: new_user.last_name.clone(),
            id_number: new_user.id_number.clone(),
            user_type: new_user.user_type,
            company,
            country: new_user.country.clone().unwrap_or_else(|| "OM".to_string()),
            city: new_user.city.clone().unwrap_or_else(|| "Muscat".to_string()),
            address: new_user.address.clone(),
            postal_code: new_user.postal_code.clone(),
            website: new_user.website.clone(),
            preferred_language: new_user.preferred_language,
            password_hash: new_user.password_hash.clone(),
            is_verified: new_user.is_verified,
            verification_token: uuid::Uuid::new_v4().to_string(),
            is_active: new_user.is_active,
            is_staff: new_user.is_staff,
            is_superuser: new_user.is_superuser,
            last_login_at: None,
            created_at: now,
            updated_at: now,
        };

        check_unique(&users, &user)?;
        users.insert(user_id, user.clone());
        Ok(user)
    }

    pub async fn save(&self, user: &User) -> UserResult<User> {
        let mut users = self.users.write().await;
        let existing = users.get(&user.id).ok_or(UserError::UserNotFound)?;

        let mut saved = user.clone();
        enforce_company_fields(saved.user_type, &mut saved.company);
        saved.verification_token = existing.verification_token.clone();
        saved.public_id = existing.public_id.clone();
        saved.created_at = existing.created_at;
        saved.updated_at = Utc::now();

        check_unique(&users, &saved)?;
        users.insert(saved.id, saved.clone());
        Ok(saved)
    }

    pub async fn update_last_login(&self, user_id: i64) -> UserResult<()> {
        let mut users = self.users.write().await;
        let user = users.get_mut(&user_id).ok_or(UserError::UserNotFound)?;
        let now = Utc::now();
        user.last_login_at = Some(now);
        user.updated_at = now;
        Ok(())
    }

    pub async fn update_password(&self, user_id: i64, password_hash: Option<&str>) -> UserResult<()> {
        let mut users = self.users.write().await;
        let user = users.get_mut(&user_id).ok_or(UserError::UserNotFound)?;
        user.password_hash = password_hash.map(str::to_string);
        user.updated_at = Utc::now();
        Ok(())
    }

    pub async fn batch_set_verified(&self, user_ids: &[i64], verified: bool) -> UserResult<u64> {
        let mut users = self.users.write().await;
        let mut matched = 0;
        for id in user_ids {
            if let Some(user) = users.get_mut(id) {
                user.is_verified = verified;
                user.updated_at = Utc::now();
                matched += 1;
            }
        }
        Ok(matched)
    }

    pub async fn batch_set_active(&self, user_ids: &[i64], active: bool) -> UserResult<u64> {
        let mut users = self.users.write().await;
        let mut matched = 0;
        for id in user_ids {
            if let Some(user) = users.get_mut(id) {
                user.is_active = active;
                user.updated_at = Utc::now();
                matched += 1;
            }
        }
        Ok(matched)
    }

    pub async fn find_many(&self, user_ids: &[i64]) -> UserResult<Vec<User>> {
        let users = self.users.read().await;
        let mut found: Vec<User> = user_ids
            .iter()
            .filter_map(|id| users.get(id).cloned())
            .collect();
        found.sort_by(list_order);
        found.dedup_by_key(|u| u.id);
        Ok(found)
    }

    pub async fn list(&self, filter: &UserFilter, limit: u32, offset: u32) -> UserResult<Vec<User>> {
        let users = self.users.read().await;
        let mut results: Vec<User> = users.values().filter(|u| filter.matches(u)).cloned().collect();
        results.sort_by(list_order);
        Ok(results
            .into_iter()
            .skip(offset as usize)
            .take(limit.min(MAX_PAGE_SIZE) as usize)
            .collect())
    }

    pub async fn count(&self, filter: &UserFilter) -> UserResult<i64> {
        let users = self.users.read().await;
        Ok(users.values().filter(|u| filter.matches(u)).count() as i64)
    }
}

/// Company name ascending with unnamed accounts last, then id.
fn list_order(a: &User, b: &User) -> std::cmp::Ordering {
    let key = |u: &User| (u.company.name.is_none(), u.company.name.clone(), u.id);
    key(a).cmp(&key(b))
}

fn check_unique(users: &HashMap<i64, User>, candidate: &User) -> UserResult<()> {
    for other in users.values().filter(|u| u.id != candidate.id) {
        if other.email.eq_ignore_ascii_case(&candidate.email) {
            return Err(UserError::EmailAlreadyExists);
        }
        if candidate.phone.is_some() && other.phone == candidate.phone {
            return Err(UserError::PhoneAlreadyExists);
        }
        if candidate.company.commercial_registration.is_some()
            && other.company.commercial_registration == candidate.company.commercial_registration
        {
            return Err(UserError::CommercialRegistrationAlreadyExists);
        }
        if candidate.company.tax_number.is_some()
            && other.company.tax_number == candidate.company.tax_number
        {
            return Err(UserError::TaxNumberAlreadyExists);
        }
    }
    Ok(())
}

/// Mock profile repository keyed by user id
#[derive(Clone, Default)]
pub struct MockProfileRepository {
    owners: Arc<RwLock<HashMap<i64, Owner>>>,
    investors: Arc<RwLock<HashMap<i64, Investor>>>,
    tenants: Arc<RwLock<HashMap<i64, Tenant>>>,
    profiles: Arc<RwLock<HashMap<i64, UserProfile>>>,
}

impl MockProfileRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn find_owner(&self, user_id: i64) -> UserResult<Option<Owner>> {
        Ok(self.owners.read().await.get(&user_id).cloned())
    }

    pub async fn upsert_owner(&self, owner: &Owner) -> UserResult<Owner> {
        self.owners.write().await.insert(owner.user_id, owner.clone());
        Ok(owner.clone())
    }

    pub async fn find_investor(&self, user_id: i64) -> UserResult<Option<Investor>> {
        Ok(self.investors.read().await.get(&user_id).cloned())
    }

    pub async fn upsert_investor(&self, investor: &Investor) -> UserResult<Investor> {
        self.investors
            .write()
            .await
            .insert(investor.user_id, investor.clone());
        Ok(investor.clone())
    }

    pub async fn find_tenant(&self, user_id: i64) -> UserResult<Option<Tenant>> {
        Ok(self.tenants.read().await.get(&user_id).cloned())
    }

    pub async fn upsert_tenant(&self, tenant: &Tenant) -> UserResult<Tenant> {
        self.tenants.write().await.insert(tenant.user_id, tenant.clone());
        Ok(tenant.clone())
    }

    pub async fn find_user_profile(&self, user_id: i64) -> UserResult<Option<UserProfile>> {
        Ok(self.profiles.read().await.get(&user_id).cloned())
    }

    pub async fn upsert_user_profile(
        &self,
        user_id: i64,
        data: &UserProfileData,
    ) -> UserResult<UserProfile> {
        let mut profiles = self.profiles.write().await;
        let now = Utc::now();
        let created_at = profiles.get(&user_id).map_or(now, |p| p.created_at);
        let profile = UserProfile {
            user_id,
            avatar_url: data.avatar_url.clone(),
            nationality: data.nationality.clone(),
            address: data.address.clone(),
            emergency_contact: data.emergency_contact.clone(),
            created_at,
            updated_at: now,
        };
        profiles.insert(user_id, profile.clone());
        Ok(profile)
    }

    pub async fn create_user_profile_if_missing(&self, user_id: i64) -> UserResult<bool> {
        let mut profiles = self.profiles.write().await;
        if profiles.contains_key(&user_id) {
            return Ok(false);
        }
        let now = Utc::now();
        profiles.insert(
            user_id,
            UserProfile {
                user_id,
                avatar_url: None,
                nationality: None,
                address: None,
                emergency_contact: None,
                created_at: now,
                updated_at: now,
            },
        );
        Ok(true)
    }
}
