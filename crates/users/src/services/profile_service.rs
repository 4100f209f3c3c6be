//! Role profiles attached to accounts.

use rental_database::{
    Investor, Owner, ProfileKind, ProfileRepository, Tenant, User, UserProfile, UserProfileData,
    UserResult, UserType,
};
use tracing::info;

use super::mock_repositories::MockProfileRepository;
use super::user_service::{UserRepo, UserService};
use crate::forms::{InvestorForm, OwnerForm, TenantForm};
use crate::types::{AccountError, AccountResult, UserProfiles};
use crate::utils::validation::validate_url;

impl<R, P> UserService<R, P>
where
    R: UserRepo,
    P: ProfileRepo,
{
    pub async fn upsert_owner(&self, user_id: i64, form: OwnerForm) -> AccountResult<Owner> {
        form.validate()?;
        self.require_role(user_id, ProfileKind::Owner).await?;
        let owner = self.profiles.upsert_owner(&form.into_owner(user_id)).await?;
        info!(user_id, "owner profile saved");
        Ok(owner)
    }

    pub async fn upsert_investor(
        &self,
        user_id: i64,
        form: InvestorForm,
    ) -> AccountResult<Investor> {
        form.validate()?;
        self.require_role(user_id, ProfileKind::Investor).await?;
        let investor = self
            .profiles
            .upsert_investor(&form.into_investor(user_id))
            .await?;
        info!(user_id, "investor profile saved");
        Ok(investor)
    }

    pub async fn upsert_tenant(&self, user_id: i64, form: TenantForm) -> AccountResult<Tenant> {
        form.validate()?;
        self.require_role(user_id, ProfileKind::Tenant).await?;
        let tenant = self.profiles.upsert_tenant(&form.into_tenant(user_id)).await?;
        info!(user_id, "tenant profile saved");
        Ok(tenant)
    }

    pub async fn upsert_user_profile(
        &self,
        user_id: i64,
        data: UserProfileData,
    ) -> AccountResult<UserProfile> {
        if let Some(url) = data.avatar_url.as_deref() {
            validate_url("avatar_url", url)?;
        }
        if let Some(nationality) = data.nationality.as_deref() {
            if nationality.len() != 2 || !nationality.chars().all(|c| c.is_ascii_alphabetic()) {
                return Err(AccountError::validation(
                    "nationality: expected a two-letter ISO country code",
                ));
            }
        }

        self.get_user(user_id).await?;
        Ok(self.profiles.upsert_user_profile(user_id, &data).await?)
    }

    /// Every profile attached to `user_id`.
    pub async fn get_profiles(&self, user_id: i64) -> AccountResult<UserProfiles> {
        self.get_user(user_id).await?;
        Ok(UserProfiles {
            owner: self.profiles.find_owner(user_id).await?,
            investor: self.profiles.find_investor(user_id).await?,
            tenant: self.profiles.find_tenant(user_id).await?,
            profile: self.profiles.find_user_profile(user_id).await?,
        })
    }

    /// Role profiles stored for `user_id` whose kind no longer matches `user_type`.
    pub(crate) async fn mismatched_profiles(
        &self,
        user_id: i64,
        user_type: UserType,
    ) -> AccountResult<Vec<ProfileKind>> {
        let mut present = Vec::new();
        if self.profiles.find_owner(user_id).await?.is_some() {
            present.push(ProfileKind::Owner);
        }
        if self.profiles.find_investor(user_id).await?.is_some() {
            present.push(ProfileKind::Investor);
        }
        if self.profiles.find_tenant(user_id).await?.is_some() {
            present.push(ProfileKind::Tenant);
        }
        present.retain(|kind| kind.required_user_type() != user_type);
        Ok(present)
    }

    async fn require_role(&self, user_id: i64, kind: ProfileKind) -> AccountResult<User> {
        let user = self.get_user(user_id).await?;
        let expected = kind.required_user_type();
        if user.user_type != expected {
            return Err(AccountError::ProfileRoleMismatch {
                kind,
                expected,
                actual: user.user_type,
            });
        }
        Ok(user)
    }
}

/// Trait for profile repositories to allow generic usage
pub trait ProfileRepo {
    async fn find_owner(&self, user_id: i64) -> UserResult<Option<Owner>>;
    async fn upsert_owner(&self, owner: &Owner) -> UserResult<Owner>;
    async fn find_investor(&self, user_id: i64) -> UserResult<Option<Investor>>;
    async fn upsert_investor(&self, investor: &Investor) -> UserResult<Investor>;
    async fn find_tenant(&self, user_id: i64) -> UserResult<Option<Tenant>>;
    async fn upsert_tenant(&self, tenant: &Tenant) -> UserResult<Tenant>;
    async fn find_user_profile(&self, user_id: i64) -> UserResult<Option<UserProfile>>;
    async fn upsert_user_profile(
        &self,
        user_id: i64,
        data: &UserProfileData,
    ) -> UserResult<UserProfile>;
    async fn create_user_profile_if_missing(&self, user_id: i64) -> UserResult<bool>;
}

impl ProfileRepo for ProfileRepository {
    async fn find_owner(&self, user_id: i64) -> UserResult<Option<Owner>> {
        self.find_owner(user_id).await
    }

    async fn upsert_owner(&self, owner: &Owner) -> UserResult<Owner> {
        self.upsert_owner(owner).await
    }

    async fn find_investor(&self, user_id: i64) -> UserResult<Option<Investor>> {
        self.find_investor(user_id).await
    }

    async fn upsert_investor(&self, investor: &Investor) -> UserResult<Investor> {
        self.upsert_investor(investor).await
    }

    async fn find_tenant(&self, user_id: i64) -> UserResult<Option<Tenant>> {
        self.find_tenant(user_id).await
    }

    async fn upsert_tenant(&self, tenant: &Tenant) -> UserResult<Tenant> {
        self.upsert_tenant(tenant).await
    }

    async fn find_user_profile(&self, user_id: i64) -> UserResult<Option<UserProfile>> {
        self.find_user_profile(user_id).await
    }

    async fn upsert_user_profile(
        &self,
        user_id: i64,
        data: &UserProfileData,
    ) -> UserResult<UserProfile> {
        self.upsert_user_profile(user_id, data).await
    }

    async fn create_user_profile_if_missing(&self, user_id: i64) -> UserResult<bool> {
        self.create_user_profile_if_missing(user_id).await
    }
}

impl ProfileRepo for MockProfileRepository {
    async fn find_owner(&self, user_id: i64) -> UserResult<Option<Owner>> {
        self.find_owner(user_id).await
    }

    async fn upsert_owner(&self, owner: &Owner) -> UserResult<Owner> {
        self.upsert_owner(owner).await
    }

    async fn find_investor(&self, user_id: i64) -> UserResult<Option<Investor>> {
        self.find_investor(user_id).await
    }

    async fn upsert_investor(&self, investor: &Investor) -> UserResult<Investor> {
        self.upsert_investor(investor).await
    }

    async fn find_tenant(&self, user_id: i64) -> UserResult<Option<Tenant>> {
        self.find_tenant(user_id).await
    }

    async fn upsert_tenant(&self, tenant: &Tenant) -> UserResult<Tenant> {
        self.upsert_tenant(tenant).await
    }

    async fn find_user_profile(&self, user_id: i64) -> UserResult<Option<UserProfile>> {
        self.find_user_profile(user_id).await
    }

    async fn upsert_user_profile(
        &self,
        user_id: i64,
        data: &UserProfileData,
    ) -> UserResult<UserProfile> {
        self.upsert_user_profile(user_id, data).await
    }

    async fn create_user_profile_if_missing(&self, user_id: i64) -> UserResult<bool> {
        self.create_user_profile_if_missing(user_id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::mock_repositories::MockUserRepository;
    use crate::services::notification_service::{InMemoryMailer, NotificationService};
    use crate::types::CreateUserRequest;
    use chrono::NaiveDate;
    use rental_config::MailConfig;
    use rental_database::{UserError, UserType};
    use rust_decimal::Decimal;
    use std::sync::Arc;

    fn service() -> UserService<MockUserRepository, MockProfileRepository> {
        let notifications =
            NotificationService::new(Arc::new(InMemoryMailer::new()), &MailConfig::default())
                .unwrap();
        UserService::new_for_testing(notifications)
    }

    async fn user_of(
        service: &UserService<MockUserRepository, MockProfileRepository>,
        email: &str,
        user_type: UserType,
    ) -> User {
        let request = CreateUserRequest::new(email, "Acme", email.len().to_string())
            .with_user_type(user_type);
        service.create_user(request).await.unwrap()
    }

    #[tokio::test]
    async fn test_owner_profile_requires_owner_role() {
        let service = service();
        let tenant = user_of(&service, "t@x.com", UserType::Tenant).await;

        let result = service.upsert_owner(tenant.id, OwnerForm::default()).await;
        assert!(matches!(
            result,
            Err(AccountError::ProfileRoleMismatch {
                kind: ProfileKind::Owner,
                expected: UserType::Owner,
                actual: UserType::Tenant,
            })
        ));
    }

    #[tokio::test]
    async fn test_owner_profile_upsert_replaces() {
        let service = service();
        let owner = user_of(&service, "o@x.com", UserType::Owner).await;

        service.upsert_owner(owner.id, OwnerForm::default()).await.unwrap();
        let updated = service
            .upsert_owner(
                owner.id,
                OwnerForm {
                    ownership_percentage: Some(Decimal::new(5050, 2)),
                    iban_number: Some("OM810180000001299123456".to_string()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        assert_eq!(updated.ownership_percentage, Decimal::new(5050, 2));
        let profiles = service.get_profiles(owner.id).await.unwrap();
        assert_eq!(profiles.owner, Some(updated));
        assert!(profiles.tenant.is_none());
        assert!(profiles.profile.is_some());
    }

    #[tokio::test]
    async fn test_investor_and_tenant_profiles() {
        let service = service();
        let investor = user_of(&service, "i@x.com", UserType::Investor).await;
        let tenant = user_of(&service, "tn@x.com", UserType::Tenant).await;

        let saved = service
            .upsert_investor(
                investor.id,
                InvestorForm {
                    investment_amount: Some(Decimal::new(250000, 0)),
                    investment_percentage: Some(Decimal::new(25, 0)),
                    investment_date: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
                    contract_duration_years: Some(3),
                    bank_details: None,
                },
            )
            .await
            .unwrap();
        assert_eq!(
            saved.contract_end_date(),
            NaiveDate::from_ymd_opt(2027, 1, 1)
        );

        let saved = service
            .upsert_tenant(
                tenant.id,
                TenantForm {
                    company_activity: "Retail".to_string(),
                    authorized_person: "Salim".to_string(),
                    authorized_person_id: "9988776".to_string(),
                    emergency_contact: None,
                    insurance_policy: Some("POL-1".to_string()),
                    insurance_expiry: None,
                },
            )
            .await
            .unwrap();
        assert_eq!(saved.authorized_person, "Salim");
    }

    #[tokio::test]
    async fn test_profiles_of_missing_user() {
        let service = service();
        assert!(matches!(
            service.get_profiles(42).await,
            Err(AccountError::Store(UserError::UserNotFound))
        ));
    }

    #[tokio::test]
    async fn test_user_profile_validation() {
        let service = service();
        let user = user_of(&service, "c@x.com", UserType::Company).await;

        let bad = UserProfileData {
            avatar_url: Some("not a url".to_string()),
            ..Default::default()
        };
        assert!(service.upsert_user_profile(user.id, bad).await.is_err());

        let good = UserProfileData {
            nationality: Some("OM".to_string()),
            ..Default::default()
        };
        let profile = service.upsert_user_profile(user.id, good).await.unwrap();
        assert_eq!(profile.nationality.as_deref(), Some("OM"));
    }
}
