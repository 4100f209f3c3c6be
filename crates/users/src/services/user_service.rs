//! User service for managing account operations.

use rental_database::{
    NewUser, ProfileRepository, SqlitePool, User, UserError, UserFilter, UserRepository,
    UserResult,
};
use tracing::{info, warn};

use super::mock_repositories::{MockProfileRepository, MockUserRepository};
use super::notification_service::NotificationService;
use super::profile_service::ProfileRepo;
use crate::forms::{RegisterForm, UserChangeForm};
use crate::types::{
    AccountError, AccountResult, CreateUserRequest, NotificationError, PostCreateReport,
};
use crate::utils::password::hash_optional_password;
use crate::utils::validation::normalize_email;

/// Service for managing accounts and their profiles
pub struct UserService<R, P> {
    pub(crate) users: R,
    pub(crate) profiles: P,
    pub(crate) hook: PostCreateHook,
}

/// The service wired to SQLite.
pub type SqliteUserService = UserService<UserRepository, ProfileRepository>;

impl UserService<UserRepository, ProfileRepository> {
    /// Create a new user service backed by the database
    pub fn new(pool: SqlitePool, notifications: NotificationService) -> Self {
        Self {
            users: UserRepository::new(pool.clone()),
            profiles: ProfileRepository::new(pool),
            hook: PostCreateHook::new(notifications),
        }
    }
}

impl UserService<MockUserRepository, MockProfileRepository> {
    /// Create a new user service over in-memory stores
    pub fn new_for_testing(notifications: NotificationService) -> Self {
        Self {
            users: MockUserRepository::new(),
            profiles: MockProfileRepository::new(),
            hook: PostCreateHook::new(notifications),
        }
    }
}

impl<R, P> UserService<R, P>
where
    R: UserRepo,
    P: ProfileRepo,
{
    pub fn with_repositories(users: R, profiles: P, notifications: NotificationService) -> Self {
        Self {
            users,
            profiles,
            hook: PostCreateHook::new(notifications),
        }
    }

    pub fn notifications(&self) -> &NotificationService {
        &self.hook.notifications
    }

    /// Get a user by ID
    pub async fn get_user(&self, user_id: i64) -> AccountResult<User> {
        Ok(self
            .users
            .find_by_id(user_id)
            .await?
            .ok_or(UserError::UserNotFound)?)
    }

    /// Get a user by public ID
    pub async fn get_user_by_public_id(&self, public_id: &str) -> AccountResult<User> {
        Ok(self
            .users
            .find_by_public_id(public_id)
            .await?
            .ok_or(UserError::UserNotFound)?)
    }

    /// Get a user by email, case-insensitively
    pub async fn get_user_by_email(&self, email: &str) -> AccountResult<Option<User>> {
        Ok(self.users.find_by_email(&normalize_email(email)).await?)
    }

    /// Create a regular account. Staff and superuser flags default to off.
    pub async fn create_user(&self, mut request: CreateUserRequest) -> AccountResult<User> {
        request.is_staff.get_or_insert(false);
        request.is_superuser.get_or_insert(false);
        self.persist_new_user(request).await
    }

    /// Create an operator account. Every privilege flag defaults to on and
    /// may not be switched off.
    pub async fn create_superuser(&self, mut request: CreateUserRequest) -> AccountResult<User> {
        let is_staff = *request.is_staff.get_or_insert(true);
        let is_superuser = *request.is_superuser.get_or_insert(true);
        request.is_active.get_or_insert(true);

        if !is_staff {
            return Err(AccountError::InvalidSuperuserFlags("is_staff"));
        }
        if !is_superuser {
            return Err(AccountError::InvalidSuperuserFlags("is_superuser"));
        }

        self.persist_new_user(request).await
    }

    /// Self-service registration
    pub async fn register(&self, form: RegisterForm) -> AccountResult<User> {
        let request = form.into_request()?;
        self.create_user(request).await
    }

    async fn persist_new_user(&self, request: CreateUserRequest) -> AccountResult<User> {
        request.validate()?;

        let password_hash = hash_optional_password(request.password.as_deref())?;
        let new_user = NewUser {
            email: normalize_email(&request.email),
            phone: request.phone.clone(),
            whatsapp: request.whatsapp.clone(),
            first_name: request.first_name.clone(),
            last_name: request.last_name.clone(),
            id_number: request.id_number.clone(),
            user_type: request.user_type,
            company: request.company_details(),
            country: request.country.clone(),
            city: request.city.clone(),
            address: request.address.clone(),
            postal_code: request.postal_code.clone(),
            website: request.website.clone(),
            preferred_language: request.preferred_language,
            password_hash,
            is_verified: request.is_verified,
            is_active: request.is_active.unwrap_or(true),
            is_staff: request.is_staff.unwrap_or(false),
            is_superuser: request.is_superuser.unwrap_or(false),
        };

        if !new_user.user_type.is_company() && !new_user.company.is_empty() {
            warn!(
                email = %new_user.email,
                user_type = %new_user.user_type,
                "discarding company details for non-company account"
            );
        }

        let user = self.users.create(&new_user).await?;
        info!(
            user_id = user.id,
            public_id = %user.public_id,
            user_type = %user.user_type,
            is_staff = user.is_staff,
            "created account"
        );

        self.hook.run(&user, &self.profiles).await?;
        Ok(user)
    }

    /// Apply a partial change and persist it. Company details are cleared
    /// again when the resulting role is not company.
    pub async fn update_user(&self, user_id: i64, form: UserChangeForm) -> AccountResult<User> {
        form.validate()?;
        let mut user = self.get_user(user_id).await?;
        let previous_type = user.user_type;
        form.apply(&mut user);

        let saved = self.users.save(&user).await?;
        if saved.user_type != previous_type {
            // Role profiles are kept; they stop being editable until the role matches again.
            for kind in self.mismatched_profiles(user_id, saved.user_type).await? {
                warn!(
                    user_id,
                    profile = %kind,
                    user_type = saved.user_type.as_str(),
                    "role changed, profile no longer matches"
                );
            }
        }
        info!(user_id, "updated account");
        Ok(saved)
    }

    /// Replace the password; `None` leaves the account without a usable password
    pub async fn set_password(&self, user_id: i64, password: Option<&str>) -> AccountResult<()> {
        let hash = hash_optional_password(password)?;
        self.users.update_password(user_id, hash.as_deref()).await?;
        info!(user_id, usable = hash.is_some(), "password changed");
        Ok(())
    }

    pub async fn record_login(&self, user_id: i64) -> AccountResult<()> {
        Ok(self.users.update_last_login(user_id).await?)
    }

    /// Mark the account that owns `token` as verified. The token stays unchanged.
    pub async fn verify_email(&self, token: &str) -> AccountResult<User> {
        let user = self
            .users
            .find_by_verification_token(token.trim())
            .await?
            .ok_or(AccountError::InvalidVerificationToken)?;

        if user.is_verified {
            return Ok(user);
        }

        self.users.batch_set_verified(&[user.id], true).await?;
        info!(user_id = user.id, "email address verified");
        self.get_user(user.id).await
    }
}

/// Runs after every successful account insert.
///
/// Creates the generic profile when missing, then sends the welcome email
/// and, for unverified accounts, the verify-account email.
pub struct PostCreateHook {
    notifications: NotificationService,
}

impl PostCreateHook {
    pub fn new(notifications: NotificationService) -> Self {
        Self { notifications }
    }

    pub async fn run<P: ProfileRepo>(&self, user: &User, profiles: &P) -> AccountResult<PostCreateReport> {
        let mut report = PostCreateReport {
            profile_created: profiles.create_user_profile_if_missing(user.id).await?,
            ..Default::default()
        };

        report.welcome_sent = self
            .guard(user, "welcome", self.notifications.send_welcome(user).await)?;

        if !user.is_verified {
            report.verification_sent = self.guard(
                user,
                "verify_account",
                self.notifications.send_verification(user).await,
            )?;
        }

        Ok(report)
    }

    fn guard(
        &self,
        user: &User,
        email: &'static str,
        result: Result<(), NotificationError>,
    ) -> AccountResult<bool> {
        match result {
            Ok(()) => Ok(true),
            Err(error) if self.notifications.fail_silently() => {
                warn!(user_id = user.id, email, %error, "account email not delivered");
                Ok(false)
            }
            Err(error) => Err(error.into()),
        }
    }
}

/// Trait for user repositories to allow generic usage
pub trait UserRepo {
    async fn find_by_id(&self, id: i64) -> UserResult<Option<User>>;
    async fn find_by_public_id(&self, public_id: &str) -> UserResult<Option<User>>;
    async fn find_by_email(&self, email: &str) -> UserResult<Option<User>>;
    async fn find_by_verification_token(&self, token: &str) -> UserResult<Option<User>>;
    async fn create(&self, new_user: &NewUser) -> UserResult<User>;
    async fn save(&self, user: &User) -> UserResult<User>;
    async fn update_last_login(&self, user_id: i64) -> UserResult<()>;
    async fn update_password(&self, user_id: i64, password_hash: Option<&str>) -> UserResult<()>;
    async fn batch_set_verified(&self, user_ids: &[i64], verified: bool) -> UserResult<u64>;
    async fn batch_set_active(&self, user_ids: &[i64], active: bool) -> UserResult<u64>;
    async fn find_many(&self, user_ids: &[i64]) -> UserResult<Vec<User>>;
    async fn list(&self, filter: &UserFilter, limit: u32, offset: u32) -> UserResult<Vec<User>>;
    async fn count(&self, filter: &UserFilter) -> UserResult<i64>;
}

impl UserRepo for UserRepository {
    async fn find_by_id(&self, id: i64) -> UserResult<Option<User>> {
        self.find_by_id(id).await
    }

    async fn find_by_public_id(&self, public_id: &str) -> UserResult<Option<User>> {
        self.find_by_public_id(public_id).await
    }

    async fn find_by_email(&self, email: &str) -> UserResult<Option<User>> {
        self.find_by_email(email).await
    }

    async fn find_by_verification_token(&self, token: &str) -> UserResult<Option<User>> {
        self.find_by_verification_token(token).await
    }

    async fn create(&self, new_user: &NewUser) -> UserResult<User> {
        self.create(new_user).await
    }

    async fn save(&self, user: &User) -> UserResult<User> {
        self.save(user).await
    }

    async fn update_last_login(&self, user_id: i64) -> UserResult<()> {
        self.update_last_login(user_id).await
    }

    async fn update_password(&self, user_id: i64, password_hash: Option<&str>) -> UserResult<()> {
        self.update_password(user_id, password_hash).await
    }

    async fn batch_set_verified(&self, user_ids: &[i64], verified: bool) -> UserResult<u64> {
        self.batch_set_verified(user_ids, verified).await
    }

    async fn batch_set_active(&self, user_ids: &[i64], active: bool) -> UserResult<u64> {
        self.batch_set_active(user_ids, active).await
    }

    async fn find_many(&self, user_ids: &[i64]) -> UserResult<Vec<User>> {
        self.find_many(user_ids).await
    }

    async fn list(&self, filter: &UserFilter, limit: u32, offset: u32) -> UserResult<Vec<User>> {
        self.list(filter, limit, offset).await
    }

    async fn count(&self, filter: &UserFilter) -> UserResult<i64> {
        self.count(filter).await
    }
}

impl UserRepo for MockUserRepository {
    async fn find_by_id(&self, id: i64) -> UserResult<Option<User>> {
        self.find_by_id(id).await
    }

    async fn find_by_public_id(&self, public_id: &str) -> UserResult<Option<User>> {
        self.find_by_public_id(public_id).await
    }

    async fn find_by_email(&self, email: &str) -> UserResult<Option<User>> {
        self.find_by_email(email).await
    }

    async fn find_by_verification_token(&self, token: &str) -> UserResult<Option<User>> {
        self.find_by_verification_token(token).await
    }

    async fn create(&self, new_user: &NewUser) -> UserResult<User> {
        self.create(new_user).await
    }

    async fn save(&self, user: &User) -> UserResult<User> {
        self.save(user).await
    }

    async fn update_last_login(&self, user_id: i64) -> UserResult<()> {
        self.update_last_login(user_id).await
    }

    async fn update_password(&self, user_id: i64, password_hash: Option<&str>) -> UserResult<()> {
        self.update_password(user_id, password_hash).await
    }

    async fn batch_set_verified(&self, user_ids: &[i64], verified: bool) -> UserResult<u64> {
        self.batch_set_verified(user_ids, verified).await
    }

    async fn batch_set_active(&self, user_ids: &[i64], active: bool) -> UserResult<u64> {
        self.batch_set_active(user_ids, active).await
    }

    async fn find_many(&self, user_ids: &[i64]) -> UserResult<Vec<User>> {
        self.find_many(user_ids).await
    }

    async fn list(&self, filter: &UserFilter, limit: u32, offset: u32) -> UserResult<Vec<User>> {
        self.list(filter, limit, offset).await
    }

    async fn count(&self, filter: &UserFilter) -> UserResult<i64> {
        self.count(filter).await
    }
}
