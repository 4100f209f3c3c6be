//! # Rental Users Crate
//!
//! Account management for the rental backend: the user manager, role
//! profiles, admin bulk actions, login tokens, password resets and the
//! account emails sent after creation.
//!
//! ## Architecture
//!
//! - **Forms**: validated input for registration, admin creation, updates and profiles
//! - **Services**: business logic over the repository traits
//! - **Types**: errors, requests and results
//! - **Utils**: password hashing, validators, JWT
//!
//! ## Usage
//!
//! ```rust,ignore
//! use rental_users::{CreateUserRequest, NotificationService, UserService};
//!
//! let service = UserService::new(pool, notifications);
//! let user = service
//!     .create_user(CreateUserRequest::new("a@x.com", "Acme", "12345"))
//!     .await?;
//! ```

pub mod forms;
pub mod services;
pub mod types;
pub mod utils;

pub use rental_database::{
    CompanyDetails, CompanyType, Investor, Language, Owner, PaymentMethod, ProfileKind,
    SqlitePool, Tenant, User, UserError, UserFilter, UserProfile, UserProfileData, UserResult,
    UserType,
};

pub use forms::{
    AdminCreateUserForm, InvestorForm, LoginForm, OwnerForm, RegisterForm, TenantForm,
    UserChangeForm,
};
pub use services::{
    mailer_from_config, AuthService, InMemoryMailer, Mailer, MockProfileRepository,
    MockUserRepository, NotificationService, OutgoingEmail, PostCreateHook, ProfileRepo,
    SqliteUserService, UserRepo, UserService,
};
pub use types::{
    AccountError, AccountResult, BulkActionResult, CreateUserRequest, FilterLookups,
    FilterOption, LoginOutcome, NotificationError, PageRequest, PostCreateReport,
    UserExportRow, UserPage, UserProfiles,
};
pub use utils::jwt::{Claims, JwtManager};

/// [`AuthService`] over the SQLite repositories.
pub type SqliteAuthService =
    AuthService<rental_database::UserRepository, rental_database::ProfileRepository>;
