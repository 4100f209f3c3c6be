//! Business logic services for account management.
//!
//! Services coordinate the repositories, the mailer and the token manager.
//! They are generic over the repository traits so tests can run them on
//! in-memory stores.

pub mod admin_service;
pub mod auth_service;
pub mod mock_repositories;
pub mod notification_service;
pub mod password_reset;
pub mod profile_service;
pub mod user_service;

pub use auth_service::AuthService;
pub use mock_repositories::{MockProfileRepository, MockUserRepository};
pub use notification_service::{
    mailer_from_config, EmailKind, EmailTemplates, InMemoryMailer, Mailer, NotificationService,
    OutgoingEmail, SmtpMailer,
};
pub use profile_service::ProfileRepo;
pub use user_service::{PostCreateHook, SqliteUserService, UserRepo, UserService};
