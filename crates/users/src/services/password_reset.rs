//! Temporary-password reset.

use tracing::info;

use super::profile_service::ProfileRepo;
use super::user_service::{UserRepo, UserService};
use crate::types::AccountResult;
use crate::utils::password::{generate_random_password, hash_password, TEMP_PASSWORD_LENGTH};

impl<R, P> UserService<R, P>
where
    R: UserRepo,
    P: ProfileRepo,
{
    /// Replace the password with a random one and email it to the user.
    ///
    /// The temporary password is returned so an operator can hand it over
    /// when mail is unavailable. It does not expire.
    pub async fn reset_password(&self, user_id: i64) -> AccountResult<String> {
        let user = self.get_user(user_id).await?;
        let temporary = generate_random_password(TEMP_PASSWORD_LENGTH);
        let hash = hash_password(&temporary)?;

        self.users.update_password(user.id, Some(&hash)).await?;
        self.notifications()
            .send_password_reset(&user, &temporary)
            .await?;

        info!(user_id = user.id, email = %user.email, "password reset");
        Ok(temporary)
    }
}

#[cfg(test)]
mod tests {
    use crate::services::mock_repositories::{MockProfileRepository, MockUserRepository};
    use crate::services::notification_service::{InMemoryMailer, NotificationService};
    use crate::services::user_service::UserService;
    use crate::types::{AccountError, CreateUserRequest};
    use crate::utils::password::verify_password;
    use rental_config::MailConfig;
    use std::sync::Arc;

    fn service(mailer: &InMemoryMailer) -> UserService<MockUserRepository, MockProfileRepository> {
        let notifications =
            NotificationService::new(Arc::new(mailer.clone()), &MailConfig::default()).unwrap();
        UserService::new_for_testing(notifications)
    }

    #[tokio::test]
    async fn test_reset_sets_and_mails_temporary_password() {
        let mailer = InMemoryMailer::new();
        let service = service(&mailer);
        let user = service
            .create_user(CreateUserRequest::new("a@x.com", "Acme", "1").with_password("Secret123"))
            .await
            .unwrap();

        let temporary = service.reset_password(user.id).await.unwrap();
        assert_eq!(temporary.len(), 8);
        assert!(temporary.chars().all(|c| c.is_ascii_alphanumeric()));

        let stored = service.get_user(user.id).await.unwrap();
        let hash = stored.password_hash.unwrap();
        assert!(verify_password(&temporary, &hash));
        assert!(!verify_password("Secret123", &hash));

        let sent = mailer.sent().await;
        let last = sent.last().unwrap();
        assert_eq!(last.to, "a@x.com");
        assert!(last.body.contains(&temporary));
    }

    #[tokio::test]
    async fn test_reset_of_missing_user() {
        let mailer = InMemoryMailer::new();
        let service = service(&mailer);
        assert!(matches!(
            service.reset_password(9).await,
            Err(AccountError::Store(_))
        ));
    }
}
