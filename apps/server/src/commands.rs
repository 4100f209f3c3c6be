//! Operator commands run against the configured database.

use anyhow::{bail, Context, Result};
use rental_backend_runtime::BackendServices;
use rental_users::{CreateUserRequest, PageRequest, User, UserFilter, UserType};

pub struct SuperuserArgs {
    pub email: String,
    pub company_name: String,
    pub commercial_registration: String,
    pub password: String,
}

/// Create a verified operator account with every privilege flag set.
pub async fn create_superuser(services: &BackendServices, args: SuperuserArgs) -> Result<User> {
    let mut request =
        CreateUserRequest::new(args.email, args.company_name, args.commercial_registration)
            .with_password(args.password);
    request.is_verified = true;

    services
        .gateway
        .user_service()
        .create_superuser(request)
        .await
        .context("failed to create superuser")
}

/// Issue and email a temporary password. Returns the password for the operator.
pub async fn reset_password(services: &BackendServices, email: &str) -> Result<String> {
    let users = services.gateway.user_service();
    let Some(user) = users
        .get_user_by_email(email)
        .await
        .context("failed to look up user")?
    else {
        bail!("no account registered for {email}");
    };

    users
        .reset_password(user.id)
        .await
        .context("failed to reset password")
}

/// One row per account, in the admin list's column order.
pub async fn list_users(
    services: &BackendServices,
    user_type: Option<&str>,
    search: Option<String>,
    limit: u32,
) -> Result<Vec<String>> {
    let user_type = user_type
        .map(str::parse::<UserType>)
        .transpose()
        .map_err(|e| anyhow::anyhow!(e))?;
    let filter = UserFilter {
        user_type,
        search,
        ..Default::default()
    };

    let page = services
        .gateway
        .user_service()
        .list_users(&filter, PageRequest::new(limit, 0))
        .await
        .context("failed to list users")?;

    let mut lines = vec![format!(
        "{:<30} {:<16} {:<12} {:<30} {:<9} {:<7}",
        "Email", "Phone", "Type", "Company", "Verified", "Active"
    )];
    lines.push("-".repeat(110));
    for user in page.users {
        lines.push(format!(
            "{:<30} {:<16} {:<12} {:<30} {:<9} {:<7}",
            user.email,
            user.phone.as_deref().unwrap_or("-"),
            user.user_type.as_str(),
            user.company.name.as_deref().unwrap_or("-"),
            user.is_verified,
            user.is_active
        ));
    }
    lines.push(format!("{} of {} account(s)", lines.len() - 2, page.total));
    Ok(lines)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rental_config::{AppConfig, MailBackend};
    use tempfile::TempDir;

    async fn services() -> (BackendServices, TempDir) {
        let temp_dir = TempDir::new().unwrap();
        let mut config = AppConfig::default();
        config.database.url = format!(
            "sqlite://{}",
            temp_dir.path().join("commands.db").to_string_lossy()
        );
        config.database.max_connections = 1;
        config.mail.backend = MailBackend::Memory;

        let services = BackendServices::initialise(&config).await.unwrap();
        (services, temp_dir)
    }

    fn admin() -> SuperuserArgs {
        SuperuserArgs {
            email: "Admin@Rental.om".to_string(),
            company_name: "Rental Operations".to_string(),
            commercial_registration: "1000001".to_string(),
            password: "AdminPass1".to_string(),
        }
    }

    #[tokio::test]
    async fn test_create_superuser_sets_flags() {
        let (services, _dir) = services().await;

        let user = create_superuser(&services, admin()).await.unwrap();
        assert_eq!(user.email, "admin@rental.om");
        assert!(user.is_staff);
        assert!(user.is_superuser);
        assert!(user.is_verified);

        let again = create_superuser(&services, admin()).await;
        assert!(again.is_err());
    }

    #[tokio::test]
    async fn test_reset_password_unknown_email() {
        let (services, _dir) = services().await;

        let error = reset_password(&services, "ghost@x.com").await.unwrap_err();
        assert!(error.to_string().contains("ghost@x.com"));
    }

    #[tokio::test]
    async fn test_reset_password_returns_temporary_password() {
        let (services, _dir) = services().await;
        create_superuser(&services, admin()).await.unwrap();

        let password = reset_password(&services, "admin@rental.om").await.unwrap();
        assert_eq!(password.len(), 8);
    }

    #[tokio::test]
    async fn test_list_users_filters_by_type() {
        let (services, _dir) = services().await;
        create_superuser(&services, admin()).await.unwrap();

        let lines = list_users(&services, Some("company"), None, 50).await.unwrap();
        assert_eq!(lines.len(), 4);
        assert!(lines[2].starts_with("admin@rental.om"));
        assert_eq!(lines[3], "1 of 1 account(s)");

        let lines = list_users(&services, Some("TENANT"), None, 50).await.unwrap();
        assert_eq!(lines.last().unwrap(), "0 of 0 account(s)");

        assert!(list_users(&services, Some("landlord"), None, 50).await.is_err());
    }
}
