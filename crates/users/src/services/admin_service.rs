//! Operator-facing list, bulk actions and export.

use rental_database::{User, UserFilter};
use tracing::info;

use super::profile_service::ProfileRepo;
use super::user_service::{UserRepo, UserService};
use crate::forms::AdminCreateUserForm;
use crate::types::{
    AccountResult, BulkActionResult, FilterLookups, PageRequest, UserExportRow, UserPage,
};

impl<R, P> UserService<R, P>
where
    R: UserRepo,
    P: ProfileRepo,
{
    /// Filtered page of accounts ordered by company name, then id.
    pub async fn list_users(&self, filter: &UserFilter, page: PageRequest) -> AccountResult<UserPage> {
        let page = PageRequest::new(page.limit, page.offset);
        let users = self.users.list(filter, page.limit, page.offset).await?;
        let total = self.users.count(filter).await?;

        Ok(UserPage {
            users,
            total,
            limit: page.limit,
            offset: page.offset,
        })
    }

    pub fn filter_lookups(&self) -> FilterLookups {
        FilterLookups::build()
    }

    /// Mark the selected accounts verified in one update.
    pub async fn verify_users(&self, user_ids: &[i64]) -> AccountResult<BulkActionResult> {
        let updated = self.users.batch_set_verified(user_ids, true).await?;
        info!(selected = user_ids.len(), updated, "bulk verify");
        Ok(BulkActionResult {
            updated,
            message: format!("Verified {updated} user(s)"),
        })
    }

    pub async fn deactivate_users(&self, user_ids: &[i64]) -> AccountResult<BulkActionResult> {
        let updated = self.users.batch_set_active(user_ids, false).await?;
        info!(selected = user_ids.len(), updated, "bulk deactivate");
        Ok(BulkActionResult {
            updated,
            message: format!("Deactivated {updated} user(s)"),
        })
    }

    pub async fn activate_users(&self, user_ids: &[i64]) -> AccountResult<BulkActionResult> {
        let updated = self.users.batch_set_active(user_ids, true).await?;
        info!(selected = user_ids.len(), updated, "bulk activate");
        Ok(BulkActionResult {
            updated,
            message: format!("Activated {updated} user(s)"),
        })
    }

    /// List-display rows of the selected accounts.
    pub async fn export_users(&self, user_ids: &[i64]) -> AccountResult<Vec<UserExportRow>> {
        let users = self.users.find_many(user_ids).await?;
        Ok(users.iter().map(UserExportRow::from).collect())
    }

    pub async fn admin_create_user(&self, form: AdminCreateUserForm) -> AccountResult<User> {
        let request = form.into_request()?;
        self.create_user(request).await
    }

    /// Internal ids for the given public ids. Unknown ids are skipped.
    pub async fn ids_for_public_ids(&self, public_ids: &[String]) -> AccountResult<Vec<i64>> {
        let mut ids = Vec::with_capacity(public_ids.len());
        for public_id in public_ids {
            if let Some(user) = self.users.find_by_public_id(public_id).await? {
                ids.push(user.id);
            }
        }
        Ok(ids)
    }
}

#[cfg(test)]
mod tests {
    use crate::services::mock_repositories::{MockProfileRepository, MockUserRepository};
    use crate::services::notification_service::{InMemoryMailer, NotificationService};
    use crate::services::user_service::UserService;
    use crate::types::{CreateUserRequest, PageRequest};
    use crate::forms::AdminCreateUserForm;
    use rental_config::MailConfig;
    use rental_database::{UserFilter, UserType};
    use std::sync::Arc;

    type Service = UserService<MockUserRepository, MockProfileRepository>;

    fn service() -> Service {
        let notifications =
            NotificationService::new(Arc::new(InMemoryMailer::new()), &MailConfig::default())
                .unwrap();
        UserService::new_for_testing(notifications)
    }

    async fn seed(service: &Service) -> Vec<i64> {
        let mut ids = Vec::new();
        for (i, company) in ["Zeta", "Alpha", "Mid"].iter().enumerate() {
            let request = CreateUserRequest::new(
                format!("user{i}@x.com"),
                *company,
                format!("{}", 100 + i),
            );
            ids.push(service.create_user(request).await.unwrap().id);
        }
        ids
    }

    #[tokio::test]
    async fn test_bulk_verify_reports_count() {
        let service = service();
        let ids = seed(&service).await;

        let result = service.verify_users(&ids).await.unwrap();
        assert_eq!(result.updated, 3);
        assert_eq!(result.message, "Verified 3 user(s)");

        for id in &ids {
            assert!(service.get_user(*id).await.unwrap().is_verified);
        }

        let again = service.verify_users(&ids).await.unwrap();
        assert_eq!(again.updated, 3);
        assert_eq!(again.message, "Verified 3 user(s)");
    }

    #[tokio::test]
    async fn test_bulk_verify_mixed_selection_counts_every_selected_user() {
        let service = service();
        let ids = seed(&service).await;

        service.verify_users(&ids[..1]).await.unwrap();

        let result = service.verify_users(&ids).await.unwrap();
        assert_eq!(result.updated, 3);
        assert_eq!(result.message, "Verified 3 user(s)");
    }

    #[tokio::test]
    async fn test_deactivate_and_activate() {
        let service = service();
        let ids = seed(&service).await;

        let result = service.deactivate_users(&ids[..2]).await.unwrap();
        assert_eq!(result.message, "Deactivated 2 user(s)");

        let inactive = UserFilter {
            is_active: Some(false),
            ..Default::default()
        };
        let page = service.list_users(&inactive, PageRequest::default()).await.unwrap();
        assert_eq!(page.total, 2);

        let result = service.activate_users(&ids).await.unwrap();
        assert_eq!(result.updated, 3);
        assert_eq!(result.message, "Activated 3 user(s)");
        let page = service.list_users(&inactive, PageRequest::default()).await.unwrap();
        assert_eq!(page.total, 0);
    }

    #[tokio::test]
    async fn test_list_orders_by_company_name_and_pages() {
        let service = service();
        seed(&service).await;

        let page = service
            .list_users(&UserFilter::default(), PageRequest::new(2, 0))
            .await
            .unwrap();
        assert_eq!(page.total, 3);
        assert_eq!(page.users.len(), 2);
        let names: Vec<_> = page
            .users
            .iter()
            .map(|u| u.company.name.clone().unwrap_or_default())
            .collect();
        assert_eq!(names, vec!["Alpha", "Mid"]);

        let search = UserFilter {
            search: Some("ZET".to_string()),
            ..Default::default()
        };
        let page = service.list_users(&search, PageRequest::default()).await.unwrap();
        assert_eq!(page.total, 1);
    }

    #[tokio::test]
    async fn test_export_rows_use_labels() {
        let service = service();
        let ids = seed(&service).await;

        let rows = service.export_users(&ids).await.unwrap();
        assert_eq!(rows.len(), 3);
        assert!(rows.iter().all(|r| r.user_type == UserType::Company.label()));
        assert!(rows.iter().all(|r| r.is_active && !r.is_verified));
    }

    #[tokio::test]
    async fn test_admin_create_without_password() {
        let service = service();
        let user = service
            .admin_create_user(AdminCreateUserForm {
                email: "ops@x.com".to_string(),
                company_name: "Ops".to_string(),
                commercial_registration: "55".to_string(),
                is_verified: true,
                ..Default::default()
            })
            .await
            .unwrap();

        assert!(!user.has_usable_password());
        assert!(user.is_verified);

        let ids = service
            .ids_for_public_ids(&[user.public_id.clone(), "missing".to_string()])
            .await
            .unwrap();
        assert_eq!(ids, vec![user.id]);
    }
}
