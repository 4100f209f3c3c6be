//! Outgoing account email: templates, transports and the dispatch policy.

use async_trait::async_trait;
use handlebars::Handlebars;
use lettre::message::{header::ContentType, Mailbox};
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use rental_config::{MailBackend, MailConfig};
use rental_database::{Language, User};
use serde::Serialize;
use serde_json::json;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, info};

use crate::types::{NotificationError, NotificationResult};

/// A rendered message ready for a transport.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OutgoingEmail {
    pub to: String,
    pub subject: String,
    pub body: String,
}

/// Delivers rendered email.
#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send(&self, email: &OutgoingEmail) -> NotificationResult<()>;
}

/// SMTP relay transport.
pub struct SmtpMailer {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from: Mailbox,
}

impl SmtpMailer {
    pub fn from_config(config: &MailConfig) -> NotificationResult<Self> {
        let from = config
            .from_address
            .parse::<Mailbox>()
            .map_err(|e| NotificationError::Message(format!("from address: {e}")))?;

        // Local relays (mailhog, postfix on loopback) speak plain SMTP.
        let builder = if matches!(config.smtp_host.as_str(), "localhost" | "127.0.0.1") {
            AsyncSmtpTransport::<Tokio1Executor>::builder_dangerous(config.smtp_host.as_str())
        } else {
            AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.smtp_host)
                .map_err(|e| NotificationError::Transport(e.to_string()))?
        };

        let mut builder = builder.port(config.smtp_port);
        if let (Some(username), Some(password)) = (&config.smtp_username, &config.smtp_password) {
            builder = builder.credentials(Credentials::new(username.clone(), password.clone()));
        }

        Ok(Self {
            transport: builder.build(),
            from,
        })
    }
}

#[async_trait]
impl Mailer for SmtpMailer {
    async fn send(&self, email: &OutgoingEmail) -> NotificationResult<()> {
        let to = email
            .to
            .parse::<Mailbox>()
            .map_err(|e| NotificationError::Message(format!("recipient {}: {e}", email.to)))?;

        let message = Message::builder()
            .from(self.from.clone())
            .to(to)
            .subject(email.subject.clone())
            .header(ContentType::TEXT_PLAIN)
            .body(email.body.clone())
            .map_err(|e| NotificationError::Message(e.to_string()))?;

        self.transport
            .send(message)
            .await
            .map_err(|e| NotificationError::Transport(e.to_string()))?;

        debug!(to = %email.to, subject = %email.subject, "email relayed");
        Ok(())
    }
}

/// Keeps sent messages in process. Used for development and tests.
#[derive(Clone, Default)]
pub struct InMemoryMailer {
    outbox: Arc<RwLock<Vec<OutgoingEmail>>>,
    failing: Arc<AtomicBool>,
}

impl InMemoryMailer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every message accepted so far, oldest first.
    pub async fn sent(&self) -> Vec<OutgoingEmail> {
        self.outbox.read().await.clone()
    }

    /// Make subsequent sends fail with a transport error.
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }
}

#[async_trait]
impl Mailer for InMemoryMailer {
    async fn send(&self, email: &OutgoingEmail) -> NotificationResult<()> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(NotificationError::Transport(
                "in-memory mailer set to fail".to_string(),
            ));
        }
        self.outbox.write().await.push(email.clone());
        Ok(())
    }
}

/// Build the transport selected by `mail.backend`.
pub fn mailer_from_config(config: &MailConfig) -> NotificationResult<Arc<dyn Mailer>> {
    match config.backend {
        MailBackend::Smtp => {
            info!(host = %config.smtp_host, port = config.smtp_port, "using SMTP mail transport");
            Ok(Arc::new(SmtpMailer::from_config(config)?))
        }
        MailBackend::Memory => {
            info!("using in-memory mail outbox");
            Ok(Arc::new(InMemoryMailer::new()))
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EmailKind {
    Welcome,
    VerifyAccount,
    PasswordReset,
}

impl EmailKind {
    fn template_name(&self, language: Language) -> String {
        let base = match self {
            EmailKind::Welcome => "welcome",
            EmailKind::VerifyAccount => "verify_account",
            EmailKind::PasswordReset => "password_reset",
        };
        format!("{base}.{}", language.as_str())
    }

    fn subject(&self, language: Language) -> &'static str {
        match (self, language) {
            (EmailKind::Welcome, Language::Ar) => "مرحباً بك في نظام إدارة الإيجارات",
            (EmailKind::Welcome, Language::En) => "Welcome to the rental management system",
            (EmailKind::VerifyAccount, Language::Ar) => "تفعيل حسابك في نظام إدارة الإيجارات",
            (EmailKind::VerifyAccount, Language::En) => {
                "Activate your rental management account"
            }
            (EmailKind::PasswordReset, Language::Ar) => "إعادة تعيين كلمة المرور",
            (EmailKind::PasswordReset, Language::En) => "Password reset",
        }
    }
}

const TEMPLATES: &[(&str, &str)] = &[
    (
        "welcome.ar",
        "مرحباً {{name}}،\n\nتم إنشاء حسابك {{email}} في نظام إدارة الإيجارات.\n\n{{site_url}}\n",
    ),
    (
        "welcome.en",
        "Hello {{name}},\n\nYour account {{email}} has been created in the rental management system.\n\n{{site_url}}\n",
    ),
    (
        "verify_account.ar",
        "مرحباً {{name}}،\n\nيرجى تأكيد بريدك الإلكتروني عبر الرابط التالي:\n{{verification_link}}\n\nرمز التفعيل: {{verification_token}}\n",
    ),
    (
        "verify_account.en",
        "Hello {{name}},\n\nPlease confirm your email address by opening the link below:\n{{verification_link}}\n\nVerification code: {{verification_token}}\n",
    ),
    (
        "password_reset.ar",
        "كلمة المرور المؤقتة الخاصة بك: {{password}}\nيرجى تغييرها بعد تسجيل الدخول.\n",
    ),
    (
        "password_reset.en",
        "Your temporary password: {{password}}\nPlease change it after logging in.\n",
    ),
];

/// Plain-text email templates in Arabic and English.
pub struct EmailTemplates {
    registry: Handlebars<'static>,
}

impl EmailTemplates {
    pub fn new() -> NotificationResult<Self> {
        let mut registry = Handlebars::new();
        registry.register_escape_fn(handlebars::no_escape);
        for (name, source) in TEMPLATES {
            registry
                .register_template_string(name, *source)
                .map_err(|e| NotificationError::Template(format!("{name}: {e}")))?;
        }
        Ok(Self { registry })
    }

    pub fn render(
        &self,
        kind: EmailKind,
        user: &User,
        context: &serde_json::Value,
    ) -> NotificationResult<OutgoingEmail> {
        let language = user.preferred_language;
        let body = self
            .registry
            .render(&kind.template_name(language), context)
            .map_err(|e| NotificationError::Template(e.to_string()))?;

        Ok(OutgoingEmail {
            to: user.email.clone(),
            subject: kind.subject(language).to_string(),
            body,
        })
    }
}

/// Renders and sends the account emails.
#[derive(Clone)]
pub struct NotificationService {
    mailer: Arc<dyn Mailer>,
    templates: Arc<EmailTemplates>,
    site_url: String,
    fail_silently: bool,
}

impl NotificationService {
    pub fn new(mailer: Arc<dyn Mailer>, config: &MailConfig) -> NotificationResult<Self> {
        Ok(Self {
            mailer,
            templates: Arc::new(EmailTemplates::new()?),
            site_url: config.site_url.trim_end_matches('/').to_string(),
            fail_silently: config.fail_silently,
        })
    }

    /// Whether post-create delivery failures are swallowed.
    pub fn fail_silently(&self) -> bool {
        self.fail_silently
    }

    pub fn verification_link(&self, token: &str) -> String {
        format!("{}/api/auth/verify?token={}", self.site_url, token)
    }

    fn base_context(&self, user: &User) -> serde_json::Value {
        let name = user
            .full_name()
            .or_else(|| user.company.name.clone())
            .unwrap_or_else(|| user.email.clone());
        json!({
            "name": name,
            "email": user.email,
            "user_type": user.user_type.label(),
            "site_url": self.site_url,
        })
    }

    async fn deliver(&self, kind: EmailKind, user: &User, context: serde_json::Value) -> NotificationResult<()> {
        let email = self.templates.render(kind, user, &context)?;
        self.mailer.send(&email).await?;
        info!(user_id = user.id, email_kind = ?kind, "account email sent");
        Ok(())
    }

    pub async fn send_welcome(&self, user: &User) -> NotificationResult<()> {
        let context = self.base_context(user);
        self.deliver(EmailKind::Welcome, user, context).await
    }

    pub async fn send_verification(&self, user: &User) -> NotificationResult<()> {
        let mut context = self.base_context(user);
        context["verification_token"] = json!(user.verification_token);
        context["verification_link"] = json!(self.verification_link(&user.verification_token));
        self.deliver(EmailKind::VerifyAccount, user, context).await
    }

    /// The temporary password travels in the message body.
    pub async fn send_password_reset(&self, user: &User, temp_password: &str) -> NotificationResult<()> {
        let mut context = self.base_context(user);
        context["password"] = json!(temp_password);
        self.deliver(EmailKind::PasswordReset, user, context).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use rental_database::{CompanyDetails, UserType};

    fn user(language: Language) -> User {
        let now = Utc::now();
        User {
            id: 1,
            public_id: "pub1".to_string(),
            email: "info@acme.om".to_string(),
            phone: None,
            whatsapp: None,
            first_name: None,
            last_name: None,
            id_number: None,
            user_type: UserType::Company,
            company: CompanyDetails {
                name: Some("Acme".to_string()),
                ..Default::default()
            },
            country: "OM".to_string(),
            city: "Muscat".to_string(),
            address: None,
            postal_code: None,
            website: None,
            preferred_language: language,
            password_hash: None,
            is_verified: false,
            verification_token: "2f1c3e9a-token".to_string(),
            is_active: true,
            is_staff: false,
            is_superuser: false,
            last_login_at: None,
            created_at: now,
            updated_at: now,
        }
    }

    fn service(mailer: &InMemoryMailer) -> NotificationService {
        let config = MailConfig {
            site_url: "https://rent.example.om/".to_string(),
            ..Default::default()
        };
        NotificationService::new(Arc::new(mailer.clone()), &config).unwrap()
    }

    #[tokio::test]
    async fn test_verification_email_carries_token_and_link() {
        let mailer = InMemoryMailer::new();
        let notifications = service(&mailer);

        notifications.send_verification(&user(Language::En)).await.unwrap();

        let sent = mailer.sent().await;
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].to, "info@acme.om");
        assert_eq!(sent[0].subject, "Activate your rental management account");
        assert!(sent[0].body.contains("Hello Acme,"));
        assert!(sent[0]
            .body
            .contains("https://rent.example.om/api/auth/verify?token=2f1c3e9a-token"));
    }

    #[tokio::test]
    async fn test_arabic_is_the_default_language() {
        let mailer = InMemoryMailer::new();
        let notifications = service(&mailer);

        notifications
            .send_password_reset(&user(Language::Ar), "Ab12Cd34")
            .await
            .unwrap();

        let sent = mailer.sent().await;
        assert_eq!(sent[0].subject, "إعادة تعيين كلمة المرور");
        assert!(sent[0].body.contains("Ab12Cd34"));
    }

    #[tokio::test]
    async fn test_transport_failure_is_reported() {
        let mailer = InMemoryMailer::new();
        mailer.set_failing(true);
        let notifications = service(&mailer);

        let result = notifications.send_welcome(&user(Language::En)).await;
        assert!(matches!(result, Err(NotificationError::Transport(_))));
        assert!(mailer.sent().await.is_empty());
    }

    #[test]
    fn test_every_template_registers() {
        let templates = EmailTemplates::new().unwrap();
        for kind in [EmailKind::Welcome, EmailKind::VerifyAccount, EmailKind::PasswordReset] {
            for language in [Language::Ar, Language::En] {
                let rendered = templates
                    .render(kind, &user(language), &json!({"name": "x"}))
                    .unwrap();
                assert!(!rendered.body.is_empty());
            }
        }
    }

    #[test]
    fn test_memory_backend_selected_by_default() {
        assert!(mailer_from_config(&MailConfig::default()).is_ok());
    }
}
