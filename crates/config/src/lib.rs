use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use tracing::debug;

const DEFAULT_CONFIG_FILES: &[&str] = &[
    "rental.toml",
    "config/rental.toml",
    "crates/config/rental.toml",
    "../rental.toml",
    "../config/rental.toml",
];

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct AppConfig {
    pub http: HttpConfig,
    pub database: DatabaseConfig,
    pub auth: AuthConfig,
    #[serde(default)]
    pub mail: MailConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HttpConfig {
    pub address: String,
    pub port: u16,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            address: "127.0.0.1".to_string(),
            port: 7070,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: "sqlite://rental.db".to_string(),
            max_connections: 10,
        }
    }
}

/// Settings for the bearer tokens issued on login.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    #[serde(default = "AuthConfig::default_secret")]
    pub jwt_secret: String,
    #[serde(default = "AuthConfig::default_issuer")]
    pub jwt_issuer: String,
    #[serde(default = "AuthConfig::default_audience")]
    pub jwt_audience: String,
    #[serde(default = "AuthConfig::default_token_ttl")]
    pub token_ttl_seconds: u64,
}

impl AuthConfig {
    fn default_secret() -> String {
        "change-me-in-production-rental-secret".to_string()
    }

    fn default_issuer() -> String {
        "rental".to_string()
    }

    fn default_audience() -> String {
        "rental-users".to_string()
    }

    const fn default_token_ttl() -> u64 {
        86_400
    }
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            jwt_secret: Self::default_secret(),
            jwt_issuer: Self::default_issuer(),
            jwt_audience: Self::default_audience(),
            token_ttl_seconds: Self::default_token_ttl(),
        }
    }
}

/// Which transport delivers outgoing email.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MailBackend {
    /// Relay through an SMTP server.
    Smtp,
    /// Keep messages in an in-process outbox (development and tests).
    Memory,
}

/// Outgoing mail configuration.
///
/// ```
/// use rental_config::{MailBackend, MailConfig};
///
/// let mail = MailConfig::default();
/// assert_eq!(mail.backend, MailBackend::Memory);
/// assert_eq!(mail.smtp_port, 587);
/// assert!(!mail.fail_silently);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MailConfig {
    #[serde(default = "MailConfig::default_backend")]
    pub backend: MailBackend,
    #[serde(default = "MailConfig::default_smtp_host")]
    pub smtp_host: String,
    #[serde(default = "MailConfig::default_smtp_port")]
    pub smtp_port: u16,
    #[serde(default)]
    pub smtp_username: Option<String>,
    #[serde(default)]
    pub smtp_password: Option<String>,
    #[serde(default = "MailConfig::default_from_address")]
    pub from_address: String,
    /// Swallow transport failures instead of failing the triggering operation.
    #[serde(default)]
    pub fail_silently: bool,
    /// Public base URL used to build verification links.
    #[serde(default = "MailConfig::default_site_url")]
    pub site_url: String,
}

impl MailConfig {
    const fn default_backend() -> MailBackend {
        MailBackend::Memory
    }

    fn default_smtp_host() -> String {
        "localhost".to_string()
    }

    const fn default_smtp_port() -> u16 {
        587
    }

    fn default_from_address() -> String {
        "no-reply@rental-management.com".to_string()
    }

    fn default_site_url() -> String {
        "http://localhost:7070".to_string()
    }
}

impl Default for MailConfig {
    fn default() -> Self {
        Self {
            backend: Self::default_backend(),
            smtp_host: Self::default_smtp_host(),
            smtp_port: Self::default_smtp_port(),
            smtp_username: None,
            smtp_password: None,
            from_address: Self::default_from_address(),
            fail_silently: false,
            site_url: Self::default_site_url(),
        }
    }
}

/// Load the application configuration by combining defaults, files, and environment overrides.
///
/// ```
/// use rental_config::load;
///
/// std::env::remove_var("RENTAL_CONFIG");
///
/// let config = load().expect("configuration should load with defaults");
/// assert!(!config.http.address.is_empty());
/// ```
pub fn load() -> anyhow::Result<AppConfig> {
    let defaults = AppConfig::default();

    let token_ttl = i64::try_from(defaults.auth.token_ttl_seconds).unwrap_or(i64::MAX);

    let mut builder = config::Config::builder()
        .set_default("http.address", defaults.http.address.clone())?
        .set_default("http.port", i64::from(defaults.http.port))?
        .set_default("database.url", defaults.database.url.clone())?
        .set_default(
            "database.max_connections",
            i64::from(defaults.database.max_connections),
        )?
        .set_default("auth.jwt_secret", defaults.auth.jwt_secret.clone())?
        .set_default("auth.jwt_issuer", defaults.auth.jwt_issuer.clone())?
        .set_default("auth.jwt_audience", defaults.auth.jwt_audience.clone())?
        .set_default("auth.token_ttl_seconds", token_ttl)?;

    let environment_overrides = config::Environment::with_prefix("RENTAL").separator("__");

    let mut config_file_attached = false;

    if let Ok(path) = std::env::var("RENTAL_CONFIG") {
        builder = builder.add_source(config::File::from(PathBuf::from(&path)));
        config_file_attached = true;
        debug!(path, "loading configuration via RENTAL_CONFIG");
    } else if let Ok(cwd) = std::env::current_dir() {
        let fallback = DEFAULT_CONFIG_FILES
            .iter()
            .map(|candidate| cwd.join(candidate))
            .find(|path| path.exists());

        if let Some(path) = fallback {
            debug!(path = %path.display(), "loading configuration file");
            builder = builder.add_source(config::File::from(path));
            config_file_attached = true;
        }
    }

    if !config_file_attached {
        debug!("no configuration file found, relying on defaults and environment overrides");
    }

    builder = builder.add_source(environment_overrides);

    let cfg = builder.build().context("unable to build configuration")?;

    let mut config = cfg
        .try_deserialize::<AppConfig>()
        .context("invalid configuration")?;

    if config.auth.token_ttl_seconds > i64::MAX as u64 {
        config.auth.token_ttl_seconds = i64::MAX as u64;
    }

    debug!(
        http = ?config.http,
        database = ?config.database,
        mail_backend = ?config.mail.backend,
        "loaded backend configuration"
    );
    Ok(config)
}
