use std::sync::Arc;

use anyhow::{Context, Result};
use rental_config::AppConfig;
use rental_database::initialize_database;
use rental_gateway::GatewayState;
use rental_users::{mailer_from_config, Mailer, NotificationService};
use sqlx::SqlitePool;
use tracing::info;

pub mod telemetry {
    use anyhow::Result;
    use tracing::Level;
    use tracing_subscriber::{fmt::SubscriberBuilder, EnvFilter};

    pub fn init_tracing() -> Result<()> {
        let env_filter =
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

        let subscriber = SubscriberBuilder::default()
            .with_max_level(Level::INFO)
            .with_env_filter(env_filter)
            .finish();

        tracing::subscriber::set_global_default(subscriber)
            .map_err(|error| anyhow::anyhow!("failed to set tracing subscriber: {error}"))
    }
}

/// Everything the server and the admin commands share.
#[derive(Clone)]
pub struct BackendServices {
    pub db_pool: SqlitePool,
    pub mailer: Arc<dyn Mailer>,
    pub gateway: GatewayState,
}

impl BackendServices {
    pub async fn initialise(config: &AppConfig) -> Result<Self> {
        let db_pool = initialize_database(&config.database)
            .await
            .context("database initialisation failed")?;

        let mailer = mailer_from_config(&config.mail).context("failed to build mail transport")?;
        let notifications = NotificationService::new(mailer.clone(), &config.mail)
            .context("failed to load email templates")?;

        let gateway = GatewayState::from_config(config, db_pool.clone(), notifications);
        info!(
            mail_backend = ?config.mail.backend,
            fail_silently = config.mail.fail_silently,
            "backend services ready"
        );

        Ok(Self {
            db_pool,
            mailer,
            gateway,
        })
    }
}

pub async fn shutdown_signal() {
    if let Err(error) = tokio::signal::ctrl_c().await {
        tracing::warn!(?error, "failed to listen for shutdown signal");
    }
    info!("shutdown signal received");
}
