mod commands;

use anyhow::{bail, Context};
use clap::{Parser, Subcommand};
use rental_backend_runtime::{telemetry, BackendServices};
use rental_config::{load as load_config, AppConfig};
use rental_gateway::create_router;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::net::TcpListener;
use tracing::info;

use commands::SuperuserArgs;

#[derive(Parser)]
#[command(name = "rental-backend")]
#[command(about = "Rental account backend (serves HTTP by default)")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the HTTP server
    Serve,
    /// Apply pending database migrations and exit
    Migrate,
    /// Create an operator account with staff and superuser rights
    CreateSuperuser {
        #[arg(long)]
        email: String,
        #[arg(long)]
        company_name: String,
        #[arg(long)]
        commercial_registration: String,
        /// Read from stdin when omitted
        #[arg(long)]
        password: Option<String>,
    },
    /// Email a temporary password to an account and print it
    ResetPassword {
        #[arg(long)]
        email: String,
    },
    /// Print accounts in the admin list layout
    ListUsers {
        /// OWNER, INVESTOR, TENANT, COMPANY or GOVERNMENT
        #[arg(long)]
        user_type: Option<String>,
        #[arg(long)]
        search: Option<String>,
        #[arg(long, default_value_t = 50)]
        limit: u32,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    telemetry::init_tracing().context("failed to initialise tracing")?;
    let config = load_config().context("failed to load configuration")?;

    match cli.command.unwrap_or(Commands::Serve) {
        Commands::Serve => run_server(config).await,
        Commands::Migrate => {
            initialise(&config).await?;
            println!("Database at {} is up to date", config.database.url);
            Ok(())
        }
        Commands::CreateSuperuser {
            email,
            company_name,
            commercial_registration,
            password,
        } => {
            let password = match password {
                Some(password) => password,
                None => prompt_password().await?,
            };
            let services = initialise(&config).await?;
            let user = commands::create_superuser(
                &services,
                SuperuserArgs {
                    email,
                    company_name,
                    commercial_registration,
                    password,
                },
            )
            .await?;
            println!("Superuser {} created ({})", user.email, user.public_id);
            Ok(())
        }
        Commands::ResetPassword { email } => {
            let services = initialise(&config).await?;
            let password = commands::reset_password(&services, &email).await?;
            println!("Temporary password for {email}: {password}");
            Ok(())
        }
        Commands::ListUsers {
            user_type,
            search,
            limit,
        } => {
            let services = initialise(&config).await?;
            for line in
                commands::list_users(&services, user_type.as_deref(), search, limit).await?
            {
                println!("{line}");
            }
            Ok(())
        }
    }
}

async fn initialise(config: &AppConfig) -> anyhow::Result<BackendServices> {
    BackendServices::initialise(config)
        .await
        .context("failed to initialise backend services")
}

async fn prompt_password() -> anyhow::Result<String> {
    print!("Password: ");
    std::io::Write::flush(&mut std::io::stdout())?;

    let mut reader = BufReader::new(tokio::io::stdin());
    let mut line = String::new();
    reader.read_line(&mut line).await?;

    let password = line.trim_end_matches(['\r', '\n']).to_string();
    if password.is_empty() {
        bail!("a password is required");
    }
    Ok(password)
}

async fn run_server(config: AppConfig) -> anyhow::Result<()> {
    info!("starting rental backend");

    let services = initialise(&config).await?;
    let app = create_router(services.gateway.clone());

    let address = format!("{}:{}", config.http.address, config.http.port);
    let listener = TcpListener::bind(&address)
        .await
        .with_context(|| format!("failed to bind http listener on {address}"))?;

    info!(%address, "http server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(rental_backend_runtime::shutdown_signal())
        .await
        .context("http server error")?;

    info!("backend shut down");
    Ok(())
}
