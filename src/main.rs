use anyhow::Context;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use contact_book::config::{self, AppConfig};
use contact_book::database::DatabaseManager;
use contact_book::{router, AppState};

#[derive(Parser)]
#[command(name = "contact-book")]
#[command(about = "Contact Book - per-user address book served over HTTP")]
#[command(version)]
struct Cli {
    #[arg(long, help = "Interface to bind (overrides CONTACTS_HOST)")]
    host: Option<String>,

    #[arg(long, help = "Port to listen on (overrides CONTACTS_PORT / PORT)")]
    port: Option<u16>,

    #[arg(long, help = "Keep users and contacts in process memory instead of Postgres")]
    memory: bool,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    #[command(about = "Run the web server (default)")]
    Serve,

    #[command(about = "Apply database migrations and exit")]
    Migrate,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present so DATABASE_URL and friends are picked up
    let _ = dotenvy::dotenv();

    let config = config::config().clone();

    let default_level = if config.database.enable_query_logging {
        "contact_book=debug,tower_http=debug,sqlx=info"
    } else {
        "contact_book=info,tower_http=info"
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .init();

    let cli = Cli::parse();

    match cli.command.unwrap_or(Command::Serve) {
        Command::Migrate => {
            DatabaseManager::connect_from_env(&config.database)
                .await
                .context("failed to connect and migrate")?;
            tracing::info!("Migrations complete");
            Ok(())
        }
        Command::Serve => serve(config, cli.host, cli.port, cli.memory).await,
    }
}

async fn serve(
    mut config: AppConfig,
    host: Option<String>,
    port: Option<u16>,
    memory: bool,
) -> anyhow::Result<()> {
    if let Some(host) = host {
        config.server.host = host;
    }
    if let Some(port) = port {
        config.server.port = port;
    }
    if config.security.jwt_secret.is_empty() {
        anyhow::bail!("JWT_SECRET must be set in {:?} mode", config.environment);
    }

    tracing::info!("Starting Contact Book in {:?} mode", config.environment);

    let state = if memory {
        tracing::warn!("Using the in-memory store; data is lost on exit");
        AppState::in_memory(config.clone())
    } else {
        let pool = DatabaseManager::connect_from_env(&config.database)
            .await
            .context("failed to connect to the database")?;
        AppState::postgres(config.clone(), pool)
    };

    let bind_addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", bind_addr))?;

    tracing::info!("Listening on http://{}", bind_addr);

    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutting down");
}
