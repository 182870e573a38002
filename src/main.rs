use anyhow::Context;
use clap::Parser;

use farmbazaar_api::config::{self, AppConfig};
use farmbazaar_api::database::DatabaseManager;
use farmbazaar_api::{app, AppState};

#[derive(Parser, Debug)]
#[command(name = "farmbazaar-api", version, about = "FarmBazaar marketplace API server")]
struct Args {
    /// Port to listen on (overrides PORT)
    #[arg(long)]
    port: Option<u16>,

    /// Run against an in-process store instead of PostgreSQL
    #[arg(long)]
    memory: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "farmbazaar_api=info,tower_http=info".into()),
        )
        .init();

    let args = Args::parse();

    // Load .env if present so cargo run picks up DATABASE_URL, JWT_SECRET, etc.
    let _ = dotenvy::dotenv();

    // Initialize configuration (this loads the config singleton)
    let config: AppConfig = config::config().clone();
    config.validate()?;
    tracing::info!("Starting FarmBazaar API in {:?} mode", config.environment);

    let state = if args.memory {
        tracing::warn!("using in-memory store; data is lost on exit");
        AppState::in_memory(config)?
    } else {
        let pool = DatabaseManager::connect(&config.database)
            .await
            .context("failed to connect to database")?;
        DatabaseManager::migrate(&pool).await.context("failed to run migrations")?;
        AppState::postgres(config, pool)?
    };

    state.uploads.ensure_dir().await.context("failed to create upload directory")?;
    if !state.chat.is_configured() {
        tracing::warn!("GEMINI_API_KEY not set; chat endpoints answer 503");
    }

    let port = args.port.unwrap_or(state.config.api.port);
    let bind_addr = format!("0.0.0.0:{}", port);
    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", bind_addr))?;

    tracing::info!("FarmBazaar API listening on http://{}", bind_addr);

    axum::serve(listener, app(state)).await?;
    Ok(())
}
