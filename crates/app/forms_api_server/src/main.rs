//! Forms Anyware API server binary.

use clap::Parser;
use forms_api::config::ApiConfig;
use sqlx::postgres::PgPoolOptions;
use tracing::info;

/// CLI arguments for the API server. Flags override the environment.
#[derive(Parser, Debug)]
#[command(name = "forms_api_server", about = "Forms Anyware API server")]
struct Args {
    /// Address to listen on.
    #[arg(long, env = "BIND_ADDR", default_value = "0.0.0.0:5000")]
    bind_addr: String,

    /// PostgreSQL connection URL.
    #[arg(
        long,
        env = "DATABASE_URL",
        default_value = "postgres://localhost:5432/forms_anyware"
    )]
    database_url: String,

    /// Maximum number of database connections in the pool.
    #[arg(long, default_value_t = 5)]
    max_connections: u32,

    /// Skip running embedded migrations on startup.
    #[arg(long, default_value_t = false)]
    skip_migrations: bool,
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!("failed to listen for ctrl-c: {e}");
        std::future::pending::<()>().await;
    }
    info!("shutdown signal received");
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,forms_api=debug,forms_core=debug".into()),
        )
        .init();

    let args = Args::parse();

    let mut config = ApiConfig::from_env()?;
    config.bind_addr = args.bind_addr;
    config.database_url = args.database_url;

    if config.environment.is_production()
        && config.auth.secret_key == forms_core::settings::DEFAULT_SECRET_KEY
        && config.auth.jwt_secret_key.is_none()
    {
        return Err("SECRET_KEY or JWT_SECRET_KEY must be set in production".into());
    }

    info!(
        bind_addr = %config.bind_addr,
        environment = ?config.environment,
        max_connections = args.max_connections,
        "starting forms_api_server"
    );

    let pool = PgPoolOptions::new()
        .max_connections(args.max_connections)
        .acquire_timeout(std::time::Duration::from_secs(30))
        .connect(&config.database_url)
        .await?;

    if !args.skip_migrations {
        info!("running database migrations");
        forms_api::migrate(&pool).await?;
    }

    let listener = tokio::net::TcpListener::bind(&config.bind_addr).await?;
    let local_addr = listener.local_addr()?;

    let state = forms_api::AppState::from_pool(pool, config);
    let app = forms_api::router(state);

    info!(addr = %local_addr, "REST API listening");
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}
