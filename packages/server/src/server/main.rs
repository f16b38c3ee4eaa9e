// Civic Issues API server

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::{Context, Result};
use civic_core::domains::notifications::activities::run_outbox_sweeper;
use civic_core::kernel::{ServerDeps, DASHBOARD_CACHE_KEY};
use civic_core::server::{auth::JwtService, build_app};
use civic_core::Config;
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

async fn connect_store(config: &Config) -> Result<PgPool> {
    let pool = PgPoolOptions::new()
        .max_connections(config.db_max_connections)
        .connect(&config.database_url)
        .await
        .context("Failed to connect to database")?;

    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .context("Failed to run migrations")?;

    info!(
        max_connections = config.db_max_connections,
        "Database connected and migrated"
    );
    Ok(pool)
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,civic_core=debug,sqlx=warn".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env().context("Failed to load configuration")?;
    let catalog = config.load_catalog()?;
    info!(
        departments = catalog.departments().len(),
        fallback = %catalog.fallback().id,
        analytics_ttl_minutes = config.analytics_cache_ttl.num_minutes(),
        "Configuration loaded"
    );

    let pool = connect_store(&config).await?;
    let deps = ServerDeps::production(pool, catalog)
        .with_analytics_cache(DASHBOARD_CACHE_KEY, config.analytics_cache_ttl);

    // Drains events a crash left in the outbox, then keeps polling
    tokio::spawn(run_outbox_sweeper(deps.clone(), config.outbox_poll_interval));

    let jwt_service = Arc::new(JwtService::new(&config.jwt_secret, config.jwt_issuer.clone()));
    let app = build_app(deps, jwt_service, &config.allowed_origins);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind to {}", addr))?;
    info!(%addr, "Civic Issues API listening");

    axum::serve(listener, app.into_make_service_with_connect_info::<SocketAddr>())
        .await
        .context("Server error")?;

    Ok(())
}
