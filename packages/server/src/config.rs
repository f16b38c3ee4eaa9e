use anyhow::{Context, Result};
use dotenvy::dotenv;
use std::env;
use std::time::Duration;
use tracing::warn;

use crate::domains::departments::DepartmentCatalog;

/// Application configuration loaded from environment variables
#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub port: u16,
    pub jwt_secret: String,
    pub jwt_issuer: String,
    pub db_max_connections: u32,
    pub analytics_cache_ttl: chrono::Duration,
    pub outbox_poll_interval: Duration,
    /// JSON file replacing the built-in department catalog
    pub department_catalog_path: Option<String>,
    /// Empty means any origin
    pub allowed_origins: Vec<String>,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        // Load .env file if present (development)
        let _ = dotenv();

        Ok(Self {
            database_url: env::var("DATABASE_URL").context("DATABASE_URL must be set")?,
            port: env::var("PORT")
                .unwrap_or_else(|_| "8080".to_string())
                .parse()
                .context("PORT must be a valid number")?,
            jwt_secret: env::var("JWT_SECRET").context("JWT_SECRET must be set")?,
            jwt_issuer: env::var("JWT_ISSUER").unwrap_or_else(|_| "civic-issues".to_string()),
            db_max_connections: env::var("DB_MAX_CONNECTIONS")
                .unwrap_or_else(|_| "10".to_string())
                .parse()
                .context("DB_MAX_CONNECTIONS must be a valid number")?,
            analytics_cache_ttl: chrono::Duration::minutes(
                env::var("ANALYTICS_CACHE_TTL_MINUTES")
                    .unwrap_or_else(|_| "30".to_string())
                    .parse()
                    .context("ANALYTICS_CACHE_TTL_MINUTES must be a valid number")?,
            ),
            outbox_poll_interval: Duration::from_secs(
                env::var("OUTBOX_POLL_INTERVAL_SECS")
                    .unwrap_or_else(|_| "5".to_string())
                    .parse()
                    .context("OUTBOX_POLL_INTERVAL_SECS must be a valid number")?,
            ),
            department_catalog_path: env::var("DEPARTMENT_CATALOG_PATH").ok(),
            allowed_origins: env::var("ALLOWED_ORIGINS")
                .map(|raw| parse_origins(&raw))
                .unwrap_or_default(),
        })
    }

    /// The configured catalog file, or the built-in departments.
    pub fn load_catalog(&self) -> Result<DepartmentCatalog> {
        let catalog = match &self.department_catalog_path {
            Some(path) => DepartmentCatalog::from_json_file(path)
                .with_context(|| format!("Failed to load department catalog from {}", path))?,
            None => DepartmentCatalog::builtin(),
        };

        let unserved = catalog.unserved_categories();
        if !unserved.is_empty() {
            warn!(
                ?unserved,
                fallback = %catalog.fallback().id,
                "Some categories have no department and will route to the fallback"
            );
        }
        Ok(catalog)
    }
}

fn parse_origins(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty() && *s != "*")
        .map(String::from)
        .collect()
}
