use sqlx::{postgres::PgPoolOptions, PgPool};
use std::time::Duration;
use tracing::info;
use url::Url;

use crate::config::DatabaseConfig;
use crate::store::StoreError;

/// Builds the Postgres connection pool from configuration.
pub struct DatabaseManager;

impl DatabaseManager {
    /// Connect a pool using `DATABASE_URL` and the pool settings in `config`.
    pub async fn connect(config: &DatabaseConfig) -> Result<PgPool, StoreError> {
        let raw = config
            .url
            .as_deref()
            .ok_or_else(|| StoreError::Unavailable("Missing configuration: DATABASE_URL".to_string()))?;
        let url = Self::parse_url(raw)?;

        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .acquire_timeout(Duration::from_secs(config.connection_timeout))
            .connect(raw)
            .await?;

        info!("Created database pool for: {}", Self::redacted(&url));
        Ok(pool)
    }

    /// Accepts postgres:// and postgresql:// URLs naming a database.
    pub fn parse_url(raw: &str) -> Result<Url, StoreError> {
        let url = Url::parse(raw).map_err(|_| StoreError::Unavailable("Invalid database URL".to_string()))?;
        match url.scheme() {
            "postgres" | "postgresql" => {}
            other => {
                return Err(StoreError::Unavailable(format!("Unsupported database scheme: {}", other)));
            }
        }
        if url.path().trim_start_matches('/').is_empty() {
            return Err(StoreError::Unavailable("Database URL does not name a database".to_string()));
        }
        Ok(url)
    }

    /// URL with the password masked, for logs.
    pub fn redacted(url: &Url) -> String {
        let mut masked = url.clone();
        if masked.password().is_some() {
            let _ = masked.set_password(Some("***"));
        }
        masked.to_string()
    }
}
