use sqlx::{postgres::PgPoolOptions, PgPool};
use thiserror::Error;
use tracing::info;

use crate::config::CONFIG;

/// Errors from DatabaseManager
#[derive(Debug, Error)]
pub enum DatabaseError {
    #[error("Missing configuration: {0}")]
    ConfigMissing(&'static str),

    #[error("Invalid database URL")]
    InvalidDatabaseUrl,

    #[error(transparent)]
    Sqlx(#[from] sqlx::Error),
}

/// Builds and checks the shared connection pool. Every tenant lives in the
/// same database; isolation is row-level, enforced by the tenancy core, so
/// one pool serves all requests.
pub struct DatabaseManager;

impl DatabaseManager {
    /// Connect using `DATABASE_URL`. Parses the URL up front so a
    /// malformed value fails at startup, not on first query.
    pub async fn connect() -> Result<PgPool, DatabaseError> {
        let raw = std::env::var("DATABASE_URL")
            .map_err(|_| DatabaseError::ConfigMissing("DATABASE_URL"))?;
        let parsed = url::Url::parse(&raw).map_err(|_| DatabaseError::InvalidDatabaseUrl)?;
        if parsed.scheme() != "postgres" && parsed.scheme() != "postgresql" {
            return Err(DatabaseError::InvalidDatabaseUrl);
        }

        let pool = PgPoolOptions::new()
            .max_connections(CONFIG.database.max_connections)
            .connect(&raw)
            .await?;

        info!(
            host = parsed.host_str().unwrap_or("unknown"),
            "Created database pool"
        );
        Ok(pool)
    }

    /// Pings the pool to ensure connectivity
    pub async fn health_check(pool: &PgPool) -> Result<(), DatabaseError> {
        sqlx::query("SELECT 1").execute(pool).await?;
        Ok(())
    }
}
