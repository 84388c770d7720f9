//! Connection pools for the three sqlite databases this crate touches:
//! ALPHA and BETA sources (read-only from this crate's perspective) and the
//! UES store (read-write). One `SqlitePool` per database, shared across
//! stages via `Arc` internally.

use sqlx::migrate::Migrator;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::SqlitePool;
use std::str::FromStr;

use crate::error::ApiResult;

pub static UES_MIGRATOR: Migrator = sqlx::migrate!("./migrations/ues");
pub static ALPHA_MIGRATOR: Migrator = sqlx::migrate!("./migrations/alpha");
pub static BETA_MIGRATOR: Migrator = sqlx::migrate!("./migrations/beta");

#[derive(Clone)]
pub struct DbPools {
    pub alpha: SqlitePool,
    pub beta: SqlitePool,
    pub ues: SqlitePool,
}

async fn connect(url: &str) -> Result<SqlitePool, sqlx::Error> {
    let options = SqliteConnectOptions::from_str(url)?.create_if_missing(true);
    SqlitePoolOptions::new().max_connections(5).connect_with(options).await
}

impl DbPools {
    pub async fn connect(alpha_url: &str, beta_url: &str, ues_url: &str) -> ApiResult<Self> {
        let alpha = connect(alpha_url).await?;
        let beta = connect(beta_url).await?;
        let ues = connect(ues_url).await?;
        Ok(Self { alpha, beta, ues })
    }

    /// Runs every database's embedded migrations. Idempotent: sqlx records
    /// applied migrations in `_sqlx_migrations` and skips what's already run.
    pub async fn migrate(&self) -> ApiResult<()> {
        ALPHA_MIGRATOR.run(&self.alpha).await?;
        BETA_MIGRATOR.run(&self.beta).await?;
        UES_MIGRATOR.run(&self.ues).await?;
        Ok(())
    }
}
