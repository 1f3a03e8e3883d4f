use std::str::FromStr;

use deadpool_postgres::{
    Config, CreatePoolError, ManagerConfig, Pool, PoolConfig, PoolError, RecyclingMethod, Runtime,
};
use thiserror::Error;
use tokio_postgres::NoTls;
use tracing::info;

pub type PgPool = Pool;

pub const DEFAULT_POOL_SIZE: usize = 16;

#[derive(Debug, Error)]
pub enum DbPoolError {
    #[error("invalid database url: {0}")]
    InvalidConfig(String),
    #[error("failed to create database pool: {0}")]
    PoolCreation(#[from] CreatePoolError),
    #[error("database unreachable: {0}")]
    Unreachable(#[from] PoolError),
    #[error("database probe failed: {0}")]
    Probe(#[from] tokio_postgres::Error),
}

/// Builds a lazily-connecting pool. No connection is opened here.
pub fn create_pool_from_url(db_url: &str, max_size: usize) -> Result<PgPool, DbPoolError> {
    tokio_postgres::Config::from_str(db_url)
        .map_err(|e| DbPoolError::InvalidConfig(e.to_string()))?;

    let mut cfg = Config::new();
    cfg.url = Some(db_url.to_string());
    cfg.manager = Some(ManagerConfig {
        recycling_method: RecyclingMethod::Fast,
    });
    cfg.pool = Some(PoolConfig::new(max_size.max(1)));

    Ok(cfg.create_pool(Some(Runtime::Tokio1), NoTls)?)
}

/// Same as [`create_pool_from_url`] but fails fast when the database cannot
/// answer a trivial query.
pub async fn create_pool_from_url_checked(
    db_url: &str,
    max_size: usize,
) -> Result<PgPool, DbPoolError> {
    let pool = create_pool_from_url(db_url, max_size)?;
    let client = pool.get().await?;
    client.simple_query("SELECT 1").await?;
    info!(max_size, "database pool ready");
    Ok(pool)
}
