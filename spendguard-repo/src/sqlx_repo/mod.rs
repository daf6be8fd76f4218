mod catalog_repo;
mod predicates;
mod transaction_repo;

use crate::catalog_repo::CatalogRepo;
use crate::sqlx_repo::catalog_repo::SQLxCatalogRepo;
use crate::sqlx_repo::transaction_repo::SQLxTransactionRepo;
use crate::transaction_repo::TransactionRepo;
use crate::HealthCheck;
use anyhow::Context;
use async_trait::async_trait;
use sqlx::postgres::{PgConnectOptions, PgPoolOptions};
use sqlx::{Pool, Postgres};
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

const ACQUIRE_TIMEOUT: Duration = Duration::from_secs(10);
// Set per connection so a stuck query fails instead of hanging the request.
const STATEMENT_TIMEOUT_MS: &str = "30000";

pub async fn create_repos(
    database_url: &str,
    max_pool_size: u32,
) -> Result<
    (
        Arc<dyn TransactionRepo>,
        Arc<dyn CatalogRepo>,
        Arc<dyn HealthCheck>,
    ),
    anyhow::Error,
> {
    let connect_options = PgConnectOptions::from_str(database_url)
        .context("Unable to parse database URL")?
        .options([("statement_timeout", STATEMENT_TIMEOUT_MS)]);
    let pool = PgPoolOptions::new()
        .max_connections(max_pool_size)
        .acquire_timeout(ACQUIRE_TIMEOUT)
        .connect_with(connect_options)
        .await
        .context("Unable to connect to database")?;
    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .context("Unable to run migrations")?;

    let transaction_repo = SQLxTransactionRepo::new(pool.clone());
    let catalog_repo = SQLxCatalogRepo::new(pool.clone());
    let health_check = SQLxHealthCheck { pool };
    Ok((
        Arc::new(transaction_repo),
        Arc::new(catalog_repo),
        Arc::new(health_check),
    ))
}

struct SQLxHealthCheck {
    pool: Pool<Postgres>,
}

#[async_trait]
impl HealthCheck for SQLxHealthCheck {
    async fn check(&self) -> bool {
        sqlx::query_scalar::<_, i32>("SELECT 1")
            .fetch_one(&self.pool)
            .await
            .is_ok()
    }
}
