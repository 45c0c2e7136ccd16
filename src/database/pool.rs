use crate::config::get_config;
use crate::error::Result;
use sqlx::{postgres::PgPoolOptions, PgPool};

const ACQUIRE_TIMEOUT_SECS: u64 = 30;

/// Connection pool sized from config. Slot joins hold row locks for the
/// duration of their transaction, so the pool must stay large enough that a
/// burst of joins cannot starve the automation worker of connections.
pub async fn create_pool() -> Result<PgPool> {
    let config = get_config();
    let pool = PgPoolOptions::new()
        .max_connections(config.db_max_connections)
        .acquire_timeout(std::time::Duration::from_secs(ACQUIRE_TIMEOUT_SECS))
        .connect(&config.database_url)
        .await?;
    Ok(pool)
}
