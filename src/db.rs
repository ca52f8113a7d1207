use std::time::Duration;

use sqlx::postgres::{PgPool, PgPoolOptions};

use crate::config::Config;

/// Pool sized for one short burst of writes per submission; acquisition is
/// bounded so a saturated pool surfaces as an error instead of a stall.
pub async fn create_pool(config: &Config) -> PgPool {
    let pool = PgPoolOptions::new()
        .min_connections(config.db.pool_min)
        .max_connections(config.db.pool_max)
        .acquire_timeout(Duration::from_secs(config.db.acquire_timeout_secs))
        .connect(&config.database_url())
        .await
        .expect("Failed to connect to PostgreSQL");

    tracing::info!(
        min = config.db.pool_min,
        max = config.db.pool_max,
        "database pool ready"
    );
    pool
}
