use std::time::Duration;

use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;

use crate::application::ports::RepositoryError;

const CONNECT_ATTEMPTS: u32 = 5;
const INITIAL_BACKOFF: Duration = Duration::from_millis(500);

/// Connects with exponential backoff. The database container often comes up
/// after the service in local compose setups.
#[tracing::instrument(skip(url))]
pub async fn create_pool(url: &str, max_connections: u32) -> Result<PgPool, RepositoryError> {
    let options = PgPoolOptions::new()
        .max_connections(max_connections)
        .acquire_timeout(Duration::from_secs(5));

    let mut backoff = INITIAL_BACKOFF;
    let mut attempt = 1;
    loop {
        match options.clone().connect(url).await {
            Ok(pool) => {
                tracing::info!(max_connections, "Database pool ready");
                return Ok(pool);
            }
            Err(e) if attempt < CONNECT_ATTEMPTS => {
                tracing::warn!(
                    error = %e,
                    attempt,
                    backoff_ms = backoff.as_millis() as u64,
                    "Database connection failed, retrying"
                );
                tokio::time::sleep(backoff).await;
                backoff *= 2;
                attempt += 1;
            }
            Err(e) => return Err(RepositoryError::ConnectionFailed(e.to_string())),
        }
    }
}
