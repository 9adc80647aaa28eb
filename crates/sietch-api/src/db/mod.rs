//! # Database Persistence Layer
//!
//! Optional Postgres persistence for the worm store via SQLx.
//!
//! When `DATABASE_URL` is set, every admitted worm is written to the
//! `worms` table and the in-memory store is hydrated from it on startup.
//! When absent, the API runs in memory only and forgets everything on
//! restart (suitable for development and testing).

pub mod worms;

use sqlx::postgres::{PgPool, PgPoolOptions};

/// Initialize the database connection pool and run migrations.
///
/// Returns `None` if `DATABASE_URL` is not set (in-memory-only mode).
/// Returns `Err` if the URL is set but the connection or migration fails.
pub async fn init_pool() -> Result<Option<PgPool>, sqlx::Error> {
    let url = match std::env::var("DATABASE_URL") {
        Ok(url) if !url.is_empty() => url,
        _ => {
            tracing::warn!(
                "DATABASE_URL not set, running in-memory only. \
                 Worms will not survive restarts."
            );
            return Ok(None);
        }
    };

    let pool = PgPoolOptions::new()
        .max_connections(10)
        .min_connections(1)
        .acquire_timeout(std::time::Duration::from_secs(5))
        .connect(&url)
        .await?;

    tracing::info!("Connected to PostgreSQL");

    sqlx::migrate!("./migrations").run(&pool).await?;
    tracing::info!("Database migrations applied");

    Ok(Some(pool))
}
