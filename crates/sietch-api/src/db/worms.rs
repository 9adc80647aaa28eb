//! Worm persistence operations on the `worms` table.
//!
//! Credentials are stored as decimal text. A row whose name or credential no
//! longer parses is a decode error, not a silently repaired record.

use chrono::{DateTime, Utc};
use sietch_core::{Credential, WormId, WormName, WormRecord};
use sqlx::PgPool;
use uuid::Uuid;

/// Insert a newly admitted worm.
pub async fn insert(pool: &PgPool, record: &WormRecord) -> Result<(), sqlx::Error> {
    sqlx::query(
        "INSERT INTO worms (id, name, credential, created_at)
         VALUES ($1, $2, $3, $4)",
    )
    .bind(record.id.as_uuid())
    .bind(record.name.as_str())
    .bind(record.credential.to_string())
    .bind(record.created_at)
    .execute(pool)
    .await?;

    Ok(())
}

/// Delete a worm. Returns whether a row was removed.
pub async fn delete(pool: &PgPool, id: &WormId) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("DELETE FROM worms WHERE id = $1")
        .bind(id.as_uuid())
        .execute(pool)
        .await?;

    Ok(result.rows_affected() > 0)
}

/// Replace a worm's name. Returns whether a row was updated.
pub async fn rename(pool: &PgPool, id: &WormId, name: &WormName) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("UPDATE worms SET name = $1 WHERE id = $2")
        .bind(name.as_str())
        .bind(id.as_uuid())
        .execute(pool)
        .await?;

    Ok(result.rows_affected() > 0)
}

/// Load every worm in insertion order, for hydrating the in-memory store.
pub async fn load_all(pool: &PgPool) -> Result<Vec<WormRecord>, sqlx::Error> {
    let rows = sqlx::query_as::<_, WormRow>(
        "SELECT id, name, credential, created_at FROM worms ORDER BY seq",
    )
    .fetch_all(pool)
    .await?;

    rows.into_iter().map(WormRow::into_record).collect()
}

/// Internal row type for SQLx mapping.
#[derive(sqlx::FromRow)]
struct WormRow {
    id: Uuid,
    name: String,
    credential: String,
    created_at: DateTime<Utc>,
}

impl WormRow {
    fn into_record(self) -> Result<WormRecord, sqlx::Error> {
        let name = WormName::new(&self.name).map_err(|e| {
            tracing::error!(id = %self.id, error = %e, "stored worm name is invalid");
            sqlx::Error::Decode(Box::new(e))
        })?;
        let credential: Credential = self.credential.parse().map_err(|e| {
            tracing::error!(id = %self.id, error = %e, "stored credential is not an integer");
            sqlx::Error::Decode(Box::new(e))
        })?;

        Ok(WormRecord {
            id: WormId::from_uuid(self.id),
            name,
            credential,
            created_at: self.created_at,
        })
    }
}
