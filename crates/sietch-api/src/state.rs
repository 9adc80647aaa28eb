//! # Application State
//!
//! Shared state for the Axum application, passed to all route handlers
//! via the `State` extractor.
//!
//! ## Architecture
//!
//! - **Worm store**: in-memory index of admitted worms, written through to
//!   PostgreSQL when a pool is configured and hydrated from it on startup.
//! - **Temporal validator**: judges credentials against an injectable clock.
//! - **Metrics**: Prometheus registry shared with the metrics middleware.
//! - **Configuration**: port, gate secret, feature switches.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use parking_lot::RwLock;
use sietch_core::{Clock, Page, PageRequest, SystemClock, TemporalValidator, WormId, WormName, WormRecord};
use sqlx::PgPool;
use thiserror::Error;

use crate::auth::SecretToken;
use crate::middleware::metrics::ApiMetrics;

// -- Worm Store ---------------------------------------------------------------

/// Failure of a record store operation.
#[derive(Error, Debug)]
pub enum StoreError {
    /// No worm with this identifier.
    #[error("worm {0} not found")]
    NotFound(WormId),

    /// The database rejected or could not serve the operation.
    #[error("database error: {0}")]
    Unavailable(#[from] sqlx::Error),
}

/// Insertion-ordered index. `by_seq` iterates oldest first.
#[derive(Debug, Default)]
struct Index {
    next_seq: u64,
    by_seq: BTreeMap<u64, WormRecord>,
    seq_of: HashMap<WormId, u64>,
}

impl Index {
    fn insert(&mut self, record: WormRecord) {
        let seq = self.next_seq;
        self.next_seq += 1;
        self.seq_of.insert(record.id, seq);
        self.by_seq.insert(seq, record);
    }

    fn get(&self, id: &WormId) -> Option<&WormRecord> {
        self.seq_of.get(id).and_then(|seq| self.by_seq.get(seq))
    }

    fn get_mut(&mut self, id: &WormId) -> Option<&mut WormRecord> {
        let seq = self.seq_of.get(id)?;
        self.by_seq.get_mut(seq)
    }

    fn remove(&mut self, id: &WormId) -> Option<WormRecord> {
        let seq = self.seq_of.remove(id)?;
        self.by_seq.remove(&seq)
    }
}

/// Thread-safe, cloneable store of admitted worms.
///
/// Reads are served from memory. Mutations go to Postgres first (when a
/// pool is configured) and touch memory only once the database accepted
/// them, so a failed write leaves both sides unchanged. The `parking_lot`
/// lock is never held across `.await`.
#[derive(Debug, Clone)]
pub struct WormStore {
    index: Arc<RwLock<Index>>,
    pool: Option<PgPool>,
}

impl WormStore {
    /// Create an empty store, persisting through `pool` when given.
    pub fn new(pool: Option<PgPool>) -> Self {
        Self {
            index: Arc::new(RwLock::new(Index::default())),
            pool,
        }
    }

    /// Database pool, if persistence is enabled.
    pub fn pool(&self) -> Option<&PgPool> {
        self.pool.as_ref()
    }

    /// Store a newly admitted worm.
    pub async fn create(&self, record: WormRecord) -> Result<WormRecord, StoreError> {
        if let Some(pool) = &self.pool {
            crate::db::worms::insert(pool, &record).await?;
        }
        self.index.write().insert(record.clone());
        Ok(record)
    }

    /// Fetch one worm.
    pub fn find_by_id(&self, id: &WormId) -> Result<WormRecord, StoreError> {
        self.index
            .read()
            .get(id)
            .cloned()
            .ok_or(StoreError::NotFound(*id))
    }

    /// Delete one worm.
    pub async fn delete_by_id(&self, id: &WormId) -> Result<(), StoreError> {
        if !self.index.read().seq_of.contains_key(id) {
            return Err(StoreError::NotFound(*id));
        }
        if let Some(pool) = &self.pool {
            if !crate::db::worms::delete(pool, id).await? {
                tracing::warn!(worm_id = %id, "worm missing from database during delete");
            }
        }
        self.index
            .write()
            .remove(id)
            .map(|_| ())
            .ok_or(StoreError::NotFound(*id))
    }

    /// Replace a worm's name, returning the updated record.
    pub async fn update_name_by_id(
        &self,
        id: &WormId,
        name: WormName,
    ) -> Result<WormRecord, StoreError> {
        if !self.index.read().seq_of.contains_key(id) {
            return Err(StoreError::NotFound(*id));
        }
        if let Some(pool) = &self.pool {
            if !crate::db::worms::rename(pool, id, &name).await? {
                tracing::warn!(worm_id = %id, "worm missing from database during rename");
            }
        }
        let mut index = self.index.write();
        let record = index.get_mut(id).ok_or(StoreError::NotFound(*id))?;
        record.name = name;
        Ok(record.clone())
    }

    /// One page of worms, newest first, with the collection size.
    pub fn list_page(&self, request: PageRequest) -> Page<WormRecord> {
        let index = self.index.read();
        let items = index
            .by_seq
            .values()
            .rev()
            .skip(request.skip())
            .take(request.limit() as usize)
            .cloned()
            .collect();
        Page {
            items,
            request,
            total: index.by_seq.len(),
        }
    }

    /// Number of stored worms.
    pub fn len(&self) -> usize {
        self.index.read().by_seq.len()
    }

    /// Whether the store is empty.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Load every persisted worm into memory, oldest first.
    ///
    /// Returns the number of worms loaded; zero when persistence is disabled.
    pub async fn hydrate(&self) -> Result<usize, StoreError> {
        let Some(pool) = &self.pool else {
            return Ok(0);
        };
        let records = crate::db::worms::load_all(pool).await?;
        let count = records.len();
        let mut index = self.index.write();
        for record in records {
            index.insert(record);
        }
        Ok(count)
    }

    /// Round-trip to the database, if one is configured.
    pub async fn ping(&self) -> Result<(), StoreError> {
        if let Some(pool) = &self.pool {
            sqlx::query("SELECT 1").execute(pool).await?;
        }
        Ok(())
    }
}

impl Default for WormStore {
    fn default() -> Self {
        Self::new(None)
    }
}

// -- Application State --------------------------------------------------------

/// Gate secret used when `PAIN_TOKEN` is not set.
pub const DEFAULT_PAIN_TOKEN: &str = "I-must-not-fear";

/// Application configuration.
///
/// `Debug` is safe to log: [`SecretToken`] redacts itself.
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Port to bind the HTTP server to.
    pub port: u16,
    /// Expected value of the `X-Pain-Token` header.
    pub pain_token: SecretToken,
    /// Whether `/metrics` and the metrics middleware are mounted.
    pub metrics_enabled: bool,
}

impl AppConfig {
    /// Build configuration from `PORT`, `PAIN_TOKEN` and `SIETCH_METRICS_ENABLED`.
    pub fn from_env() -> Self {
        let defaults = Self::default();

        let port = std::env::var("PORT")
            .ok()
            .and_then(|p| p.parse().ok())
            .unwrap_or(defaults.port);

        let pain_token = match std::env::var("PAIN_TOKEN") {
            Ok(token) if !token.is_empty() => SecretToken::new(token),
            _ => {
                tracing::warn!(
                    "PAIN_TOKEN not set, using the well-known default token. \
                     Set PAIN_TOKEN in any shared deployment."
                );
                defaults.pain_token
            }
        };

        let metrics_enabled = std::env::var("SIETCH_METRICS_ENABLED")
            .map(|v| v.to_lowercase() != "false")
            .unwrap_or(true);

        Self {
            port,
            pain_token,
            metrics_enabled,
        }
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            port: 3000,
            pain_token: SecretToken::new(DEFAULT_PAIN_TOKEN),
            metrics_enabled: true,
        }
    }
}

/// Shared application state accessible to all route handlers.
///
/// Clone-friendly via `Arc` internals.
#[derive(Debug, Clone)]
pub struct AppState {
    pub worms: WormStore,
    pub validator: TemporalValidator,
    pub metrics: ApiMetrics,
    pub config: AppConfig,
}

impl AppState {
    /// Default configuration, wall clock, in-memory store.
    pub fn new() -> Self {
        Self::with_config(AppConfig::default())
    }

    /// Given configuration, wall clock, in-memory store.
    pub fn with_config(config: AppConfig) -> Self {
        Self::with_parts(config, Arc::new(SystemClock), None)
    }

    /// Fully specified state. Tests pass a `ManualClock` here.
    pub fn with_parts(config: AppConfig, clock: Arc<dyn Clock>, db_pool: Option<PgPool>) -> Self {
        Self {
            worms: WormStore::new(db_pool),
            validator: TemporalValidator::new(clock),
            metrics: ApiMetrics::new(),
            config,
        }
    }

    /// Hydrate the in-memory store from the database.
    ///
    /// Called once on startup; a no-op without a pool.
    pub async fn hydrate_from_db(&self) -> Result<(), StoreError> {
        if self.worms.pool().is_none() {
            return Ok(());
        }
        let count = self.worms.hydrate().await?;
        tracing::info!(worms = count, "Hydrated worm store from database");
        Ok(())
    }
}

impl Default for AppState {
    fn default() -> Self {
        Self::new()
    }
}
