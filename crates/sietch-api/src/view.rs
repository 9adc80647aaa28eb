//! # Output Transform
//!
//! The external representation of a worm. Built from a stored record by a
//! pure conversion; the record itself is never altered for presentation.
//!
//! - `credential` is a decimal string, written by [`Credential`]'s own
//!   `Serialize`. Consumers with 64-bit floats or ints would otherwise lose
//!   precision.
//! - The time reference does not exist here. It was never stored.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sietch_core::{Credential, WormName, WormRecord};
use utoipa::ToSchema;
use uuid::Uuid;

/// A worm as returned by every endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct WormView {
    pub id: Uuid,
    #[schema(value_type = String, example = "Shai Hulud")]
    pub name: WormName,
    /// Decimal string, e.g. `"10000000000099"`.
    #[schema(value_type = String, example = "10000000000099")]
    pub credential: Credential,
    pub created_at: DateTime<Utc>,
}

impl From<&WormRecord> for WormView {
    fn from(record: &WormRecord) -> Self {
        Self {
            id: *record.id.as_uuid(),
            name: record.name.clone(),
            credential: record.credential,
            created_at: record.created_at,
        }
    }
}
