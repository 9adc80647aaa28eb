//! # Worm Record
//!
//! The stored form of an admitted worm. The time reference used to judge it
//! is gone by the time a record exists; the credential is kept verbatim.

use chrono::{DateTime, Utc};

use crate::admission::AdmittedWorm;
use crate::credential::Credential;
use crate::identity::{WormId, WormName};

/// A worm as held by the record store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WormRecord {
    /// Store-assigned identifier, immutable.
    pub id: WormId,
    /// Current name; the only mutable field.
    pub name: WormName,
    /// Credential exactly as submitted.
    pub credential: Credential,
    /// Creation instant, the default listing sort key.
    pub created_at: DateTime<Utc>,
}

impl WormRecord {
    /// Build the record for a newly admitted worm with a fresh identifier.
    pub fn spawn(admitted: AdmittedWorm, created_at: DateTime<Utc>) -> Self {
        Self {
            id: WormId::new(),
            name: admitted.name,
            credential: admitted.credential,
            created_at,
        }
    }
}
