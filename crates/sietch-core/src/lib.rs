#![deny(missing_docs)]

//! # sietch-core: Admission Core for the Sietch Service
//!
//! Everything that decides whether a worm may be bred lives here. The crate
//! performs no I/O: HTTP, persistence and process bootstrap belong to
//! `sietch-api`.
//!
//! ## Admission Pipeline
//!
//! ```text
//! raw JSON ──► validate_structure ──► CandidateWorm ──► TemporalValidator ──► AdmittedWorm
//! ```
//!
//! 1. **Structural validation** ([`admission::validate_structure`]) checks
//!    shape and types, fails fast on the first bad field, and trims the name.
//! 2. **Temporal alignment** ([`TemporalValidator`]) requires
//!    `credential == SACRED_CONSTANT + effectiveTimeReference` with exact
//!    128-bit integer arithmetic. The time reference is either supplied by the
//!    caller or read once from an injectable [`Clock`].
//!
//! ## Design Principles
//!
//! 1. **Newtypes at every boundary.** A [`WormName`] is always trimmed and
//!    within the character class; a [`Credential`] always serializes as a
//!    decimal string.
//! 2. **No ambient time.** Validation reads time only through [`Clock`], so
//!    tests pin it with [`ManualClock`].
//! 3. **[`ValidationError`] is the only failure mode.** Structured errors with
//!    `thiserror`, one variant per rejected condition.

pub mod admission;
pub mod clock;
pub mod credential;
pub mod error;
pub mod identity;
pub mod page;
pub mod record;

// Re-export primary types at crate root for ergonomic imports.
pub use admission::{
    expected_credential, validate_structure, Alignment, AdmittedWorm, CandidateWorm,
    TemporalValidator, TimeSource, SACRED_CONSTANT,
};
pub use clock::{Clock, ManualClock, SystemClock};
pub use credential::{Credential, TimeReference};
pub use error::ValidationError;
pub use identity::{WormId, WormName};
pub use page::{Page, PageRequest};
pub use record::WormRecord;
