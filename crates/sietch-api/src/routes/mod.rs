//! # Route Modules
//!
//! | Prefix              | Module       | Gate |
//! |---------------------|--------------|------|
//! | `/`, `/sietch/entry` | [`sietch`]  | entry only |
//! | `/sietch/breed`, `/sietch/recycle/*`, `/sietch/rename/*` | [`worms`] | yes |
//! | `/sietch/swarm*`    | [`worms`]    | no   |
//!
//! Each module exposes a public and a protected router; [`crate::app`] wraps
//! the protected ones in the pain token gate.

pub mod sietch;
pub mod worms;
