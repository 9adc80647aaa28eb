//! # Middleware Stack
//!
//! Tower middleware for the API layer:
//! - [`metrics`]: Prometheus request and admission metrics.
//!
//! The pain token gate lives in [`crate::auth`] and request tracing is
//! `tower_http::trace::TraceLayer`, mounted in [`crate::app`].

pub mod metrics;
