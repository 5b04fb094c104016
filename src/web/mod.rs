//! HTTP boundary — routes and request-principal extraction.

pub mod routes;

pub use routes::{AppState, compliance_routes};
