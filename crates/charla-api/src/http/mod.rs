//! HTTP/REST API layer for charla.
//!
//! Axum-based REST API at `/api/v1/` with API key authentication,
//! envelope error format, and CORS support.

pub mod error;
pub mod extractors;
pub mod handlers;
pub mod router;
