//! API Module
//!
//! HTTP handlers and routing for the cache server REST API.
//!
//! # Endpoints
//! - `PUT|GET|DELETE /cache/:key` - Store, read or delete an entry
//! - `POST /invalidate/tags` - Tag invalidation
//! - `POST /invalidate/pattern` - Regex invalidation
//! - `GET /stats` - Cache statistics
//! - `GET /health` - Health check endpoint

pub mod handlers;
pub mod routes;

pub use handlers::*;
pub use routes::create_router;
