//! tiercache - A two-tier memory and disk cache
//!
//! A byte-bounded LRU memory tier sits in front of a persistent disk tier.
//! Entries carry TTLs, tags and dependencies; hot disk entries are promoted
//! into memory. [`CacheManager`] is the entry point; the `api` module exposes
//! it over HTTP.

pub mod api;
pub mod cache;
pub mod config;
pub mod error;
pub mod models;
pub mod tasks;

pub use api::{create_router, AppState};
pub use cache::{CacheLevel, CacheManager, CacheStats, SetOptions};
pub use config::{CacheConfig, Config};
pub use error::{CacheError, Result};
pub use tasks::spawn_cleanup_task;
