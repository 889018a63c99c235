//! Background Tasks Module
//!
//! Contains background tasks that run periodically while a cache manager is started.
//!
//! # Tasks
//! - Cache cleanup: sweeps expired entries and watches the hit rate

mod cleanup;

pub use cleanup::{run_cleanup_pass, spawn_cleanup_task, CleanupReport, CleanupSettings};
