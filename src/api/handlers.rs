//! API Handlers
//!
//! HTTP request handlers for each cache server endpoint. Cache calls may hit
//! the disk tier, so they run on the blocking pool.

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    Json,
};
use serde_json::Value;

use crate::cache::{CacheManager, CacheStats};
use crate::config::CacheConfig;
use crate::error::{CacheError, Result};
use crate::models::{
    validate_key, DeleteResponse, GetResponse, HealthResponse, InvalidatePatternRequest,
    InvalidateResponse, InvalidateTagsRequest, SetRequest, SetResponse,
};

/// Application state shared across all handlers.
#[derive(Clone)]
pub struct AppState {
    /// Cache holding arbitrary JSON values
    pub cache: Arc<CacheManager<Value>>,
}

impl AppState {
    /// Creates a new AppState around an existing manager.
    pub fn new(cache: CacheManager<Value>) -> Self {
        Self {
            cache: Arc::new(cache),
        }
    }

    /// Opens a cache manager from configuration.
    pub fn from_config(config: &CacheConfig) -> Result<Self> {
        Ok(Self::new(CacheManager::new(config.clone())?))
    }
}

/// Runs a cache call on the blocking pool.
async fn with_cache<T, F>(state: &AppState, f: F) -> Result<T>
where
    T: Send + 'static,
    F: FnOnce(&CacheManager<Value>) -> T + Send + 'static,
{
    let cache = Arc::clone(&state.cache);
    tokio::task::spawn_blocking(move || f(&cache))
        .await
        .map_err(|e| CacheError::Internal(e.to_string()))
}

fn checked_key(key: String) -> Result<String> {
    match validate_key(&key) {
        Some(error_msg) => Err(CacheError::InvalidRequest(error_msg)),
        None => Ok(key),
    }
}

/// Handler for PUT /cache/:key
pub async fn set_handler(
    State(state): State<AppState>,
    Path(key): Path<String>,
    Json(req): Json<SetRequest>,
) -> Result<Json<SetResponse>> {
    let key = checked_key(key)?;

    let options = req.options();
    let stored_key = key.clone();
    let stored = with_cache(&state, move |cache| cache.set(&stored_key, req.value, options)).await?;
    if !stored {
        return Err(CacheError::WriteRejected(format!(
            "cache refused to store '{}'",
            key
        )));
    }

    Ok(Json(SetResponse::new(key)))
}

/// Handler for GET /cache/:key
pub async fn get_handler(
    State(state): State<AppState>,
    Path(key): Path<String>,
) -> Result<Json<GetResponse>> {
    let key = checked_key(key)?;

    let lookup = key.clone();
    let value = with_cache(&state, move |cache| cache.get(&lookup))
        .await?
        .ok_or_else(|| CacheError::NotFound(key.clone()))?;

    Ok(Json(GetResponse::new(key, value)))
}

/// Handler for DELETE /cache/:key
///
/// Dependents of the key are removed as well.
pub async fn delete_handler(
    State(state): State<AppState>,
    Path(key): Path<String>,
) -> Result<Json<DeleteResponse>> {
    let key = checked_key(key)?;

    let target = key.clone();
    if !with_cache(&state, move |cache| cache.delete(&target)).await? {
        return Err(CacheError::NotFound(key));
    }

    Ok(Json(DeleteResponse::new(key)))
}

/// Handler for POST /invalidate/tags
pub async fn invalidate_tags_handler(
    State(state): State<AppState>,
    Json(req): Json<InvalidateTagsRequest>,
) -> Result<Json<InvalidateResponse>> {
    let removed = with_cache(&state, move |cache| cache.invalidate_by_tags(&req.tags)).await?;
    Ok(Json(InvalidateResponse { removed }))
}

/// Handler for POST /invalidate/pattern
pub async fn invalidate_pattern_handler(
    State(state): State<AppState>,
    Json(req): Json<InvalidatePatternRequest>,
) -> Result<Json<InvalidateResponse>> {
    let removed =
        with_cache(&state, move |cache| cache.invalidate_by_pattern(&req.pattern)).await??;
    Ok(Json(InvalidateResponse { removed }))
}

/// Handler for GET /stats
pub async fn stats_handler(State(state): State<AppState>) -> Result<Json<CacheStats>> {
    let stats = with_cache(&state, |cache| cache.stats()).await?;
    Ok(Json(stats))
}

/// Handler for GET /health
pub async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse::healthy())
}
