use axum::{extract::Query, Router};
use std::sync::Arc;

use crate::models::AppState;

pub mod concurrent;
pub mod health;
pub mod internal;

/// Raw query-string pairs in request order.
///
/// Wrapped in `Option` so a malformed or repeated parameter never becomes a
/// rejection; handlers only ever answer with their own status codes.
pub type QueryPairs = Option<Query<Vec<(String, String)>>>;

/// First value of `key` in `query`, if present.
pub fn first_param(query: &QueryPairs, key: &str) -> Option<String> {
    query
        .as_ref()?
        .0
        .iter()
        .find(|(k, _)| k == key)
        .map(|(_, v)| v.clone())
}

/// All API routes.
pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .merge(concurrent::routes())
        .merge(internal::routes())
        .merge(health::routes())
}
