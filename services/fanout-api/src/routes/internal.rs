use axum::{extract::State, routing::get, Json, Router};
use fanout_core::InternalReply;
use std::sync::Arc;
use tracing::debug;

use crate::config::InternalVariant;
use crate::models::AppState;
use crate::routes::{first_param, QueryPairs};

/// Input used when `text` is missing or empty.
pub const DEFAULT_TEXT: &str = "default text";

pub fn routes() -> Router<Arc<AppState>> {
    Router::new().route("/internal", get(handle_internal))
}

/// Sibling endpoint called by the internal leg. Sleeps to simulate latency.
async fn handle_internal(
    State(state): State<Arc<AppState>>,
    query: QueryPairs,
) -> Json<InternalReply> {
    let input = first_param(&query, "text")
        .filter(|t| !t.is_empty())
        .unwrap_or_else(|| DEFAULT_TEXT.to_string());

    tokio::time::sleep(state.internal.delay).await;

    let reply = match state.internal.variant {
        InternalVariant::Echo => InternalReply::echo(&input),
        InternalVariant::Acknowledge => InternalReply::acknowledge(),
    };
    debug!(variant = ?state.internal.variant, len = input.len(), "Internal request served");

    Json(reply)
}
