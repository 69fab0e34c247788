use axum::{extract::State, routing::get, Json, Router};
use fanout_core::{AggregatedResult, LegContext, Millis};
use std::sync::Arc;
use tokio::time::Instant;
use tracing::info;

use crate::error::ApiError;
use crate::middleware::RequestId;
use crate::models::AppState;
use crate::routes::{first_param, QueryPairs};

pub fn routes() -> Router<Arc<AppState>> {
    Router::new().route("/concurrent", get(run_concurrent))
}

async fn run_concurrent(
    State(state): State<Arc<AppState>>,
    request_id: RequestId,
    query: QueryPairs,
) -> Result<Json<AggregatedResult>, ApiError> {
    // `text` is passed through to the internal leg.
    let text = first_param(&query, "text")
        .filter(|t| !t.is_empty())
        .unwrap_or_else(|| state.probe_text.clone());
    let ctx = LegContext::new(text).with_request_id(request_id.0);

    let start = Instant::now();
    let result = state.fanout.run(&ctx).await?;

    info!(
        db_ms = %result.benchmark.db,
        api_ms = %result.benchmark.api,
        internal_ms = %result.benchmark.internal,
        total_ms = %Millis::from_duration(start.elapsed()),
        "Fan-out completed"
    );

    Ok(Json(result))
}
