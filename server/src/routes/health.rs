use axum::{Json, extract::State};
use chrono::Utc;

use crate::state::AppState;

pub async fn health(State(state): State<AppState>) -> Json<serde_json::Value> {
    let observability = state.observability.snapshot();
    let uptime_secs = Utc::now()
        .signed_duration_since(state.started_at)
        .num_seconds()
        .max(0);
    Json(serde_json::json!({
        "status": "ok",
        "upstream": &*state.upstream_base,
        "uptime_secs": uptime_secs,
        "observability": {
            "proxied_requests_total": observability.proxied_requests_total,
            "upstream_errors_total": observability.upstream_errors_total,
            "rejected_requests_total": observability.rejected_requests_total,
        }
    }))
}
