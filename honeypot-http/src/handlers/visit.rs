use crate::extract::{RemoteAddr, VisitReport};
use crate::server::AppState;
use axum::extract::State;
use axum::response::Json;
use http::HeaderMap;
use serde_json::{Value, json};
use std::sync::Arc;

/// `POST /log` — record the visit and always acknowledge success, whatever
/// happens to the append.
pub async fn record_visit(
    State(state): State<Arc<AppState>>,
    RemoteAddr(peer): RemoteAddr,
    headers: HeaderMap,
    report: VisitReport,
) -> Json<Value> {
    // detached: the response never waits on the store
    drop(state.recorder.record(report, &headers, peer));
    Json(json!({ "success": true }))
}
