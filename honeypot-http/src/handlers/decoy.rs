use crate::server::AppState;
use axum::extract::State;
use axum::response::{IntoResponse, Response};
use std::sync::Arc;

/// Every route other than the recorder gets the same page with `200 OK`, so
/// a scanner learns nothing about which paths exist.
pub async fn serve_decoy(State(state): State<Arc<AppState>>) -> Response {
    state.decoy.clone().into_response()
}
