//! Request extractors for the recording route.

use axum::extract::{ConnectInfo, FromRequest, FromRequestParts, Request};
use axum::response::{IntoResponse, Response};
use axum::Json;
use bytes::Bytes;
use http::{header, request::Parts, HeaderMap, StatusCode};
use serde_json::Value;
use std::convert::Infallible;
use std::net::SocketAddr;

/// What the visitor's page script reports about itself.
///
/// A request that is not JSON, or has an empty body, yields an empty report.
/// Syntactically broken JSON is rejected with axum's own `JsonRejection`
/// response; valid JSON whose top level is not an object or array is
/// rejected with `400 Bad Request`.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct VisitReport {
    pub ip: Option<String>,
    pub url: Option<String>,
}

impl VisitReport {
    fn from_value(body: &Value) -> Self {
        Self {
            ip: scalar_field(body, "ip"),
            url: scalar_field(body, "url"),
        }
    }
}

impl<S> FromRequest<S> for VisitReport
where
    S: Send + Sync,
{
    type Rejection = Response;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        if !is_json(req.headers()) {
            return Ok(Self::default());
        }
        let bytes = Bytes::from_request(req, state)
            .await
            .map_err(IntoResponse::into_response)?;
        if bytes.is_empty() {
            return Ok(Self::default());
        }
        let Json(body) = Json::<Value>::from_bytes(&bytes).map_err(IntoResponse::into_response)?;
        if !(body.is_object() || body.is_array()) {
            return Err((
                StatusCode::BAD_REQUEST,
                "Failed to parse the request body as JSON: expected an object or array",
            )
                .into_response());
        }
        Ok(Self::from_value(&body))
    }
}

/// Strings pass through, numbers and `true` are stringified, anything else
/// counts as absent.
fn scalar_field(body: &Value, key: &str) -> Option<String> {
    match body.get(key)? {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(true) => Some("true".to_string()),
        _ => None,
    }
}

fn is_json(headers: &HeaderMap) -> bool {
    let Some(content_type) = headers.get(header::CONTENT_TYPE).and_then(|v| v.to_str().ok()) else {
        return false;
    };
    let mime = content_type
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase();
    mime == "application/json" || (mime.starts_with("application/") && mime.ends_with("+json"))
}

/// Remote socket address, when the server was started with connect info.
#[derive(Debug, Clone, Copy)]
pub struct RemoteAddr(pub Option<SocketAddr>);

impl<S> FromRequestParts<S> for RemoteAddr
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(RemoteAddr(
            parts
                .extensions
                .get::<ConnectInfo<SocketAddr>>()
                .map(|ConnectInfo(addr)| *addr),
        ))
    }
}
