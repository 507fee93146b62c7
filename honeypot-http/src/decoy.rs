use axum::response::{IntoResponse, Response};
use bytes::Bytes;
use honeypot_core::{HoneypotError, Result};
use http::header;
use rust_embed::Embed;
use std::borrow::Cow;
use std::path::Path;
use tracing::info;

/// Built-in fake "404 Not Found" page.
#[derive(Embed)]
#[folder = "assets/"]
struct DecoyAssets;

const EMBEDDED_PAGE: &str = "index.html";

/// The static document served on every non-recording route. Loaded once at
/// startup; an unreadable document is a startup error, never a per-request one.
#[derive(Debug, Clone)]
pub struct DecoyPage {
    body: Bytes,
    content_type: &'static str,
}

impl DecoyPage {
    /// Read `path` if given, otherwise use the embedded page.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => {
                let body = std::fs::read(path).map_err(|e| {
                    HoneypotError::DecoyPage(format!("{}: {e}", path.display()))
                })?;
                info!(path = %path.display(), bytes = body.len(), "Decoy page loaded");
                Ok(Self {
                    body: Bytes::from(body),
                    content_type: mime_from_ext(&path.to_string_lossy()),
                })
            }
            None => Self::embedded(),
        }
    }

    pub fn embedded() -> Result<Self> {
        let file = DecoyAssets::get(EMBEDDED_PAGE)
            .ok_or_else(|| HoneypotError::DecoyPage("embedded page missing".into()))?;
        let body = match file.data {
            Cow::Borrowed(b) => Bytes::from_static(b),
            Cow::Owned(v) => Bytes::from(v),
        };
        Ok(Self {
            body,
            content_type: mime_from_ext(EMBEDDED_PAGE),
        })
    }

    pub fn from_static(body: &'static str) -> Self {
        Self {
            body: Bytes::from_static(body.as_bytes()),
            content_type: "text/html; charset=utf-8",
        }
    }

    pub fn body(&self) -> &Bytes {
        &self.body
    }

    pub fn content_type(&self) -> &'static str {
        self.content_type
    }
}

impl IntoResponse for DecoyPage {
    fn into_response(self) -> Response {
        ([(header::CONTENT_TYPE, self.content_type)], self.body).into_response()
    }
}

fn mime_from_ext(path: &str) -> &'static str {
    match path.rsplit('.').next() {
        Some("html") | Some("htm") => "text/html; charset=utf-8",
        Some("txt") => "text/plain; charset=utf-8",
        Some("json") => "application/json",
        Some("xml") => "application/xml",
        _ => "application/octet-stream",
    }
}
