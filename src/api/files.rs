//! Read-only access to a task's stored files.

use std::path::Path;
use std::sync::Arc;

use axum::{
    body::Body,
    extract::{Path as UrlPath, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
};
use tokio_util::io::ReaderStream;

use super::routes::AppState;
use crate::workspace;

/// Content type by file extension; unknown types are served as bytes.
fn content_type(path: &Path) -> &'static str {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase());
    match ext.as_deref() {
        Some("html") | Some("htm") => "text/html; charset=utf-8",
        Some("css") => "text/css; charset=utf-8",
        Some("js") => "text/javascript; charset=utf-8",
        Some("json") => "application/json",
        Some("md") => "text/markdown; charset=utf-8",
        Some("txt") => "text/plain; charset=utf-8",
        Some("csv") => "text/csv; charset=utf-8",
        Some("svg") => "image/svg+xml",
        Some("png") => "image/png",
        Some("jpg") | Some("jpeg") => "image/jpeg",
        Some("gif") => "image/gif",
        Some("webp") => "image/webp",
        Some("pdf") => "application/pdf",
        _ => "application/octet-stream",
    }
}

/// `GET /files/:task/:name`: a generated file, or failing that an attachment.
pub async fn serve_file(
    State(state): State<Arc<AppState>>,
    UrlPath((task, name)): UrlPath<(String, String)>,
) -> Result<Response, (StatusCode, &'static str)> {
    let Some(path) = workspace::find_served_file(state.data_dir(), &task, &name).await else {
        return Err((StatusCode::NOT_FOUND, "Not found"));
    };

    let file = tokio::fs::File::open(&path).await.map_err(|e| {
        tracing::warn!(path = %path.display(), "Failed to open stored file: {}", e);
        (StatusCode::NOT_FOUND, "Not found")
    })?;
    let body = Body::from_stream(ReaderStream::new(file));

    Ok(([(header::CONTENT_TYPE, content_type(&path))], body).into_response())
}
