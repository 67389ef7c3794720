use axum::{
    body::Body,
    extract::{Path, State},
    http::{header::CONTENT_TYPE, StatusCode},
    response::Response,
};

use super::http_server::AppState;
use tracing::warn;

/// Validates that a filename is safe and doesn't contain path traversal sequences
fn is_safe_filename(filename: &str) -> bool {
    let trimmed = filename.trim();
    !filename.contains("..")
        && !filename.contains('/')
        && !filename.contains('\\')
        && !filename.starts_with('.')
        && !trimmed.is_empty()
        && filename.len() <= 255
}

fn content_type(filename: &str) -> &'static str {
    let extension = filename
        .rsplit_once('.')
        .map(|(_, ext)| ext.to_ascii_lowercase());
    match extension.as_deref() {
        Some("html") | Some("htm") => "text/html; charset=utf-8",
        Some("css") => "text/css; charset=utf-8",
        Some("js") => "text/javascript; charset=utf-8",
        Some("json") => "application/json",
        Some("png") => "image/png",
        Some("jpg") | Some("jpeg") => "image/jpeg",
        Some("svg") => "image/svg+xml",
        Some("ico") => "image/x-icon",
        _ => "application/octet-stream",
    }
}

pub async fn serve_static_file(
    State(state): State<AppState>,
    Path(filename): Path<String>,
) -> Result<Response<Body>, StatusCode> {
    if !is_safe_filename(&filename) {
        return Err(StatusCode::BAD_REQUEST);
    }

    let file_path = state.static_dir.join(&filename);
    match tokio::fs::read(&file_path).await {
        Ok(contents) => Response::builder()
            .status(StatusCode::OK)
            .header(CONTENT_TYPE, content_type(&filename))
            .body(Body::from(contents))
            .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR),
        Err(e) => {
            warn!(file = %file_path.display(), error = %e, "Static file not served");
            Err(StatusCode::NOT_FOUND)
        }
    }
}
