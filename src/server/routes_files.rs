//! Channel list and guide files.

use axum::{
    body::Body,
    extract::State,
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use std::path::Path;
use tokio::fs::File;
use tokio_util::io::ReaderStream;

use super::AppContext;

const MIME_M3U: &str = "audio/x-mpegurl";
const MIME_XML: &str = "application/xml";

/// `GET /channels.m3u` and `GET /MovistarTV.m3u`
pub async fn channels(State(ctx): State<AppContext>) -> Response {
    serve_catalog_file(&ctx.config.files.channels_path(), MIME_M3U).await
}

/// `GET /guide.xml`
pub async fn guide(State(ctx): State<AppContext>) -> Response {
    serve_catalog_file(&ctx.config.files.guide_path(), MIME_XML).await
}

/// Stream a file from disk, or answer 404 with an empty JSON object.
async fn serve_catalog_file(path: &Path, content_type: &'static str) -> Response {
    let metadata = match tokio::fs::metadata(path).await {
        Ok(metadata) if metadata.is_file() => metadata,
        _ => {
            tracing::debug!("Catalog file not available: {:?}", path);
            return not_found();
        }
    };

    let file = match File::open(path).await {
        Ok(file) => file,
        Err(e) => {
            tracing::debug!("Failed to open {:?}: {}", path, e);
            return not_found();
        }
    };

    Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, content_type)
        .header(header::CONTENT_LENGTH, metadata.len().to_string())
        .body(Body::from_stream(ReaderStream::new(file)))
        .unwrap_or_else(|_| StatusCode::INTERNAL_SERVER_ERROR.into_response())
}

fn not_found() -> Response {
    (StatusCode::NOT_FOUND, Json(serde_json::json!({}))).into_response()
}
