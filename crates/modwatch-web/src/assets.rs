//! Static asset serving for the extension directory
//!
//! The dashboard bundle is served by tower-http's `ServeDir` (wired in the
//! router). Extension assets go through an explicit containment check so a
//! crafted path can never resolve outside the extension root.

use axum::extract::{Path as UrlPath, State};
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use std::path::Path;

use crate::router::AppState;

/// Serve an extension asset (e.g. the logo referenced by the dashboard).
pub async fn extension_asset(
    State(state): State<AppState>,
    UrlPath(resource): UrlPath<String>,
) -> Response {
    serve_contained(&state.extension_dir, &resource).await
}

/// Serve `resource` from `root`, refusing anything that resolves outside it.
///
/// Both sides are canonicalized, which also collapses symlinks, so a link
/// pointing out of the root fails the containment check. Traversal attempts
/// get the same 404 as missing files; the response never reveals whether a
/// path exists outside the root.
async fn serve_contained(root: &Path, resource: &str) -> Response {
    let Ok(root) = tokio::fs::canonicalize(root).await else {
        return StatusCode::NOT_FOUND.into_response();
    };
    let Ok(target) = tokio::fs::canonicalize(root.join(resource)).await else {
        return StatusCode::NOT_FOUND.into_response();
    };
    if !target.starts_with(&root) {
        tracing::warn!(resource, "Rejected asset path outside extension root");
        return StatusCode::NOT_FOUND.into_response();
    }

    // Directories fail the read and fall through to 404.
    match tokio::fs::read(&target).await {
        Ok(contents) => {
            let mime = mime_guess::from_path(&target).first_or_octet_stream();
            ([(header::CONTENT_TYPE, mime.to_string())], contents).into_response()
        }
        Err(_) => StatusCode::NOT_FOUND.into_response(),
    }
}
