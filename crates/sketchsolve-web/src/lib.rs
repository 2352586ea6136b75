//! Embedded sketchpad page.
//!
//! `rust-embed` bakes the `ui/` directory into the binary, so the server
//! ships as a single executable with no asset directory to deploy.

use axum::{
    Router,
    extract::Path,
    http::{StatusCode, header},
    response::{Html, IntoResponse, Response},
    routing::get,
};
use rust_embed::Embed;

#[derive(Embed)]
#[folder = "ui/"]
struct UiAssets;

/// Build an axum `Router` that serves the sketchpad under `/ui`.
///
/// Mounted beside the API routes; `/ui` itself serves the page, anything
/// below it serves the matching embedded asset.
pub fn ui_router() -> Router {
    Router::new()
        .route("/ui", get(index_handler))
        .route("/ui/", get(index_handler))
        .route("/ui/{*path}", get(static_handler))
}

async fn index_handler() -> Response {
    serve_asset("index.html")
}

async fn static_handler(Path(path): Path<String>) -> Response {
    serve_asset(&path)
}

fn serve_asset(path: &str) -> Response {
    match UiAssets::get(path) {
        Some(asset) => {
            let mime = mime_guess::from_path(path).first_or_octet_stream();
            (
                StatusCode::OK,
                [(header::CONTENT_TYPE, mime.as_ref())],
                asset.data.into_owned(),
            )
                .into_response()
        }
        None => (StatusCode::NOT_FOUND, Html("<h1>404</h1>")).into_response(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_index_is_embedded() {
        let asset = UiAssets::get("index.html").expect("index.html must be embedded");
        let body = String::from_utf8_lossy(&asset.data);
        assert!(body.contains("<canvas"));
        assert!(body.contains("/analyze"));
    }

    #[test]
    fn test_unknown_asset_is_absent() {
        assert!(UiAssets::get("no-such-file.js").is_none());
    }
}
