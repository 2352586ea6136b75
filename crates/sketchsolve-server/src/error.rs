//! Error-to-HTTP mapping.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

use sketchsolve_core::SketchsolveError;
use sketchsolve_core::protocol::ErrorBody;

/// A failure as surfaced to HTTP clients.
///
/// Everything maps to 500 with one of three bodies: provider failures name
/// the provider and carry its message, other typed failures carry their
/// message under a generic headline, and untyped failures stay opaque.
pub struct ApiError {
    inner: SketchsolveError,
    provider_label: String,
}

impl ApiError {
    pub fn new(inner: SketchsolveError, provider_label: &str) -> Self {
        Self {
            inner,
            provider_label: provider_label.to_string(),
        }
    }

    fn body(&self) -> ErrorBody {
        match &self.inner {
            SketchsolveError::Provider(details) => ErrorBody {
                error: format!("Error processing image with {} API", self.provider_label),
                details: Some(details.clone()),
            },
            SketchsolveError::Other(_) => ErrorBody {
                error: "An unknown error occurred".into(),
                details: None,
            },
            other => ErrorBody {
                error: "Error processing image".into(),
                details: Some(other.to_string()),
            },
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (StatusCode::INTERNAL_SERVER_ERROR, Json(self.body())).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_provider_error_names_provider() {
        let err = ApiError::new(
            SketchsolveError::Provider("API error 429: quota".into()),
            "Gemini",
        );
        let body = err.body();
        assert_eq!(body.error, "Error processing image with Gemini API");
        assert_eq!(body.details.as_deref(), Some("API error 429: quota"));
    }

    #[test]
    fn test_typed_error_keeps_generic_headline() {
        let err = ApiError::new(SketchsolveError::Image("Invalid image data".into()), "Gemini");
        let body = err.body();
        assert_eq!(body.error, "Error processing image");
        assert!(body.details.unwrap().contains("Invalid image data"));
    }

    #[test]
    fn test_unknown_error_is_opaque() {
        let err = ApiError::new(anyhow::anyhow!("mystery").into(), "Gemini");
        let body = err.body();
        assert_eq!(body.error, "An unknown error occurred");
        assert!(body.details.is_none());
    }
}
