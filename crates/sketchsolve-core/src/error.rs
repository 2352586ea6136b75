use thiserror::Error;

#[derive(Debug, Error)]
pub enum SketchsolveError {
    #[error("Config error: {0}")]
    Config(String),

    #[error("Inference provider error: {0}")]
    Provider(String),

    #[error("Image error: {0}")]
    Image(String),

    #[error("Board error: {0}")]
    Board(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl SketchsolveError {
    /// Short stable name for log fields and metrics labels.
    pub fn kind(&self) -> &'static str {
        match self {
            SketchsolveError::Config(_) => "config",
            SketchsolveError::Provider(_) => "provider",
            SketchsolveError::Image(_) => "image",
            SketchsolveError::Board(_) => "board",
            SketchsolveError::Io(_) => "io",
            SketchsolveError::Json(_) => "json",
            SketchsolveError::Other(_) => "other",
        }
    }
}

pub type Result<T> = std::result::Result<T, SketchsolveError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_kinds_and_display() {
        let err = SketchsolveError::Provider("Gemini API error 429: quota".into());
        assert_eq!(err.kind(), "provider");
        assert!(err.to_string().contains("quota"));

        let err = SketchsolveError::Image("Invalid image data".into());
        assert_eq!(err.kind(), "image");

        let err: SketchsolveError = anyhow::anyhow!("mystery").into();
        assert_eq!(err.kind(), "other");
    }
}
