//! Server shared state.

use std::sync::Arc;

use sketchsolve_core::config::Config;
use sketchsolve_inference::ImageAnalyzer;

/// Shared state accessible from all request handlers. Read-only after
/// startup; handlers never need locks.
pub struct AppState {
    pub config: Arc<Config>,
    pub analyzer: Arc<ImageAnalyzer>,
}

impl AppState {
    pub fn new(config: Arc<Config>, analyzer: Arc<ImageAnalyzer>) -> Self {
        Self { config, analyzer }
    }
}
