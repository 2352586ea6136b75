//! Vision model access for sketch analysis.
//!
//! Concrete model APIs live behind the [`VisionProvider`] trait so the rest
//! of the system never touches HTTP details. [`ImageAnalyzer`] wraps a
//! provider with everything around the call: prompt construction, credential
//! handling, and parsing the free-text reply into structured entries.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::debug;

use sketchsolve_core::config::InferenceConfig;
use sketchsolve_core::protocol::{ResultEntry, strip_data_url_prefix};
use sketchsolve_core::{Result, SketchsolveError};

pub mod gemini;
pub mod prompt;
pub mod reply;

use crate::gemini::GeminiProvider;
use crate::prompt::{MIME_PNG, build_prompt};
use crate::reply::parse_model_reply;

/// Credentials for authenticating with a vision provider.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Credentials {
    #[serde(rename = "api_key")]
    ApiKey { api_key: String },
    #[serde(rename = "token")]
    Token { token: String },
}

/// One image-plus-instructions request to a vision model.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VisionRequest {
    pub model: String,
    pub prompt: String,
    /// Base64 payload without any data URL prefix.
    pub image_base64: String,
    pub mime_type: String,
    pub max_output_tokens: u32,
    pub temperature: Option<f64>,
}

/// A multimodal model API that turns an image plus instructions into text.
#[async_trait]
pub trait VisionProvider: Send + Sync {
    /// Provider identifier (e.g. "google").
    fn id(&self) -> &str;

    /// Human-readable provider name for error messages (e.g. "Gemini").
    fn label(&self) -> &str;

    /// Run one non-streaming generation and return the reply text.
    async fn generate(
        &self,
        request: &VisionRequest,
        credentials: &Credentials,
    ) -> anyhow::Result<String>;
}

/// The analysis pipeline around a provider: build the prompt, call the
/// model, parse the reply.
pub struct ImageAnalyzer {
    provider: Arc<dyn VisionProvider>,
    credentials: Credentials,
    model: String,
    max_output_tokens: u32,
    temperature: Option<f64>,
}

impl std::fmt::Debug for ImageAnalyzer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // Credentials are deliberately omitted so API keys never reach logs.
        f.debug_struct("ImageAnalyzer")
            .field("provider", &self.provider.id())
            .field("model", &self.model)
            .field("max_output_tokens", &self.max_output_tokens)
            .field("temperature", &self.temperature)
            .finish_non_exhaustive()
    }
}

impl ImageAnalyzer {
    /// Build an analyzer from config. Fails when the provider is unknown or
    /// no API key can be resolved.
    pub fn from_config(config: &InferenceConfig) -> Result<Self> {
        let provider: Arc<dyn VisionProvider> = match config.provider.as_str() {
            "google" => Arc::new(GeminiProvider::new(config.base_url.as_deref())),
            other => {
                return Err(SketchsolveError::Config(format!(
                    "Unknown inference provider: {other}"
                )));
            }
        };
        let api_key = config.resolve_api_key().ok_or_else(|| {
            SketchsolveError::Config("No API key configured for the inference provider".into())
        })?;
        Ok(Self {
            provider,
            credentials: Credentials::ApiKey { api_key },
            model: config.model.clone(),
            max_output_tokens: config.max_output_tokens,
            temperature: Some(f64::from(config.temperature)),
        })
    }

    /// Wrap an explicit provider. Tests use this to swap in mock providers.
    pub fn with_provider(
        provider: Arc<dyn VisionProvider>,
        credentials: Credentials,
        model: impl Into<String>,
    ) -> Self {
        Self {
            provider,
            credentials,
            model: model.into(),
            max_output_tokens: 2048,
            temperature: None,
        }
    }

    pub fn provider_id(&self) -> &str {
        self.provider.id()
    }

    pub fn provider_label(&self) -> &str {
        self.provider.label()
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    /// Analyze one snapshot. The reply is always normalized to a list of
    /// entries; a reply that defies parsing yields one synthetic entry
    /// carrying the text verbatim. Only transport and API failures are
    /// errors.
    pub async fn analyze(
        &self,
        image_base64: &str,
        dict_of_vars: &HashMap<String, serde_json::Value>,
    ) -> Result<Vec<ResultEntry>> {
        let payload = strip_data_url_prefix(image_base64);
        let request = VisionRequest {
            model: self.model.clone(),
            prompt: build_prompt(dict_of_vars),
            image_base64: payload.to_string(),
            mime_type: MIME_PNG.into(),
            max_output_tokens: self.max_output_tokens,
            temperature: self.temperature,
        };

        debug!(
            provider = self.provider.id(),
            model = %self.model,
            image_len = payload.len(),
            vars = dict_of_vars.len(),
            "Analyzing snapshot"
        );

        let text = self
            .provider
            .generate(&request, &self.credentials)
            .await
            .map_err(|e| SketchsolveError::Provider(format!("{e:#}")))?;

        let entries = parse_model_reply(&text);
        debug!(entries = entries.len(), "Model reply parsed");
        Ok(entries)
    }
}
