//! Configuration loading and validation.
//!
//! Config lives in a single JSON5 file (comments and trailing commas are
//! fine). Every field has a sensible default so an empty file, or no file at
//! all, yields a working local setup. `${ENV_VAR}` references inside string
//! values are substituted at load time, and secrets can be given either
//! directly or through a `*_env` indirection.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{Result, SketchsolveError};

/// Environment variable consulted when no API key is configured.
pub const DEFAULT_API_KEY_ENV: &str = "GEMINI_API_KEY";

/// Environment variable overriding the config file location.
pub const CONFIG_PATH_ENV: &str = "SKETCHSOLVE_CONFIG";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,

    #[serde(default)]
    pub inference: InferenceConfig,

    #[serde(default)]
    pub board: BoardConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_port")]
    pub port: u16,

    #[serde(default = "default_bind")]
    pub bind: String,

    #[serde(default)]
    pub cors: CorsConfig,

    /// Maximum accepted request body. Sketch snapshots are base64 PNGs and
    /// can get large on high-DPI screens.
    #[serde(default = "default_body_limit")]
    pub body_limit_bytes: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: default_port(),
            bind: default_bind(),
            cors: CorsConfig::default(),
            body_limit_bytes: default_body_limit(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CorsConfig {
    /// Origins allowed to call the API with credentials. Wildcards are not
    /// supported: allowing credentials requires echoing a concrete origin.
    #[serde(default = "default_allowed_origins")]
    pub allowed_origins: Vec<String>,
}

impl Default for CorsConfig {
    fn default() -> Self {
        Self {
            allowed_origins: default_allowed_origins(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InferenceConfig {
    #[serde(default = "default_provider")]
    pub provider: String,

    #[serde(default = "default_model")]
    pub model: String,

    /// API key given directly in the file. Prefer `api_key_env`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    /// Name of an environment variable holding the API key.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key_env: Option<String>,

    /// Override the provider endpoint, mainly for tests and proxies.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,

    #[serde(default = "default_max_output_tokens")]
    pub max_output_tokens: u32,

    #[serde(default = "default_temperature")]
    pub temperature: f32,
}

impl Default for InferenceConfig {
    fn default() -> Self {
        Self {
            provider: default_provider(),
            model: default_model(),
            api_key: None,
            api_key_env: None,
            base_url: None,
            max_output_tokens: default_max_output_tokens(),
            temperature: default_temperature(),
        }
    }
}

impl InferenceConfig {
    /// Resolve the API key: direct value, then the named env var, then
    /// `GEMINI_API_KEY`.
    pub fn resolve_api_key(&self) -> Option<String> {
        resolve_secret_field(self.api_key.as_deref(), self.api_key_env.as_deref())
            .or_else(|| std::env::var(DEFAULT_API_KEY_ENV).ok().filter(|v| !v.is_empty()))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BoardConfig {
    /// Longer snapshot dimension after downscaling, in pixels.
    #[serde(default = "default_max_image_dim")]
    pub max_image_dim: u32,
}

impl Default for BoardConfig {
    fn default() -> Self {
        Self {
            max_image_dim: default_max_image_dim(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Default level when `RUST_LOG` is unset: trace, debug, info, warn, error.
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Output format: "plain" or "json".
    #[serde(default = "default_log_format")]
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

fn default_port() -> u16 {
    3000
}

fn default_bind() -> String {
    "0.0.0.0".into()
}

fn default_body_limit() -> usize {
    50 * 1024 * 1024
}

fn default_allowed_origins() -> Vec<String> {
    vec!["http://localhost:5173".into()]
}

fn default_provider() -> String {
    "google".into()
}

fn default_model() -> String {
    "gemini-1.5-flash".into()
}

fn default_max_output_tokens() -> u32 {
    2048
}

fn default_temperature() -> f32 {
    0.2
}

fn default_max_image_dim() -> u32 {
    1024
}

fn default_log_level() -> String {
    "info".into()
}

fn default_log_format() -> String {
    "plain".into()
}

impl Config {
    /// Load config from a JSON5 file, substituting `${ENV_VAR}` references.
    pub fn load(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path).map_err(|e| {
            SketchsolveError::Config(format!("Cannot read {}: {e}", path.display()))
        })?;
        let substituted = substitute_env_vars(&raw);
        let config: Config = json5::from_str(&substituted)
            .map_err(|e| SketchsolveError::Config(format!("Invalid config: {e}")))?;
        Ok(config)
    }

    /// Load from the given path, or from the default location, or fall back
    /// to built-in defaults when no file exists.
    pub fn load_or_default(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(p) => Self::load(p),
            None => {
                let p = config_path();
                if p.exists() {
                    Self::load(&p)
                } else {
                    debug!(path = %p.display(), "No config file found, using defaults");
                    Ok(Self::default())
                }
            }
        }
    }

    /// Check the config for problems. Returns (warnings, errors): warnings
    /// are printed but non-fatal, errors should stop startup.
    pub fn validate(&self) -> (Vec<String>, Vec<String>) {
        let mut warnings = Vec::new();
        let mut errors = Vec::new();

        if self.server.port == 0 {
            errors.push("server.port must be non-zero".into());
        }
        if self.server.cors.allowed_origins.is_empty() {
            warnings.push(
                "server.cors.allowed_origins is empty; browser clients will be rejected".into(),
            );
        }
        for origin in &self.server.cors.allowed_origins {
            if origin == "*" {
                errors.push(
                    "server.cors.allowed_origins must list concrete origins, not \"*\"".into(),
                );
            }
        }
        if self.server.body_limit_bytes < 1024 {
            warnings.push(format!(
                "server.body_limit_bytes = {} is too small for any snapshot",
                self.server.body_limit_bytes
            ));
        }

        if self.inference.provider != "google" {
            errors.push(format!(
                "inference.provider \"{}\" is not supported (expected \"google\")",
                self.inference.provider
            ));
        }
        if self.inference.model.is_empty() {
            errors.push("inference.model must not be empty".into());
        }
        if self.inference.resolve_api_key().is_none() {
            warnings.push(format!(
                "no API key configured; set inference.api_key, inference.api_key_env, or {DEFAULT_API_KEY_ENV}"
            ));
        }
        if !(0.0..=2.0).contains(&self.inference.temperature) {
            errors.push(format!(
                "inference.temperature = {} is out of range (0.0..=2.0)",
                self.inference.temperature
            ));
        }

        if self.board.max_image_dim == 0 {
            errors.push("board.max_image_dim must be non-zero".into());
        } else if self.board.max_image_dim < 256 {
            warnings.push(format!(
                "board.max_image_dim = {} will make handwriting illegible to the model",
                self.board.max_image_dim
            ));
        }

        match self.logging.format.as_str() {
            "plain" | "json" => {}
            other => errors.push(format!(
                "logging.format \"{other}\" is not supported (expected \"plain\" or \"json\")"
            )),
        }

        (warnings, errors)
    }
}

/// Replace `${VAR_NAME}` occurrences with the value of the environment
/// variable. Unset variables substitute to the empty string.
pub fn substitute_env_vars(input: &str) -> String {
    let re = regex::Regex::new(r"\$\{([A-Za-z_][A-Za-z0-9_]*)\}").unwrap();
    re.replace_all(input, |caps: &regex::Captures| {
        std::env::var(&caps[1]).unwrap_or_default()
    })
    .into_owned()
}

/// Resolve a secret given either directly or via an env var name. Empty
/// strings count as absent.
pub fn resolve_secret_field(direct: Option<&str>, env_name: Option<&str>) -> Option<String> {
    if let Some(value) = direct {
        if !value.is_empty() {
            return Some(value.to_string());
        }
    }
    if let Some(name) = env_name {
        if let Ok(value) = std::env::var(name) {
            if !value.is_empty() {
                return Some(value);
            }
        }
    }
    None
}

/// Per-user data directory, `~/.sketchsolve`.
pub fn data_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".sketchsolve")
}

/// Default config file location, overridable through `SKETCHSOLVE_CONFIG`.
pub fn config_path() -> PathBuf {
    if let Ok(p) = std::env::var(CONFIG_PATH_ENV) {
        if !p.is_empty() {
            return PathBuf::from(p);
        }
    }
    data_dir().join("config.json5")
}

/// Serialize config for `config show`, masking resolved secrets.
pub fn redacted_json(config: &Config) -> serde_json::Value {
    let mut value = serde_json::to_value(config).unwrap_or_default();
    if let Some(inference) = value.get_mut("inference") {
        if let Some(key) = inference.get_mut("api_key") {
            if key.as_str().is_some_and(|s| !s.is_empty()) {
                *key = serde_json::Value::String("***".into());
            }
        }
    }
    value
}
