//! HTTP wire shapes for the analysis endpoints.
//!
//! The server speaks plain JSON-over-HTTP: `POST /analyze` is the primary
//! route, `POST /calculate` is the legacy envelope kept for older clients,
//! and `GET /` reports liveness.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// `expr` value used for the synthetic entry returned when the model reply
/// cannot be parsed as JSON.
pub const UNPARSED_EXPR: &str = "Unable to parse result";

/// One normalized answer from the model.
///
/// Deliberately loose: the model controls the shape, we only guarantee the
/// three fields exist after normalization. `result` stays a raw JSON value
/// because models return numbers, strings, and occasionally objects here.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResultEntry {
    #[serde(default)]
    pub expr: String,

    #[serde(default)]
    pub result: serde_json::Value,

    /// True when the entry assigns a value to a variable (case 2/3 of the
    /// instruction prompt). Missing in most model replies; defaults to false.
    #[serde(default)]
    pub assign: bool,
}

impl ResultEntry {
    /// Synthetic entry carrying an unparseable reply verbatim.
    pub fn unparsed(raw: &str) -> Self {
        Self {
            expr: UNPARSED_EXPR.into(),
            result: serde_json::Value::String(raw.to_string()),
            assign: false,
        }
    }
}

/// Request body for `POST /analyze` and `POST /calculate`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalyzeRequest {
    /// Base64-encoded PNG. A `data:image/png;base64,` prefix is tolerated.
    pub image: String,

    /// Previously assigned variables, forwarded into the prompt so the model
    /// can substitute known values.
    #[serde(default)]
    pub dict_of_vars: HashMap<String, serde_json::Value>,
}

/// Response body for `POST /analyze`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalyzeResponse {
    pub result: Vec<ResultEntry>,
}

/// Response body for the legacy `POST /calculate` route.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CalculateResponse {
    pub message: String,
    pub data: Vec<ResultEntry>,
    pub status: String,
}

/// Error body returned with HTTP 500.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

/// Body for `GET /`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerInfo {
    pub message: String,
}

impl ServerInfo {
    pub fn running() -> Self {
        Self {
            message: "Server is running".into(),
        }
    }
}

/// Strip an optional `data:<mime>;base64,` prefix from an image payload.
///
/// Browser clients usually send the raw base64 tail of `canvas.toDataURL()`,
/// but some send the whole data URL.
pub fn strip_data_url_prefix(image: &str) -> &str {
    if image.starts_with("data:") {
        match image.split_once(',') {
            Some((_, tail)) => tail,
            None => image,
        }
    } else {
        image
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_result_entry_defaults() {
        let entry: ResultEntry = serde_json::from_str(r#"{"expr":"2+2","result":"4"}"#).unwrap();
        assert_eq!(entry.expr, "2+2");
        assert_eq!(entry.result, serde_json::json!("4"));
        assert!(!entry.assign, "assign must default to false");
    }

    #[test]
    fn test_result_entry_numeric_result() {
        let entry: ResultEntry =
            serde_json::from_str(r#"{"expr":"x","result":2,"assign":true}"#).unwrap();
        assert_eq!(entry.result, serde_json::json!(2));
        assert!(entry.assign);
    }

    #[test]
    fn test_unparsed_entry_shape() {
        let entry = ResultEntry::unparsed("the answer is four");
        assert_eq!(entry.expr, UNPARSED_EXPR);
        assert_eq!(entry.result, serde_json::json!("the answer is four"));
        assert!(!entry.assign);
    }

    #[test]
    fn test_analyze_request_vars_default() {
        let req: AnalyzeRequest = serde_json::from_str(r#"{"image":"aGk="}"#).unwrap();
        assert_eq!(req.image, "aGk=");
        assert!(req.dict_of_vars.is_empty());
    }

    #[test]
    fn test_error_body_omits_missing_details() {
        let body = ErrorBody {
            error: "Error processing image".into(),
            details: None,
        };
        let json = serde_json::to_string(&body).unwrap();
        assert!(!json.contains("details"));
    }

    #[test]
    fn test_strip_data_url_prefix() {
        assert_eq!(
            strip_data_url_prefix("data:image/png;base64,iVBORw0KGgo="),
            "iVBORw0KGgo="
        );
        assert_eq!(strip_data_url_prefix("iVBORw0KGgo="), "iVBORw0KGgo=");
        // Malformed: scheme but no comma, passed through untouched
        assert_eq!(strip_data_url_prefix("data:image/png"), "data:image/png");
    }
}
