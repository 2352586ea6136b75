//! Server integration tests: start a real server and talk to it over HTTP.
//!
//! Run with: `cargo test -p sketchsolve-server --test integration`

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use serde_json::json;

use sketchsolve_core::config::Config;
use sketchsolve_inference::{Credentials, ImageAnalyzer, VisionProvider, VisionRequest};
use sketchsolve_server::{AppState, start_server};

/// 1x1 white PNG.
const TINY_PNG_BASE64: &str = "iVBORw0KGgoAAAANSUhEUgAAAAEAAAABCAYAAAAfFcSJAAAADUlEQVR42mP8z8BQDwAEhQGAhKmMIQAAAABJRU5ErkJggg==";

/// Find an available port.
fn find_free_port() -> u16 {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    listener.local_addr().unwrap().port()
}

/// Provider returning a scripted reply and recording what it was asked.
struct ScriptedProvider {
    reply: Result<String, String>,
    seen_prompt: Mutex<Option<String>>,
}

impl ScriptedProvider {
    fn replying(text: &str) -> Arc<Self> {
        Arc::new(Self {
            reply: Ok(text.to_string()),
            seen_prompt: Mutex::new(None),
        })
    }

    fn failing(message: &str) -> Arc<Self> {
        Arc::new(Self {
            reply: Err(message.to_string()),
            seen_prompt: Mutex::new(None),
        })
    }
}

#[async_trait]
impl VisionProvider for ScriptedProvider {
    fn id(&self) -> &str {
        "scripted"
    }

    fn label(&self) -> &str {
        "Scripted"
    }

    async fn generate(
        &self,
        request: &VisionRequest,
        _credentials: &Credentials,
    ) -> anyhow::Result<String> {
        *self.seen_prompt.lock().unwrap() = Some(request.prompt.clone());
        match &self.reply {
            Ok(text) => Ok(text.clone()),
            Err(message) => Err(anyhow::anyhow!("{message}")),
        }
    }
}

/// Start a server around the given provider and wait until it answers.
async fn start_test_server(provider: Arc<ScriptedProvider>) -> u16 {
    let port = find_free_port();

    let config = Arc::new(Config::default());
    let analyzer = Arc::new(ImageAnalyzer::with_provider(
        provider,
        Credentials::ApiKey {
            api_key: "test-key".into(),
        },
        "test-model",
    ));
    let state = Arc::new(AppState::new(config, analyzer));

    tokio::spawn(async move {
        let _ = start_server(state, port, false).await;
    });

    for _ in 0..50 {
        tokio::time::sleep(std::time::Duration::from_millis(100)).await;
        if reqwest::get(format!("http://127.0.0.1:{port}/")).await.is_ok() {
            break;
        }
    }

    port
}

async fn post_analyze(port: u16, body: serde_json::Value) -> reqwest::Response {
    reqwest::Client::new()
        .post(format!("http://127.0.0.1:{port}/analyze"))
        .json(&body)
        .send()
        .await
        .expect("Analyze request failed")
}

#[tokio::test]
async fn test_root_reports_running() {
    let port = start_test_server(ScriptedProvider::replying("[]")).await;

    let resp = reqwest::get(format!("http://127.0.0.1:{port}/"))
        .await
        .expect("Root request failed");
    assert!(resp.status().is_success());

    let body: serde_json::Value = resp.json().await.unwrap();
    assert_eq!(body["message"], "Server is running");
}

#[tokio::test]
async fn test_analyze_returns_parsed_entries() {
    let provider = ScriptedProvider::replying(r#"[{"expr": "2+2", "result": "4"}]"#);
    let port = start_test_server(provider).await;

    let resp = post_analyze(port, json!({ "image": TINY_PNG_BASE64 })).await;
    assert!(resp.status().is_success());

    let body: serde_json::Value = resp.json().await.unwrap();
    assert_eq!(body["result"][0]["expr"], "2+2");
    assert_eq!(body["result"][0]["result"], "4");
    assert_eq!(body["result"][0]["assign"], false);
}

#[tokio::test]
async fn test_analyze_strips_markdown_fences() {
    let provider =
        ScriptedProvider::replying("```json\n[{\"expr\": \"x\", \"result\": 2, \"assign\": true}]\n```");
    let port = start_test_server(provider).await;

    let resp = post_analyze(port, json!({ "image": TINY_PNG_BASE64 })).await;
    assert!(resp.status().is_success());

    let body: serde_json::Value = resp.json().await.unwrap();
    assert_eq!(body["result"][0]["expr"], "x");
    assert_eq!(body["result"][0]["assign"], true);
}

#[tokio::test]
async fn test_analyze_prose_reply_degrades_to_fallback_entry() {
    let provider = ScriptedProvider::replying("The expression evaluates to 4.");
    let port = start_test_server(provider).await;

    let resp = post_analyze(port, json!({ "image": TINY_PNG_BASE64 })).await;
    assert!(resp.status().is_success());

    let body: serde_json::Value = resp.json().await.unwrap();
    let entries = body["result"].as_array().unwrap();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0]["expr"], "Unable to parse result");
    assert_eq!(entries[0]["result"], "The expression evaluates to 4.");
}

#[tokio::test]
async fn test_analyze_forwards_variable_dictionary() {
    let provider = ScriptedProvider::replying("[]");
    let port = start_test_server(provider.clone()).await;

    let resp = post_analyze(
        port,
        json!({ "image": TINY_PNG_BASE64, "dict_of_vars": { "x": 4 } }),
    )
    .await;
    assert!(resp.status().is_success());

    let prompt = provider.seen_prompt.lock().unwrap().clone().unwrap();
    assert!(prompt.contains(r#"{"x":4}"#));
}

#[tokio::test]
async fn test_analyze_provider_failure_is_500() {
    let provider = ScriptedProvider::failing("quota exceeded");
    let port = start_test_server(provider).await;

    let resp = post_analyze(port, json!({ "image": TINY_PNG_BASE64 })).await;
    assert_eq!(resp.status(), 500);

    let body: serde_json::Value = resp.json().await.unwrap();
    assert_eq!(body["error"], "Error processing image with Scripted API");
    assert!(body["details"].as_str().unwrap().contains("quota exceeded"));
}

#[tokio::test]
async fn test_server_survives_provider_failure() {
    let provider = ScriptedProvider::failing("connection reset");
    let port = start_test_server(provider).await;

    let resp = post_analyze(port, json!({ "image": TINY_PNG_BASE64 })).await;
    assert_eq!(resp.status(), 500);

    // The process is still serving afterwards
    let resp = reqwest::get(format!("http://127.0.0.1:{port}/")).await.unwrap();
    assert!(resp.status().is_success());
}

#[tokio::test]
async fn test_calculate_success_envelope() {
    let provider = ScriptedProvider::replying(r#"[{"expr": "3*3", "result": 9}]"#);
    let port = start_test_server(provider).await;

    let resp = reqwest::Client::new()
        .post(format!("http://127.0.0.1:{port}/calculate"))
        .json(&json!({ "image": TINY_PNG_BASE64 }))
        .send()
        .await
        .expect("Calculate request failed");
    assert!(resp.status().is_success());

    let body: serde_json::Value = resp.json().await.unwrap();
    assert_eq!(body["message"], "Image processed");
    assert_eq!(body["status"], "success");
    assert_eq!(body["data"][0]["result"], 9);
}

#[tokio::test]
async fn test_calculate_error_envelope() {
    let provider = ScriptedProvider::failing("bad key");
    let port = start_test_server(provider).await;

    let resp = reqwest::Client::new()
        .post(format!("http://127.0.0.1:{port}/calculate"))
        .json(&json!({ "image": TINY_PNG_BASE64 }))
        .send()
        .await
        .expect("Calculate request failed");
    assert_eq!(resp.status(), 500);

    let body: serde_json::Value = resp.json().await.unwrap();
    assert_eq!(body["message"], "Error processing image");
    assert_eq!(body["status"], "error");
    assert!(body["error"].as_str().unwrap().contains("bad key"));
}

#[tokio::test]
async fn test_cors_allows_configured_origin() {
    let port = start_test_server(ScriptedProvider::replying("[]")).await;

    let resp = reqwest::Client::new()
        .request(
            reqwest::Method::OPTIONS,
            format!("http://127.0.0.1:{port}/analyze"),
        )
        .header("Origin", "http://localhost:5173")
        .header("Access-Control-Request-Method", "POST")
        .header("Access-Control-Request-Headers", "content-type")
        .send()
        .await
        .expect("Preflight request failed");

    assert_eq!(
        resp.headers()
            .get("access-control-allow-origin")
            .and_then(|v| v.to_str().ok()),
        Some("http://localhost:5173")
    );
    assert_eq!(
        resp.headers()
            .get("access-control-allow-credentials")
            .and_then(|v| v.to_str().ok()),
        Some("true")
    );
}

#[tokio::test]
async fn test_cors_ignores_unlisted_origin() {
    let port = start_test_server(ScriptedProvider::replying("[]")).await;

    let resp = reqwest::Client::new()
        .request(
            reqwest::Method::OPTIONS,
            format!("http://127.0.0.1:{port}/analyze"),
        )
        .header("Origin", "http://evil.example")
        .header("Access-Control-Request-Method", "POST")
        .send()
        .await
        .expect("Preflight request failed");

    assert!(resp.headers().get("access-control-allow-origin").is_none());
}

#[tokio::test]
async fn test_analyze_accepts_data_url_prefixed_image() {
    let provider = ScriptedProvider::replying(r#"[{"expr": "1+1", "result": 2}]"#);
    let port = start_test_server(provider).await;

    let resp = post_analyze(
        port,
        json!({ "image": format!("data:image/png;base64,{TINY_PNG_BASE64}") }),
    )
    .await;
    assert!(resp.status().is_success());

    let body: serde_json::Value = resp.json().await.unwrap();
    assert_eq!(body["result"][0]["result"], 2);
}
