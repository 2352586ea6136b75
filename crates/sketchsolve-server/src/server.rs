//! Axum server wiring: routes, CORS, body limit, shutdown.

use std::sync::Arc;

use axum::Router;
use axum::extract::DefaultBodyLimit;
use axum::http::{HeaderValue, Method, header};
use axum::routing::{get, post};
use tower::ServiceBuilder;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

use crate::routes;
use crate::state::AppState;

/// Start the HTTP server.
///
/// When `ui_enabled` is true, the embedded sketchpad is served at `/ui`.
pub async fn start_server(state: Arc<AppState>, port: u16, ui_enabled: bool) -> anyhow::Result<()> {
    let bind_addr = state.config.server.bind.clone();
    let body_limit = state.config.server.body_limit_bytes;
    let cors = cors_layer(&state.config.server.cors.allowed_origins);

    let mut app = Router::new()
        .route("/", get(routes::root))
        .route("/analyze", post(routes::analyze))
        .route("/calculate", post(routes::calculate))
        .with_state(state);

    #[cfg(feature = "metrics")]
    {
        let handle = crate::metrics::install_prometheus_recorder();
        app = app.route("/metrics", get(move || async move { handle.render() }));
    }

    if ui_enabled {
        app = app.merge(sketchsolve_web::ui_router());
        info!("Sketchpad available at http://{bind_addr}:{port}/ui");
    }

    let app = app.layer(
        ServiceBuilder::new()
            .layer(TraceLayer::new_for_http())
            .layer(DefaultBodyLimit::max(body_limit))
            .layer(cors),
    );

    let addr = format!("{bind_addr}:{port}");
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!("Server listening on {addr}");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

/// CORS from config: concrete origin allow-list with credentials, the four
/// verbs plus preflight, and the two headers browser clients send.
fn cors_layer(allowed_origins: &[String]) -> CorsLayer {
    let origins: Vec<HeaderValue> = allowed_origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(_) => {
                warn!(origin, "Ignoring malformed CORS origin");
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION])
        .allow_credentials(true)
}

async fn shutdown_signal() {
    tokio::signal::ctrl_c()
        .await
        .expect("Failed to install CTRL+C handler");
    info!("Shutdown signal received");
}
