//! Request handlers.

use std::sync::Arc;
use std::time::Instant;

use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;
use tracing::{error, info};
use uuid::Uuid;

use sketchsolve_board::snapshot;
use sketchsolve_core::Result;
use sketchsolve_core::protocol::{
    AnalyzeRequest, AnalyzeResponse, CalculateResponse, ResultEntry, ServerInfo,
};

use crate::error::ApiError;
use crate::state::AppState;

/// `GET /`: liveness.
pub async fn root() -> Json<ServerInfo> {
    Json(ServerInfo::running())
}

/// Shared pipeline behind both analysis routes: normalize the snapshot,
/// call the model, parse the reply.
async fn run_analysis(state: &AppState, request: &AnalyzeRequest) -> Result<Vec<ResultEntry>> {
    let image = snapshot::prepare_for_analysis(&request.image, state.config.board.max_image_dim);
    state.analyzer.analyze(&image, &request.dict_of_vars).await
}

/// `POST /analyze`: the primary route. Replies the model can produce but
/// we cannot parse still come back 200 with a verbatim fallback entry; only
/// provider and transport failures are 500s.
pub async fn analyze(
    State(state): State<Arc<AppState>>,
    Json(request): Json<AnalyzeRequest>,
) -> std::result::Result<Json<AnalyzeResponse>, ApiError> {
    let request_id = Uuid::new_v4();
    let started = Instant::now();
    info!(
        %request_id,
        image_len = request.image.len(),
        vars = request.dict_of_vars.len(),
        "Analyze request received"
    );

    let result = run_analysis(&state, &request).await;

    #[cfg(feature = "metrics")]
    crate::metrics::record_request("analyze", started.elapsed().as_secs_f64(), result.is_ok());

    match result {
        Ok(entries) => {
            info!(
                %request_id,
                entries = entries.len(),
                elapsed_ms = started.elapsed().as_millis() as u64,
                "Analyze request completed"
            );
            Ok(Json(AnalyzeResponse { result: entries }))
        }
        Err(e) => {
            error!(%request_id, error = %e, "Analyze request failed");
            #[cfg(feature = "metrics")]
            crate::metrics::record_error(e.kind());
            Err(ApiError::new(e, state.analyzer.provider_label()))
        }
    }
}

/// `POST /calculate`: legacy route kept for older clients; same pipeline,
/// different envelope.
pub async fn calculate(
    State(state): State<Arc<AppState>>,
    Json(request): Json<AnalyzeRequest>,
) -> Response {
    let request_id = Uuid::new_v4();
    let started = Instant::now();
    info!(
        %request_id,
        image_len = request.image.len(),
        "Calculate request received"
    );

    let result = run_analysis(&state, &request).await;

    #[cfg(feature = "metrics")]
    crate::metrics::record_request("calculate", started.elapsed().as_secs_f64(), result.is_ok());

    match result {
        Ok(entries) => {
            info!(
                %request_id,
                entries = entries.len(),
                elapsed_ms = started.elapsed().as_millis() as u64,
                "Calculate request completed"
            );
            Json(CalculateResponse {
                message: "Image processed".into(),
                data: entries,
                status: "success".into(),
            })
            .into_response()
        }
        Err(e) => {
            error!(%request_id, error = %e, "Calculate request failed");
            #[cfg(feature = "metrics")]
            crate::metrics::record_error(e.kind());
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({
                    "message": "Error processing image",
                    "error": e.to_string(),
                    "status": "error",
                })),
            )
                .into_response()
        }
    }
}
