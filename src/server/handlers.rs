// HTTP request handlers
//
// One shared handler serves every tool: the identity comes from the path
// and the tool is resolved against the current registry snapshot per call,
// so hot reloads apply to HTTP callers without re-registering routes.

use axum::{
    body::Bytes,
    extract::{Path, State},
    http::{header, StatusCode},
    response::{IntoResponse, Json, Response},
    routing::{get, post},
    Router,
};
use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

use super::{openapi_doc, AppState};
use crate::config::OutputFormat;
use crate::executor;

/// Create the application router.
pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/openapi.json", get(serve_openapi))
        .route("/health", get(health_check))
        .route("/:namespace/:name", post(invoke_tool))
        .with_state(state)
}

/// Handle POST /{namespace}/{name} - invoke one tool.
async fn invoke_tool(
    State(state): State<Arc<AppState>>,
    Path((namespace, name)): Path<(String, String)>,
    body: Bytes,
) -> Response {
    let registry = state.registry.snapshot().await;
    let identity = format!("{}/{}", namespace, name);

    let Some(tool) = registry.get(&identity) else {
        return (StatusCode::NOT_FOUND, format!("unknown tool: {identity}")).into_response();
    };

    // A JSON object body is required only when the tool declares arguments;
    // argument-less tools accept an empty body.
    let arguments = if tool.declaration.input.is_empty() && body.is_empty() {
        serde_json::Map::new()
    } else {
        match serde_json::from_slice::<serde_json::Map<String, Value>>(&body) {
            Ok(arguments) => arguments,
            Err(_) => {
                return (StatusCode::BAD_REQUEST, "invalid json").into_response();
            }
        }
    };

    let run = &tool.declaration.run;
    // No explicit cancellation on the HTTP path; if the client disconnects,
    // axum drops this future and kill_on_drop reaps the child.
    let output = match executor::run_command(
        &run.cmd,
        &run.args,
        &arguments,
        CancellationToken::new(),
    )
    .await
    {
        Ok(output) => output,
        Err(err) => {
            tracing::warn!(tool = %identity, error = %err, "tool invocation failed");
            return (StatusCode::INTERNAL_SERVER_ERROR, err.to_string()).into_response();
        }
    };

    render_output(tool.declaration.output.format, output)
}

/// Select response body and content type from the declared output format.
///
/// `json` emits the raw bytes verbatim only when they actually parse as
/// JSON; anything else falls through to the plain-text envelope.
fn render_output(format: OutputFormat, output: Vec<u8>) -> Response {
    match format {
        OutputFormat::Json if serde_json::from_slice::<Value>(&output).is_ok() => (
            StatusCode::OK,
            [(header::CONTENT_TYPE, "application/json")],
            output,
        )
            .into_response(),
        OutputFormat::Image | OutputFormat::Audio => (
            StatusCode::OK,
            [(header::CONTENT_TYPE, "application/octet-stream")],
            output,
        )
            .into_response(),
        _ => (
            StatusCode::OK,
            [(header::CONTENT_TYPE, "text/plain; charset=utf-8")],
            output,
        )
            .into_response(),
    }
}

/// Handle GET /openapi.json - regenerated from the current snapshot so the
/// document tracks hot reloads.
async fn serve_openapi(State(state): State<Arc<AppState>>) -> Response {
    let registry = state.registry.snapshot().await;
    let doc = openapi_doc(&registry, &state.server_name, &state.server_version);
    Json(doc).into_response()
}

#[derive(Debug, Serialize)]
struct HealthStatus {
    status: String,
    tools: usize,
}

/// Handle GET /health.
async fn health_check(State(state): State<Arc<AppState>>) -> Json<HealthStatus> {
    let registry = state.registry.snapshot().await;
    Json(HealthStatus {
        status: "healthy".to_string(),
        tools: registry.len(),
    })
}
