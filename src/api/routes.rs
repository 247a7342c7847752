use axum::{
    Router,
    extract::{Json, State, rejection::JsonRejection},
    http::{Method, header},
    response::IntoResponse,
    routing::post,
};
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

use crate::AppState;
use crate::api::response;
use crate::error::{AppError, Result};
use crate::llm::call_gemini;

pub fn create_router(app_state: AppState) -> Router {
    let static_dir = app_state.config.static_dir.clone();

    let router = Router::new()
        .route("/api/gemini", post(gemini_handler))
        .with_state(app_state);

    let router = match static_dir {
        Some(dir) => router.fallback_service(ServeDir::new(dir)),
        None => router,
    };

    router
        .layer(
            CorsLayer::new()
                .allow_origin(AllowOrigin::mirror_request())
                .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
                .allow_headers([header::CONTENT_TYPE]),
        )
        .layer(TraceLayer::new_for_http())
}

/// Prompt pair pulled out of a loosely-typed JSON body.
struct PromptInput {
    prompt: String,
    system_prompt: Option<String>,
}

fn parse_prompt(payload: std::result::Result<Json<serde_json::Value>, JsonRejection>) -> Result<PromptInput> {
    let Json(body) = payload.map_err(|rejection| {
        tracing::debug!(%rejection, "unreadable proxy body");
        AppError::InvalidPrompt
    })?;

    let prompt = body
        .get("prompt")
        .and_then(|v| v.as_str())
        .filter(|p| !p.is_empty())
        .ok_or(AppError::InvalidPrompt)?
        .to_string();

    let system_prompt = body
        .get("systemPrompt")
        .and_then(|v| v.as_str())
        .filter(|s| !s.is_empty())
        .map(str::to_string);

    Ok(PromptInput {
        prompt,
        system_prompt,
    })
}

async fn gemini_handler(
    State(state): State<AppState>,
    payload: std::result::Result<Json<serde_json::Value>, JsonRejection>,
) -> Result<impl IntoResponse> {
    // Both checks run before any upstream traffic.
    let api_key = state
        .config
        .gemini_api_key
        .as_deref()
        .ok_or(AppError::MissingCredential)?;
    let input = parse_prompt(payload)?;

    let start_time = std::time::Instant::now();
    let timeout = state.config.upstream_timeout;

    let reply = tokio::time::timeout(
        timeout,
        call_gemini(
            &state.http,
            &state.config,
            api_key,
            &input.prompt,
            input.system_prompt.as_deref(),
        ),
    )
    .await
    .map_err(|_| AppError::UpstreamTimeout(timeout.as_secs()))??;

    tracing::info!(
        elapsed_ms = start_time.elapsed().as_millis() as u64,
        text_len = reply.text.len(),
        "proxied generation request"
    );

    Ok(response::success(reply.text, reply.raw))
}
