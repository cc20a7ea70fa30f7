use axum::{
    Json, Router,
    extract::{State, rejection::JsonRejection},
    http::{StatusCode, header},
    response::{IntoResponse, Response},
    routing::{get, post},
};
use bytes::Bytes;
use interview_core::analysis::EndReport;
use interview_core::session_state::{AnswerReply, StartReply, StartRequest};
use interview_core::voice::SpeechSynthesizer;
use interview_core::{InterviewEngine, InterviewError, SERVICE_NAME};
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

/// Shared state handed to every handler.
#[derive(Clone)]
pub struct AppState {
    pub engine: Arc<InterviewEngine>,
    /// `None` when no TTS key is configured; `/voice` then always fails.
    pub voice: Option<Arc<dyn SpeechSynthesizer>>,
}

/// Handler failures, rendered as a status code and `{"error": message}`.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error(transparent)]
    Interview(#[from] InterviewError),
    #[error("{}", .0.body_text())]
    InvalidBody(#[from] JsonRejection),
    #[error("No text provided")]
    NoText,
    #[error("TTS failed to generate audio")]
    Tts,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self {
            ApiError::Interview(InterviewError::SessionNotFound(_)) => StatusCode::NOT_FOUND,
            ApiError::Interview(InterviewError::AlreadyEnded(_)) => StatusCode::CONFLICT,
            ApiError::InvalidBody(rejection) => rejection.status(),
            ApiError::NoText => StatusCode::BAD_REQUEST,
            ApiError::Tts => StatusCode::INTERNAL_SERVER_ERROR,
        };
        (status, Json(json!({ "error": self.to_string() }))).into_response()
    }
}

#[derive(Debug, Deserialize)]
pub struct AnswerRequest {
    pub session_id: String,
    #[serde(default)]
    pub text: String,
}

#[derive(Debug, Deserialize)]
pub struct EndRequest {
    pub session_id: String,
}

#[derive(Debug, Deserialize)]
pub struct VoiceRequest {
    #[serde(default)]
    pub text: String,
}

async fn start_interview(
    State(state): State<AppState>,
    payload: Result<Json<StartRequest>, JsonRejection>,
) -> Result<Json<StartReply>, ApiError> {
    let Json(request) = payload?;
    Ok(Json(state.engine.start(request).await))
}

async fn answer(
    State(state): State<AppState>,
    payload: Result<Json<AnswerRequest>, JsonRejection>,
) -> Result<Json<AnswerReply>, ApiError> {
    let Json(request) = payload?;
    let reply = state
        .engine
        .answer(&request.session_id, &request.text)
        .await?;
    Ok(Json(reply))
}

async fn end_interview(
    State(state): State<AppState>,
    payload: Result<Json<EndRequest>, JsonRejection>,
) -> Result<Json<EndReport>, ApiError> {
    let Json(request) = payload?;
    let report = state.engine.end(&request.session_id).await?;
    Ok(Json(report))
}

async fn voice(
    State(state): State<AppState>,
    payload: Result<Json<VoiceRequest>, JsonRejection>,
) -> Result<Response, ApiError> {
    let Json(request) = payload?;
    let text = request.text.trim();
    if text.is_empty() {
        return Err(ApiError::NoText);
    }
    let Some(synthesizer) = &state.voice else {
        tracing::warn!("Voice requested but no TTS provider is configured");
        return Err(ApiError::Tts);
    };

    let audio: Bytes = synthesizer.synthesize(text).await.map_err(|e| {
        tracing::error!("TTS failed: {:?}", e);
        ApiError::Tts
    })?;
    Ok(([(header::CONTENT_TYPE, "audio/mpeg")], audio).into_response())
}

async fn health() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok", "service": SERVICE_NAME }))
}

/// Builds the HTTP router.
pub fn app(state: AppState) -> Router {
    // Configure a permissive CORS policy so a separately hosted frontend can call the API.
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/start", post(start_interview))
        .route("/answer", post(answer))
        .route("/end", post(end_interview))
        .route("/voice", post(voice))
        .route("/health", get(health))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
