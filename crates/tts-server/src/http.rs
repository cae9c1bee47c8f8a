//! Request/response HTTP front-end.

use std::sync::Arc;
use std::time::Instant;

use axum::{
    Json, Router,
    body::Bytes,
    extract::{Query, State, rejection::QueryRejection},
    http::{StatusCode, header},
    response::{IntoResponse, Response},
    routing::get,
};
use serde::Deserialize;
use serde_json::{Value, json};
use tracing::{error, info, warn};
use uuid::Uuid;

use audio_codec::encode_wav;
use runtime::SynthesisService;
use tts_core::{Lang, SynthesisParams, SynthesisRequest, TtsError, TtsResult};

const SURFACE: &str = "http";
const SERVICE_NAME: &str = "Supertonic2 TTS";
const WAV_DISPOSITION: &str = "inline; filename=\"tts_output.wav\"";

/// Build the router serving every HTTP route.
pub fn router(service: Arc<SynthesisService>) -> Router {
    Router::new()
        .route("/health", get(health_handler))
        .route("/api/tts", get(tts_get_handler).post(tts_post_handler))
        .route("/api/languages", get(languages_handler))
        .route("/api/voices", get(voices_handler))
        .with_state(service)
}

/// A service error rendered as a JSON body.
#[derive(Debug)]
pub struct ApiError(pub TtsError);

impl From<TtsError> for ApiError {
    fn from(err: TtsError) -> Self {
        Self(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        if self.0.is_caller_fault() {
            (
                StatusCode::BAD_REQUEST,
                Json(json!({ "error": self.0.to_string() })),
            )
                .into_response()
        } else {
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({
                    "error": "TTS generation failed",
                    "details": self.0.to_string(),
                })),
            )
                .into_response()
        }
    }
}

/// Only `text` is read from the query string of a POST.
#[derive(Debug, Default, Deserialize)]
struct TextQuery {
    text: Option<String>,
}

async fn health_handler(State(service): State<Arc<SynthesisService>>) -> impl IntoResponse {
    Json(json!({
        "status": "ok",
        "service": SERVICE_NAME,
        "languages": Lang::codes(),
        "voices": service.voices().ids(),
    }))
}

async fn languages_handler(State(service): State<Arc<SynthesisService>>) -> impl IntoResponse {
    Json(json!({
        "languages": Lang::codes(),
        "default": service.config().default_language.code(),
    }))
}

async fn voices_handler(State(service): State<Arc<SynthesisService>>) -> impl IntoResponse {
    Json(json!({
        "voices": service.voices().ids(),
        "default": service.config().default_voice,
        "note": "All voices support all languages",
    }))
}

async fn tts_get_handler(
    State(service): State<Arc<SynthesisService>>,
    query: Result<Query<SynthesisParams>, QueryRejection>,
) -> Response {
    let params = query
        .map(|Query(params)| params)
        .map_err(|e| TtsError::invalid_parameter("query", e.body_text()));
    respond(&service, params).await
}

async fn tts_post_handler(
    State(service): State<Arc<SynthesisService>>,
    query: Result<Query<TextQuery>, QueryRejection>,
    body: Bytes,
) -> Response {
    let query_text = query.ok().and_then(|Query(q)| q.text);
    let params = params_from_body(&body).map(|mut params| {
        params.text = params.text.filter(|t| !t.is_empty()).or(query_text);
        params
    });
    respond(&service, params).await
}

/// Parse a POST body; anything that is not a JSON object counts as empty.
fn params_from_body(body: &[u8]) -> TtsResult<SynthesisParams> {
    match serde_json::from_slice::<Value>(body) {
        Ok(value @ Value::Object(_)) => serde_json::from_value(value)
            .map_err(|e| TtsError::invalid_parameter("body", e.to_string())),
        _ => Ok(SynthesisParams::default()),
    }
}

async fn respond(service: &Arc<SynthesisService>, params: TtsResult<SynthesisParams>) -> Response {
    let request_id = Uuid::new_v4();
    let start = Instant::now();
    service.metrics().request_received(SURFACE);

    match synthesize_wav(service, params).await {
        Ok((request, wav)) => {
            let elapsed_ms = start.elapsed().as_secs_f64() * 1000.0;
            service.metrics().request_completed(SURFACE);
            service.metrics().record_request_latency(SURFACE, elapsed_ms);
            info!(
                %request_id,
                voice = %request.voice,
                lang = %request.lang,
                bytes = wav.len(),
                elapsed_ms,
                "Served TTS request"
            );
            (
                [
                    (header::CONTENT_TYPE, "audio/wav"),
                    (header::CONTENT_DISPOSITION, WAV_DISPOSITION),
                ],
                wav,
            )
                .into_response()
        }
        Err(e) => {
            service.metrics().request_errored(SURFACE, &e);
            if e.is_caller_fault() {
                warn!(%request_id, error = %e, "Rejected TTS request");
            } else {
                error!(%request_id, error = %e, "TTS request failed");
            }
            ApiError(e).into_response()
        }
    }
}

async fn synthesize_wav(
    service: &Arc<SynthesisService>,
    params: TtsResult<SynthesisParams>,
) -> TtsResult<(SynthesisRequest, Vec<u8>)> {
    let request = service.resolver().resolve(params?)?;
    let audio = service.synthesize(request.clone()).await?;
    let wav = encode_wav(&audio.samples, audio.sample_rate)?;
    Ok((request, wav))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_body_parsing() {
        let params = params_from_body(br#"{"text": "Salut", "speed": 1.2}"#).unwrap();
        assert_eq!(params.text.as_deref(), Some("Salut"));
        assert!(params.speed.is_some());

        assert_eq!(params_from_body(b"").unwrap(), SynthesisParams::default());
        assert_eq!(params_from_body(b"not json").unwrap(), SynthesisParams::default());
        assert_eq!(params_from_body(b"[1, 2]").unwrap(), SynthesisParams::default());
    }

    #[test]
    fn test_body_with_wrong_types_is_invalid() {
        let err = params_from_body(br#"{"text": 42}"#).unwrap_err();
        assert!(matches!(err, TtsError::InvalidParameter { name: "body", .. }));
    }

    #[test]
    fn test_error_status_mapping() {
        let response = ApiError(TtsError::UnsupportedVoice("XX".into())).into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let response = ApiError(TtsError::engine("boom")).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
