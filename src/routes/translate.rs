use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use serde::{Deserialize, Serialize};

use crate::bail_service;
use crate::detection::language::base_code;
use crate::error::{HttpErrorResponse, ServiceError, ServiceResult};
use crate::routes::AppState;
use crate::speech::TranslatorError;

#[derive(Deserialize, Debug)]
pub struct TranslateRequest {
    pub text: String,
    pub source_language: String,
    pub target_language: String,
}

#[derive(Serialize, Debug)]
pub struct TranslateResponse {
    pub translated_text: String,
    pub source_language: String,
    pub target_language: String,
    pub was_translated: bool,
}

/// Plain text translation. Unlike the transcription flow the caller asked for nothing but
/// the translation, so a translator failure is reported instead of degraded.
#[axum_macros::debug_handler]
pub async fn handle_translate_request(
    State(state): State<AppState>,
    Json(req): Json<TranslateRequest>,
) -> ServiceResult<(StatusCode, Json<TranslateResponse>)> {
    let text = req.text.trim();
    if text.is_empty() {
        bail_service!(StatusCode::BAD_REQUEST, "Text must not be empty");
    }
    let source = base_code(&req.source_language);
    let target = base_code(&req.target_language);
    if source.is_empty() || target.is_empty() {
        bail_service!(
            StatusCode::BAD_REQUEST,
            "Both source_language and target_language are required"
        );
    }

    if source == target {
        return Ok((
            StatusCode::OK,
            Json(TranslateResponse {
                translated_text: text.to_string(),
                source_language: source,
                target_language: target,
                was_translated: false,
            }),
        ));
    }

    let timeout = state.orchestrator.settings().call_timeout;
    let translated_text = tokio::time::timeout(
        timeout,
        state.translator.translate(text, &source, &target),
    )
    .await
    .unwrap_or(Err(TranslatorError::Timeout(timeout)))
    .map_err(|e| ServiceError {
        status: StatusCode::BAD_GATEWAY,
        message: HttpErrorResponse::with_kind("translation_failed", e.to_string()),
    })?;

    Ok((
        StatusCode::OK,
        Json(TranslateResponse {
            translated_text,
            source_language: source,
            target_language: target,
            was_translated: true,
        }),
    ))
}
