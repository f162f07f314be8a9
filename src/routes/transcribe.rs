use std::time::Instant;

use axum::extract::{Multipart, State};
use axum::http::StatusCode;
use axum::Json;
use serde::{Deserialize, Serialize};

use crate::bail_service;
use crate::detection::{AudioInput, SourceLanguage, TranscriptionOutcome};
use crate::error::{ServiceError, ServiceResult};
use crate::routes::AppState;

#[derive(Deserialize, Debug)]
pub struct TranscribeRequest {
    pub target_language: String,
    /// A language code, `auto` or nothing at all to detect the spoken language
    #[serde(default)]
    pub source_language: Option<String>,
}

#[derive(Serialize, Debug)]
pub struct TranscribeResponse {
    #[serde(flatten)]
    pub outcome: TranscriptionOutcome,
    pub processing_time: f64,
}

/// Compares the media type only, so `application/json; charset=utf-8` is accepted.
fn is_json_mime(content: &str) -> bool {
    content
        .split(';')
        .next()
        .is_some_and(|essence| essence.trim().eq_ignore_ascii_case("application/json"))
}

fn is_audio_mime(content: &str) -> bool {
    content.starts_with("audio/")
        || content.starts_with("video/webm")
        || content == "application/octet-stream"
}

#[axum_macros::debug_handler]
pub async fn handle_transcribe_request(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> ServiceResult<(StatusCode, Json<TranscribeResponse>)> {
    let mut opt_request = None;
    let mut opt_audio = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ServiceError::bad_request(format!("Invalid multipart body: {}", e)))?
    {
        let Some(name) = field.name().map(str::to_string) else {
            continue;
        };
        match name.as_str() {
            "request_content" => {
                if field.content_type().is_some_and(|content| !is_json_mime(content)) {
                    bail_service!(
                        StatusCode::BAD_REQUEST,
                        "Invalid mime type in content-type header for request_content field"
                    );
                }
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|e| ServiceError::bad_request(e.to_string()))?;
                let Json(request) = Json::<TranscribeRequest>::from_bytes(&bytes)
                    .map_err(|e| ServiceError::bad_request(e.body_text()))?;
                opt_request = Some(request);
            }
            "audio_content" => {
                let content_type = field.content_type().map(str::to_string);
                if content_type.as_deref().is_some_and(|c| !is_audio_mime(c)) {
                    bail_service!(
                        StatusCode::BAD_REQUEST,
                        "Invalid mime type in content-type header for audio_content field"
                    );
                }
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|e| ServiceError::bad_request(e.to_string()))?;
                opt_audio = Some((bytes, content_type));
            }
            _ => bail_service!(StatusCode::BAD_REQUEST, "Unknown field {}", name),
        }
    }

    let Some(request) = opt_request else {
        bail_service!(
            StatusCode::BAD_REQUEST,
            "Missing field request_content in multipart form"
        );
    };
    let Some((audio_bytes, content_type)) = opt_audio else {
        bail_service!(
            StatusCode::BAD_REQUEST,
            "Missing field audio_content in multipart form"
        );
    };

    let started = Instant::now();
    // Container probing is CPU bound over up to max_audio_bytes
    let audio = tokio::task::spawn_blocking(move || {
        AudioInput::new(audio_bytes.to_vec(), content_type.as_deref())
    })
    .await?;
    let source = SourceLanguage::from_hint(request.source_language.as_deref());
    let outcome = state
        .orchestrator
        .transcribe_and_translate(&audio, &request.target_language, &source)
        .await
        .map_err(ServiceError::from_transcribe)?;

    Ok((
        StatusCode::OK,
        Json(TranscribeResponse {
            outcome,
            processing_time: started.elapsed().as_secs_f64(),
        }),
    ))
}
