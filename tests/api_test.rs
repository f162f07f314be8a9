use std::sync::Arc;

use reqwest::multipart::{Form, Part};
use reqwest::StatusCode;
use serde_json::{json, Value};
use tokio::net::TcpListener;

use speech_translate::speech::TextTranslator;
use speech_translate::{create_router, AppState};

mod helpers;

use helpers::{orchestrator, test_settings, MockTranslator, Reply, ScriptedRecognizer};

async fn spawn_app(recognizer: ScriptedRecognizer, translator: MockTranslator) -> String {
    let recognizer = Arc::new(recognizer);
    let translator = Arc::new(translator);
    let state = AppState {
        orchestrator: Arc::new(orchestrator(&recognizer, &translator, test_settings())),
        translator: translator as Arc<dyn TextTranslator>,
    };

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, create_router(state)).await.unwrap();
    });
    format!("http://{}", addr)
}

fn transcribe_form(request: Value, audio: Vec<u8>) -> Form {
    Form::new()
        .part(
            "request_content",
            Part::text(request.to_string())
                .mime_str("application/json")
                .unwrap(),
        )
        .part(
            "audio_content",
            Part::bytes(audio)
                .file_name("clip.webm")
                .mime_str("audio/webm")
                .unwrap(),
        )
}

fn clip() -> Vec<u8> {
    vec![0x1a; 4_096]
}

#[tokio::test]
async fn given_running_service_when_checking_health_then_ok() {
    let base = spawn_app(ScriptedRecognizer::silent(), MockTranslator::default()).await;

    let response = reqwest::get(format!("{}/health", base)).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["status"], "ok");
    assert_eq!(body["version"], env!("CARGO_PKG_VERSION"));
}

#[tokio::test]
async fn given_hindi_clip_when_transcribing_to_english_then_translated_outcome_is_returned() {
    let recognizer = ScriptedRecognizer::new(&[("hi-IN", Reply::Text("namaste duniya", 0.9))]);
    let base = spawn_app(recognizer, MockTranslator::default()).await;

    let response = reqwest::Client::new()
        .post(format!("{}/audio/transcribe", base))
        .multipart(transcribe_form(json!({"target_language": "en"}), clip()))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert!(response.headers().contains_key("x-request-id"));
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["transcript"], "namaste duniya");
    assert_eq!(body["detected_language_code"], "hi-IN");
    assert_eq!(body["source_language_code"], "hi");
    assert_eq!(body["target_language_code"], "en");
    assert_eq!(body["translated_text"], "[en] namaste duniya");
    assert_eq!(body["was_translated"], true);
    assert!(body["processing_time"].is_f64());
    assert!(body.get("warnings").is_none());
}

#[tokio::test]
async fn given_caller_request_id_when_calling_then_same_id_is_echoed() {
    let base = spawn_app(ScriptedRecognizer::silent(), MockTranslator::default()).await;

    let response = reqwest::Client::new()
        .get(format!("{}/health", base))
        .header("x-request-id", "req-1234")
        .send()
        .await
        .unwrap();

    assert_eq!(response.headers()["x-request-id"], "req-1234");
}

#[tokio::test]
async fn given_failing_translator_when_transcribing_then_warning_is_reported() {
    let recognizer = ScriptedRecognizer::new(&[("fr-FR", Reply::Text("bonjour le monde", 0.9))]);
    let base = spawn_app(recognizer, MockTranslator::failing()).await;

    let response = reqwest::Client::new()
        .post(format!("{}/audio/transcribe", base))
        .multipart(transcribe_form(
            json!({"target_language": "en", "source_language": "fr"}),
            clip(),
        ))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["translated_text"], "bonjour le monde");
    assert_eq!(body["was_translated"], false);
    assert_eq!(body["warnings"][0]["kind"], "translation_degraded");
}

#[tokio::test]
async fn given_missing_audio_field_when_transcribing_then_bad_request() {
    let base = spawn_app(ScriptedRecognizer::silent(), MockTranslator::default()).await;

    let form = Form::new().part(
        "request_content",
        Part::text(json!({"target_language": "en"}).to_string())
            .mime_str("application/json")
            .unwrap(),
    );
    let response = reqwest::Client::new()
        .post(format!("{}/audio/transcribe", base))
        .multipart(form)
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["kind"], "invalid_request");
    assert!(body["error"].as_str().unwrap().contains("audio_content"));
}

#[tokio::test]
async fn given_non_audio_mime_when_transcribing_then_bad_request() {
    let base = spawn_app(ScriptedRecognizer::silent(), MockTranslator::default()).await;

    let form = Form::new()
        .part(
            "request_content",
            Part::text(json!({"target_language": "en"}).to_string())
                .mime_str("application/json")
                .unwrap(),
        )
        .part(
            "audio_content",
            Part::bytes(clip()).mime_str("image/png").unwrap(),
        );
    let response = reqwest::Client::new()
        .post(format!("{}/audio/transcribe", base))
        .multipart(form)
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn given_json_part_with_charset_when_transcribing_then_request_is_accepted() {
    let recognizer = ScriptedRecognizer::new(&[("en-US", Reply::Text("hello world", 0.92))]);
    let base = spawn_app(recognizer, MockTranslator::default()).await;

    let form = Form::new()
        .part(
            "request_content",
            Part::text(json!({"target_language": "en"}).to_string())
                .mime_str("application/json; charset=utf-8")
                .unwrap(),
        )
        .part(
            "audio_content",
            Part::bytes(clip()).mime_str("audio/webm").unwrap(),
        );
    let response = reqwest::Client::new()
        .post(format!("{}/audio/transcribe", base))
        .multipart(form)
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["transcript"], "hello world");
}

/// Mono 16-bit WAV header whose sample rate field is zero.
fn zero_rate_wav() -> Vec<u8> {
    let data_len: u32 = 4_000;
    let mut bytes = Vec::new();
    bytes.extend_from_slice(b"RIFF");
    bytes.extend_from_slice(&(36 + data_len).to_le_bytes());
    bytes.extend_from_slice(b"WAVEfmt ");
    bytes.extend_from_slice(&16u32.to_le_bytes());
    bytes.extend_from_slice(&1u16.to_le_bytes());
    bytes.extend_from_slice(&1u16.to_le_bytes());
    bytes.extend_from_slice(&0u32.to_le_bytes());
    bytes.extend_from_slice(&2u32.to_le_bytes());
    bytes.extend_from_slice(&2u16.to_le_bytes());
    bytes.extend_from_slice(&16u16.to_le_bytes());
    bytes.extend_from_slice(b"data");
    bytes.extend_from_slice(&data_len.to_le_bytes());
    bytes.resize(44 + data_len as usize, 0);
    bytes
}

#[tokio::test]
async fn given_malformed_wav_header_when_transcribing_then_service_still_answers() {
    let recognizer = ScriptedRecognizer::new(&[("en-US", Reply::Text("hello world", 0.92))]);
    let base = spawn_app(recognizer, MockTranslator::default()).await;

    let form = Form::new()
        .part(
            "request_content",
            Part::text(json!({"target_language": "en"}).to_string())
                .mime_str("application/json")
                .unwrap(),
        )
        .part(
            "audio_content",
            Part::bytes(zero_rate_wav()).mime_str("audio/wav").unwrap(),
        );
    let response = reqwest::Client::new()
        .post(format!("{}/audio/transcribe", base))
        .multipart(form)
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["detected_language_code"], "en-US");
}

#[tokio::test]
async fn given_tiny_clip_when_transcribing_then_invalid_input() {
    let base = spawn_app(ScriptedRecognizer::silent(), MockTranslator::default()).await;

    let response = reqwest::Client::new()
        .post(format!("{}/audio/transcribe", base))
        .multipart(transcribe_form(json!({"target_language": "en"}), vec![0u8; 16]))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["kind"], "invalid_input");
}

#[tokio::test]
async fn given_silent_clip_when_transcribing_then_no_speech_detected() {
    let base = spawn_app(ScriptedRecognizer::silent(), MockTranslator::default()).await;

    let response = reqwest::Client::new()
        .post(format!("{}/audio/transcribe", base))
        .multipart(transcribe_form(json!({"target_language": "en"}), clip()))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["kind"], "no_speech_detected");
}

#[tokio::test]
async fn given_explicit_source_when_recognizer_fails_then_bad_gateway() {
    let recognizer = ScriptedRecognizer::new(&[("fr-FR", Reply::Fail)]);
    let base = spawn_app(recognizer, MockTranslator::default()).await;

    let response = reqwest::Client::new()
        .post(format!("{}/audio/transcribe", base))
        .multipart(transcribe_form(
            json!({"target_language": "en", "source_language": "fr"}),
            clip(),
        ))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["kind"], "recognition_failed");
    assert!(body["error"].as_str().unwrap().contains("fr-FR"));
}

#[tokio::test]
async fn given_default_tiers_when_listing_languages_then_both_tiers_are_returned() {
    let base = spawn_app(ScriptedRecognizer::silent(), MockTranslator::default()).await;

    let body: Value = reqwest::get(format!("{}/languages", base))
        .await
        .unwrap()
        .json()
        .await
        .unwrap();

    assert_eq!(body["primary"].as_array().unwrap().len(), helpers::PRIMARY_LEN);
    assert_eq!(
        body["secondary"].as_array().unwrap().len(),
        helpers::SECONDARY_LEN
    );
    assert_eq!(body["primary"][0]["code"], "en-US");
    assert_eq!(body["primary"][0]["tier"], "primary");
}

#[tokio::test]
async fn given_text_when_translating_then_translator_result_is_returned() {
    let base = spawn_app(ScriptedRecognizer::silent(), MockTranslator::default()).await;

    let response = reqwest::Client::new()
        .post(format!("{}/text/translate", base))
        .json(&json!({"text": "hola", "source_language": "es-ES", "target_language": "en"}))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["translated_text"], "[en] hola");
    assert_eq!(body["source_language"], "es");
    assert_eq!(body["was_translated"], true);
}

#[tokio::test]
async fn given_failing_translator_when_translating_text_then_bad_gateway() {
    let base = spawn_app(ScriptedRecognizer::silent(), MockTranslator::failing()).await;

    let response = reqwest::Client::new()
        .post(format!("{}/text/translate", base))
        .json(&json!({"text": "hola", "source_language": "es", "target_language": "en"}))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["kind"], "translation_failed");
}

#[tokio::test]
async fn given_empty_text_when_translating_then_bad_request() {
    let base = spawn_app(ScriptedRecognizer::silent(), MockTranslator::default()).await;

    let response = reqwest::Client::new()
        .post(format!("{}/text/translate", base))
        .json(&json!({"text": "   ", "source_language": "es", "target_language": "en"}))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}
