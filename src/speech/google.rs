use std::time::Duration;

use anyhow::Result;
use async_trait::async_trait;
use base64ct::{Base64, Encoding};
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use url::Url;

use crate::detection::audio::AudioEncoding;
use crate::speech::recognizer::{
    ModelQuality, Recognition, RecognitionRequest, RecognizerError, SpeechRecognizer,
};
use crate::speech::translator::{TextTranslator, TranslatorError};

const RECOGNIZE_PATH: &str = "v1/speech:recognize";
const TRANSLATE_PATH: &str = "language/translate/v2";

fn build_endpoint(base_url: &str, path: &str, api_key: &str) -> Result<Url> {
    // Url::join drops the last path segment unless the base ends with a slash
    let base = Url::parse(&format!("{}/", base_url.trim_end_matches('/')))?;
    let mut endpoint = base.join(path)?;
    if !api_key.is_empty() {
        endpoint.query_pairs_mut().append_pair("key", api_key);
    }
    Ok(endpoint)
}

fn build_client() -> Result<reqwest::Client> {
    let client = reqwest::Client::builder()
        .connect_timeout(Duration::from_secs(10))
        .build()?;
    Ok(client)
}

/// Speech recognizer backed by the Cloud Speech-to-Text `speech:recognize` REST call.
pub struct GoogleSpeechRecognizer {
    client: reqwest::Client,
    endpoint: Url,
}

impl GoogleSpeechRecognizer {
    pub fn new(base_url: &str, api_key: &str) -> Result<Self> {
        Ok(Self {
            client: build_client()?,
            endpoint: build_endpoint(base_url, RECOGNIZE_PATH, api_key)?,
        })
    }
}

#[derive(Serialize)]
struct RecognizeBody<'a> {
    config: RecognitionConfig<'a>,
    audio: RecognitionAudio,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct RecognitionConfig<'a> {
    #[serde(skip_serializing_if = "AudioEncoding::is_unspecified")]
    encoding: AudioEncoding,
    #[serde(skip_serializing_if = "Option::is_none")]
    sample_rate_hertz: Option<u32>,
    language_code: &'a str,
    model: &'static str,
    use_enhanced: bool,
    enable_automatic_punctuation: bool,
}

#[derive(Serialize)]
struct RecognitionAudio {
    content: String,
}

#[derive(Deserialize)]
struct RecognizeResponse {
    #[serde(default)]
    results: Vec<RecognitionResult>,
}

#[derive(Deserialize)]
struct RecognitionResult {
    #[serde(default)]
    alternatives: Vec<Alternative>,
}

#[derive(Deserialize)]
struct Alternative {
    #[serde(default)]
    transcript: String,
    #[serde(default)]
    confidence: f32,
}

impl RecognizeResponse {
    /// Joins the top alternative of every result and averages their confidence.
    fn into_recognition(self) -> Recognition {
        let best: Vec<Alternative> = self
            .results
            .into_iter()
            .filter_map(|r| r.alternatives.into_iter().next())
            .collect();
        if best.is_empty() {
            return Recognition::empty();
        }

        let confidence = best.iter().map(|a| a.confidence).sum::<f32>() / best.len() as f32;
        let transcript = best
            .iter()
            .map(|a| a.transcript.trim())
            .filter(|t| !t.is_empty())
            .collect::<Vec<_>>()
            .join(" ");

        Recognition {
            transcript,
            confidence: confidence.clamp(0.0, 1.0),
        }
    }
}

#[async_trait]
impl SpeechRecognizer for GoogleSpeechRecognizer {
    async fn recognize(
        &self,
        request: &RecognitionRequest,
    ) -> Result<Recognition, RecognizerError> {
        let (model, use_enhanced) = match request.quality {
            ModelQuality::Fast => ("latest_short", false),
            ModelQuality::Enhanced => ("default", true),
        };
        let body = RecognizeBody {
            config: RecognitionConfig {
                encoding: request.encoding,
                sample_rate_hertz: request.sample_rate_hertz,
                language_code: &request.language_code,
                model,
                use_enhanced,
                enable_automatic_punctuation: true,
            },
            audio: RecognitionAudio {
                content: Base64::encode_string(&request.audio),
            },
        };

        tracing::debug!(
            language = %request.language_code,
            model,
            bytes = request.audio.len(),
            "Sending audio to speech recognizer"
        );

        let response = self
            .client
            .post(self.endpoint.clone())
            .json(&body)
            .send()
            .await
            .map_err(|e| RecognizerError::Api(format!("request: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "unknown error".to_string());
            return Err(rejection(status, body, request));
        }

        let result: RecognizeResponse = response
            .json()
            .await
            .map_err(|e| RecognizerError::Api(format!("parse response: {}", e)))?;

        Ok(result.into_recognition())
    }
}

/// A 400 naming the language or the encoding means that candidate can never succeed,
/// anything else is reported as is.
fn rejection(status: StatusCode, body: String, request: &RecognitionRequest) -> RecognizerError {
    if status == StatusCode::BAD_REQUEST {
        let message = body.to_ascii_lowercase();
        if message.contains("language") {
            return RecognizerError::UnsupportedLanguage(request.language_code.clone());
        }
        if message.contains("encoding") {
            return RecognizerError::UnsupportedEncoding(format!("{:?}", request.encoding));
        }
    }
    RecognizerError::Api(format!("status {}: {}", status, body))
}

/// Text translator backed by the Cloud Translation v2 REST call.
pub struct GoogleTranslator {
    client: reqwest::Client,
    endpoint: Url,
}

impl GoogleTranslator {
    pub fn new(base_url: &str, api_key: &str) -> Result<Self> {
        Ok(Self {
            client: build_client()?,
            endpoint: build_endpoint(base_url, TRANSLATE_PATH, api_key)?,
        })
    }
}

#[derive(Serialize)]
struct TranslateBody<'a> {
    q: &'a str,
    source: &'a str,
    target: &'a str,
    format: &'static str,
}

#[derive(Deserialize)]
struct TranslateResponse {
    data: TranslateData,
}

#[derive(Deserialize)]
struct TranslateData {
    #[serde(default)]
    translations: Vec<Translation>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct Translation {
    translated_text: String,
}

#[async_trait]
impl TextTranslator for GoogleTranslator {
    async fn translate(
        &self,
        text: &str,
        source_language: &str,
        target_language: &str,
    ) -> Result<String, TranslatorError> {
        let body = TranslateBody {
            q: text,
            source: source_language,
            target: target_language,
            format: "text",
        };

        tracing::debug!(
            source = source_language,
            target = target_language,
            chars = text.chars().count(),
            "Sending text to translator"
        );

        let response = self
            .client
            .post(self.endpoint.clone())
            .json(&body)
            .send()
            .await
            .map_err(|e| TranslatorError::Api(format!("request: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "unknown error".to_string());
            return Err(TranslatorError::Api(format!("status {}: {}", status, body)));
        }

        let result: TranslateResponse = response
            .json()
            .await
            .map_err(|e| TranslatorError::Api(format!("parse response: {}", e)))?;

        result
            .data
            .translations
            .into_iter()
            .next()
            .map(|t| t.translated_text)
            .ok_or(TranslatorError::EmptyResponse)
    }
}
