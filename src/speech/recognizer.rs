use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::detection::audio::AudioEncoding;

/// Which recognition model to ask the backend for.
#[derive(Deserialize, Serialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ModelQuality {
    /// Low latency model used while probing candidate languages
    Fast,
    /// Highest quality model, used when the caller named the language
    Enhanced,
}

#[derive(Debug, Clone)]
pub struct RecognitionRequest {
    pub audio: Arc<[u8]>,
    pub encoding: AudioEncoding,
    pub sample_rate_hertz: Option<u32>,
    pub language_code: String,
    pub quality: ModelQuality,
}

#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
pub struct Recognition {
    pub transcript: String,
    pub confidence: f32,
}

impl Recognition {
    pub fn empty() -> Self {
        Self {
            transcript: String::new(),
            confidence: 0.0,
        }
    }
}

#[async_trait]
pub trait SpeechRecognizer: Send + Sync {
    async fn recognize(&self, request: &RecognitionRequest)
        -> Result<Recognition, RecognizerError>;
}

#[derive(Debug, thiserror::Error)]
pub enum RecognizerError {
    #[error("api request failed: {0}")]
    Api(String),
    #[error("unsupported language {0}")]
    UnsupportedLanguage(String),
    #[error("unsupported audio encoding: {0}")]
    UnsupportedEncoding(String),
    #[error("recognizer timed out after {0:?}")]
    Timeout(Duration),
}
