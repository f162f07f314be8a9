use crate::speech::RecognizerError;

#[derive(Debug, thiserror::Error)]
pub enum TranscribeError {
    #[error("invalid input: {0}")]
    InvalidInput(String),
    #[error("no speech detected")]
    NoSpeechDetected,
    #[error("recognition failed for {language}: {source}")]
    RecognitionFailed {
        language: String,
        #[source]
        source: RecognizerError,
    },
}

impl TranscribeError {
    /// Stable machine readable name, used in HTTP error bodies.
    pub fn kind(&self) -> &'static str {
        match self {
            TranscribeError::InvalidInput(_) => "invalid_input",
            TranscribeError::NoSpeechDetected => "no_speech_detected",
            TranscribeError::RecognitionFailed { .. } => "recognition_failed",
        }
    }
}

/// Non-fatal problems attached to an otherwise successful outcome.
#[derive(serde::Serialize, Debug, Clone, PartialEq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TranscribeWarning {
    TranslationDegraded { reason: String },
}
