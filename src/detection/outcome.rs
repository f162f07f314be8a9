use serde::Serialize;

use crate::detection::error::TranscribeWarning;

#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct DetectionResult {
    pub transcript: String,
    /// Recognizer locale of the winning candidate, e.g. `hi-IN`
    pub detected_language_code: String,
    pub confidence: f32,
}

#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct TranslationOutcome {
    pub translated_text: String,
    pub source_language_code: String,
    pub target_language_code: String,
    pub was_translated: bool,
}

#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct TranscriptionOutcome {
    #[serde(flatten)]
    pub detection: DetectionResult,
    #[serde(flatten)]
    pub translation: TranslationOutcome,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<TranscribeWarning>,
}
