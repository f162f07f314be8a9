pub mod audio;
pub mod error;
pub mod language;
pub mod orchestrator;
pub mod outcome;
pub mod scoring;

pub use audio::{AudioEncoding, AudioInput, AudioLimits};
pub use error::{TranscribeError, TranscribeWarning};
pub use language::{CandidateTiers, LanguageCandidate, SourceLanguage, Tier};
pub use orchestrator::{DetectionSettings, EarlyStopMetric, Orchestrator};
pub use outcome::{DetectionResult, TranscriptionOutcome, TranslationOutcome};
pub use scoring::{quality_score, RecognitionAttempt};
