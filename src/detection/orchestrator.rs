use std::pin::pin;
use std::sync::Arc;
use std::time::Duration;

use anyhow::bail;
use clap::ValueEnum;
use futures_util::stream::{self, StreamExt};
use serde::{Deserialize, Serialize};

use crate::detection::audio::{AudioInput, AudioLimits};
use crate::detection::error::{TranscribeError, TranscribeWarning};
use crate::detection::language::{base_code, to_locale, CandidateTiers, LanguageCandidate, SourceLanguage};
use crate::detection::outcome::{DetectionResult, TranscriptionOutcome, TranslationOutcome};
use crate::detection::scoring::{select_winner, RecognitionAttempt};
use crate::speech::{
    ModelQuality, Recognition, RecognitionRequest, RecognizerError, SpeechRecognizer,
    TextTranslator, TranslatorError,
};

/// Which value of a probe is compared against the confidence threshold to stop searching.
#[derive(Deserialize, Serialize, Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum EarlyStopMetric {
    /// Length weighted quality score. A confident but degenerate fragment never stops the search.
    Quality,
    /// Raw recognizer confidence. The attempt that crosses the threshold wins outright.
    Confidence,
}

#[derive(Debug, Clone)]
pub struct DetectionSettings {
    pub confidence_threshold: f32,
    pub min_quality: f32,
    pub quality_saturation_chars: usize,
    pub secondary_max_kept: usize,
    pub probe_window: usize,
    pub early_stop: EarlyStopMetric,
    pub call_timeout: Duration,
    pub limits: AudioLimits,
}

impl Default for DetectionSettings {
    fn default() -> Self {
        Self {
            confidence_threshold: 0.8,
            min_quality: 0.3,
            quality_saturation_chars: 10,
            secondary_max_kept: 3,
            probe_window: 1,
            early_stop: EarlyStopMetric::Quality,
            call_timeout: Duration::from_secs(15),
            limits: AudioLimits::default(),
        }
    }
}

impl DetectionSettings {
    /// Rejects combinations under which the search rules contradict each other.
    pub fn validate(&self) -> anyhow::Result<()> {
        for (name, value) in [
            ("confidence_threshold", self.confidence_threshold),
            ("min_quality", self.min_quality),
        ] {
            if !(0.0..=1.0).contains(&value) {
                bail!("{} must be between 0 and 1, got {}", name, value);
            }
        }
        // An attempt that stops the search must also be good enough to keep
        if self.confidence_threshold < self.min_quality {
            bail!(
                "confidence_threshold ({}) must not be below min_quality ({})",
                self.confidence_threshold,
                self.min_quality
            );
        }
        if self.secondary_max_kept == 0 {
            bail!("secondary_max_kept must be at least 1");
        }
        if self.probe_window == 0 {
            bail!("probe_window must be at least 1");
        }
        if self.quality_saturation_chars == 0 {
            bail!("quality_saturation_chars must be at least 1");
        }
        if self.call_timeout.is_zero() {
            bail!("call timeout must be greater than zero");
        }
        if self.limits.min_bytes > self.limits.max_bytes {
            bail!(
                "min audio bytes ({}) exceed max audio bytes ({})",
                self.limits.min_bytes,
                self.limits.max_bytes
            );
        }
        Ok(())
    }
}

/// Turns an audio clip into a transcript in a detected (or given) language and a
/// translation into the requested target language.
///
/// Holds no per-request state; one instance is shared by all requests.
pub struct Orchestrator {
    recognizer: Arc<dyn SpeechRecognizer>,
    translator: Arc<dyn TextTranslator>,
    tiers: CandidateTiers,
    settings: DetectionSettings,
}

impl Orchestrator {
    pub fn new(
        recognizer: Arc<dyn SpeechRecognizer>,
        translator: Arc<dyn TextTranslator>,
        tiers: CandidateTiers,
        settings: DetectionSettings,
    ) -> Self {
        Self {
            recognizer,
            translator,
            tiers,
            settings,
        }
    }

    pub fn tiers(&self) -> &CandidateTiers {
        &self.tiers
    }

    pub fn settings(&self) -> &DetectionSettings {
        &self.settings
    }

    #[tracing::instrument(level = "info", skip(self, audio), fields(bytes = audio.len()))]
    pub async fn transcribe_and_translate(
        &self,
        audio: &AudioInput,
        target_language: &str,
        source_language: &SourceLanguage,
    ) -> Result<TranscriptionOutcome, TranscribeError> {
        self.settings.limits.validate(audio)?;
        let target = base_code(target_language);
        if target.is_empty() {
            return Err(TranscribeError::InvalidInput(
                "target language is required".to_string(),
            ));
        }

        let detection = match source_language {
            SourceLanguage::Explicit(hint) => self.recognize_explicit(audio, hint).await?,
            SourceLanguage::Auto => self.detect(audio).await?,
        };
        let (translation, warnings) = self.translate(&detection, &target).await;

        Ok(TranscriptionOutcome {
            detection,
            translation,
            warnings,
        })
    }

    /// One enhanced recognition call in the language the caller chose. Never falls back to
    /// auto-detection.
    async fn recognize_explicit(
        &self,
        audio: &AudioInput,
        hint: &str,
    ) -> Result<DetectionResult, TranscribeError> {
        let locale = to_locale(hint);
        let request = self.request(audio, &locale, ModelQuality::Enhanced);
        let recognition = self.call_recognizer(&request).await.map_err(|source| {
            tracing::error!(language = %locale, error = %source, "Recognition failed");
            TranscribeError::RecognitionFailed {
                language: locale.clone(),
                source,
            }
        })?;

        let transcript = recognition.transcript.trim();
        if transcript.is_empty() {
            tracing::info!(language = %locale, "Recognizer returned an empty transcript");
            return Err(TranscribeError::NoSpeechDetected);
        }

        Ok(DetectionResult {
            transcript: transcript.to_string(),
            detected_language_code: locale,
            confidence: recognition.confidence.clamp(0.0, 1.0),
        })
    }

    /// Probes the candidate tiers and returns the best transcript.
    pub async fn detect(&self, audio: &AudioInput) -> Result<DetectionResult, TranscribeError> {
        let mut kept = Vec::new();

        let mut winner = self
            .probe_tier(audio, self.tiers.primary(), None, &mut kept)
            .await;
        if winner.is_none() && kept.is_empty() && !self.tiers.secondary().is_empty() {
            tracing::info!("Primary tier produced nothing usable, probing the secondary tier");
            winner = self
                .probe_tier(
                    audio,
                    self.tiers.secondary(),
                    Some(self.settings.secondary_max_kept),
                    &mut kept,
                )
                .await;
        }

        let winner = winner
            .or_else(|| select_winner(kept))
            .ok_or(TranscribeError::NoSpeechDetected)?;

        tracing::info!(
            language = %winner.candidate.code,
            confidence = winner.confidence,
            quality = winner.quality_score,
            "Detected spoken language"
        );

        Ok(DetectionResult {
            transcript: winner.transcript,
            detected_language_code: winner.candidate.code,
            confidence: winner.confidence,
        })
    }

    /// Probes `candidates` in priority order, pushing usable attempts into `kept`.
    ///
    /// Up to `probe_window` probes run at once but results are consumed in order, so a
    /// later candidate can never pre-empt an earlier one. Returns the attempt that crossed
    /// the early-stop threshold, if any; returning drops the stream and with it every
    /// probe still in flight.
    async fn probe_tier(
        &self,
        audio: &AudioInput,
        candidates: &[LanguageCandidate],
        max_kept: Option<usize>,
        kept: &mut Vec<RecognitionAttempt>,
    ) -> Option<RecognitionAttempt> {
        let window = self.settings.probe_window.max(1);
        // Futures are lazy, collecting them starts nothing
        let pending: Vec<_> = candidates
            .iter()
            .map(|candidate| self.probe(audio, candidate))
            .collect();
        let mut probes = pin!(stream::iter(pending).buffered(window));

        while let Some(attempt) = probes.next().await {
            let Some(attempt) = attempt else {
                continue;
            };
            let usable = attempt.is_usable(self.settings.min_quality);
            let stop = self.is_early_stop(&attempt);

            tracing::info!(
                language = %attempt.candidate.code,
                tier = %attempt.candidate.tier,
                confidence = attempt.confidence,
                quality = attempt.quality_score,
                kept = usable,
                "Probed candidate language"
            );

            if stop {
                tracing::info!(
                    language = %attempt.candidate.code,
                    metric = ?self.settings.early_stop,
                    "Candidate crossed the confidence threshold, stopping search"
                );
                return Some(attempt);
            }
            if usable {
                kept.push(attempt);
                if max_kept.is_some_and(|max| kept.len() >= max) {
                    tracing::debug!(kept = kept.len(), "Kept attempt limit reached");
                    break;
                }
            }
        }
        None
    }

    async fn probe(
        &self,
        audio: &AudioInput,
        candidate: &LanguageCandidate,
    ) -> Option<RecognitionAttempt> {
        let request = self.request(audio, &candidate.code, ModelQuality::Fast);
        match self.call_recognizer(&request).await {
            Ok(recognition) => Some(RecognitionAttempt::new(
                candidate.clone(),
                &recognition.transcript,
                recognition.confidence,
                self.settings.quality_saturation_chars,
            )),
            Err(e) => {
                tracing::warn!(
                    language = %candidate.code,
                    error = %e,
                    "Recognition probe failed, skipping candidate"
                );
                None
            }
        }
    }

    fn is_early_stop(&self, attempt: &RecognitionAttempt) -> bool {
        let value = match self.settings.early_stop {
            EarlyStopMetric::Quality => attempt.quality_score,
            EarlyStopMetric::Confidence => attempt.confidence,
        };
        !attempt.transcript.is_empty() && value > self.settings.confidence_threshold
    }

    fn request(
        &self,
        audio: &AudioInput,
        language_code: &str,
        quality: ModelQuality,
    ) -> RecognitionRequest {
        RecognitionRequest {
            audio: Arc::clone(audio.bytes()),
            encoding: audio.encoding(),
            sample_rate_hertz: audio.sample_rate_hertz(),
            language_code: language_code.to_string(),
            quality,
        }
    }

    async fn call_recognizer(
        &self,
        request: &RecognitionRequest,
    ) -> Result<Recognition, RecognizerError> {
        let timeout = self.settings.call_timeout;
        tokio::time::timeout(timeout, self.recognizer.recognize(request))
            .await
            .unwrap_or(Err(RecognizerError::Timeout(timeout)))
    }

    /// Translates the detected transcript unless it is already in the target language.
    /// A failed translation degrades to the original text.
    async fn translate(
        &self,
        detection: &DetectionResult,
        target: &str,
    ) -> (TranslationOutcome, Vec<TranscribeWarning>) {
        let source = base_code(&detection.detected_language_code);
        let untranslated = TranslationOutcome {
            translated_text: detection.transcript.clone(),
            source_language_code: source.clone(),
            target_language_code: target.to_string(),
            was_translated: false,
        };
        if source == target {
            tracing::debug!(language = %source, "Transcript already in target language");
            return (untranslated, Vec::new());
        }

        let timeout = self.settings.call_timeout;
        let result = tokio::time::timeout(
            timeout,
            self.translator
                .translate(&detection.transcript, &source, target),
        )
        .await
        .unwrap_or(Err(TranslatorError::Timeout(timeout)));

        match result {
            Ok(translated_text) => (
                TranslationOutcome {
                    translated_text,
                    was_translated: true,
                    ..untranslated
                },
                Vec::new(),
            ),
            Err(e) => {
                tracing::warn!(
                    source = %source,
                    target = %target,
                    error = %e,
                    "Translation failed, returning the original transcript"
                );
                (
                    untranslated,
                    vec![TranscribeWarning::TranslationDegraded {
                        reason: e.to_string(),
                    }],
                )
            }
        }
    }
}
