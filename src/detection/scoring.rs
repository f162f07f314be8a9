use serde::Serialize;

use crate::detection::language::LanguageCandidate;

/// Confidence scaled by a saturating function of transcript length, so that a short,
/// confidently recognised fragment scores below a longer, slightly less confident one.
pub fn quality_score(confidence: f32, transcript: &str, saturation_chars: usize) -> f32 {
    let length = transcript.trim().chars().count();
    if length == 0 {
        return 0.0;
    }
    let saturation = saturation_chars.max(1) as f32;
    let length_factor = (length as f32 / saturation).min(1.0);
    confidence.clamp(0.0, 1.0) * length_factor
}

/// The outcome of probing a single candidate language.
#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct RecognitionAttempt {
    pub candidate: LanguageCandidate,
    pub transcript: String,
    pub confidence: f32,
    pub quality_score: f32,
}

impl RecognitionAttempt {
    pub fn new(
        candidate: LanguageCandidate,
        transcript: &str,
        confidence: f32,
        saturation_chars: usize,
    ) -> Self {
        let transcript = transcript.trim().to_string();
        let quality_score = quality_score(confidence, &transcript, saturation_chars);
        Self {
            candidate,
            transcript,
            confidence: confidence.clamp(0.0, 1.0),
            quality_score,
        }
    }

    /// Whether the attempt is usable for selection at all.
    pub fn is_usable(&self, min_quality: f32) -> bool {
        !self.transcript.is_empty() && self.quality_score > min_quality
    }
}

/// Picks the attempt with the highest quality score. Ties go to the earlier, higher prior
/// candidate because the sort is stable.
pub fn select_winner(mut kept: Vec<RecognitionAttempt>) -> Option<RecognitionAttempt> {
    kept.sort_by(|a, b| b.quality_score.total_cmp(&a.quality_score));
    kept.into_iter().next()
}
