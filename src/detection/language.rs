use std::collections::{HashMap, HashSet};
use std::fmt::Display;

use anyhow::{bail, Result};
use lazy_static::lazy_static;
use serde::Serialize;

/// Base language code, recognizer locale and display name.
const LANGUAGES: [(&str, &str, &str); 30] = [
    ("en", "en-US", "English"),
    ("hi", "hi-IN", "Hindi"),
    ("es", "es-ES", "Spanish"),
    ("fr", "fr-FR", "French"),
    ("de", "de-DE", "German"),
    ("zh", "zh-CN", "Chinese (Simplified)"),
    ("ar", "ar-SA", "Arabic"),
    ("pt", "pt-BR", "Portuguese"),
    ("ja", "ja-JP", "Japanese"),
    ("ko", "ko-KR", "Korean"),
    ("ru", "ru-RU", "Russian"),
    ("it", "it-IT", "Italian"),
    ("bn", "bn-IN", "Bengali"),
    ("ta", "ta-IN", "Tamil"),
    ("te", "te-IN", "Telugu"),
    ("mr", "mr-IN", "Marathi"),
    ("gu", "gu-IN", "Gujarati"),
    ("kn", "kn-IN", "Kannada"),
    ("ml", "ml-IN", "Malayalam"),
    ("pa", "pa-IN", "Punjabi"),
    ("ur", "ur-PK", "Urdu"),
    ("tr", "tr-TR", "Turkish"),
    ("vi", "vi-VN", "Vietnamese"),
    ("th", "th-TH", "Thai"),
    ("id", "id-ID", "Indonesian"),
    ("nl", "nl-NL", "Dutch"),
    ("pl", "pl-PL", "Polish"),
    ("sv", "sv-SE", "Swedish"),
    ("uk", "uk-UA", "Ukrainian"),
    ("he", "he-IL", "Hebrew"),
];

pub const DEFAULT_PRIMARY_TIER: [&str; 8] = [
    "en-US", "hi-IN", "es-ES", "fr-FR", "de-DE", "zh-CN", "ar-SA", "pt-BR",
];

pub const DEFAULT_SECONDARY_TIER: [&str; 16] = [
    "ja-JP", "ko-KR", "ru-RU", "it-IT", "bn-IN", "ta-IN", "te-IN", "mr-IN", "gu-IN", "ur-PK",
    "tr-TR", "vi-VN", "th-TH", "id-ID", "nl-NL", "pl-PL",
];

lazy_static! {
    static ref CATALOGUE: HashMap<&'static str, (&'static str, &'static str)> = LANGUAGES
        .iter()
        .map(|(base, locale, name)| (*base, (*locale, *name)))
        .collect();
}

/// Strips the region subtag: `en-US` becomes `en`.
pub fn base_code(code: &str) -> String {
    code.trim()
        .split(['-', '_'])
        .next()
        .unwrap_or_default()
        .to_ascii_lowercase()
}

/// Resolves a language hint to a recognizer locale. Hints that already name a region are
/// kept, unknown base codes fall back to the `-US` region.
pub fn to_locale(hint: &str) -> String {
    let hint = hint.trim();
    if hint.contains(['-', '_']) {
        return hint.replace('_', "-");
    }
    let base = hint.to_ascii_lowercase();
    match CATALOGUE.get(base.as_str()) {
        Some((locale, _)) => (*locale).to_string(),
        None => format!("{}-US", base),
    }
}

pub fn display_name(code: &str) -> String {
    CATALOGUE
        .get(base_code(code).as_str())
        .map(|(_, name)| (*name).to_string())
        .unwrap_or_else(|| code.to_string())
}

#[derive(Serialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Tier {
    Primary,
    Secondary,
}

impl Display for Tier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Tier::Primary => write!(f, "primary"),
            Tier::Secondary => write!(f, "secondary"),
        }
    }
}

#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
pub struct LanguageCandidate {
    pub code: String,
    pub display_name: String,
    pub tier: Tier,
}

impl LanguageCandidate {
    pub fn new(code: &str, tier: Tier) -> Self {
        let code = to_locale(code);
        Self {
            display_name: display_name(&code),
            code,
            tier,
        }
    }
}

/// The ordered candidate lists probed during auto-detection, most likely languages first.
#[derive(Serialize, Debug, Clone)]
pub struct CandidateTiers {
    primary: Vec<LanguageCandidate>,
    secondary: Vec<LanguageCandidate>,
}

impl CandidateTiers {
    pub fn new<S: AsRef<str>>(primary: &[S], secondary: &[S]) -> Result<Self> {
        let mut seen = HashSet::new();
        let mut build = |codes: &[S], tier: Tier| -> Vec<LanguageCandidate> {
            codes
                .iter()
                .map(|c| c.as_ref().trim())
                .filter(|c| !c.is_empty())
                .map(|c| LanguageCandidate::new(c, tier))
                .filter(|c| seen.insert(c.code.clone()))
                .collect()
        };
        let primary = build(primary, Tier::Primary);
        let secondary = build(secondary, Tier::Secondary);

        if primary.is_empty() {
            bail!("The primary language tier must contain at least one language");
        }
        Ok(Self { primary, secondary })
    }

    pub fn primary(&self) -> &[LanguageCandidate] {
        &self.primary
    }

    pub fn secondary(&self) -> &[LanguageCandidate] {
        &self.secondary
    }
}

impl Default for CandidateTiers {
    fn default() -> Self {
        let primary = DEFAULT_PRIMARY_TIER
            .iter()
            .map(|c| LanguageCandidate::new(c, Tier::Primary))
            .collect();
        let secondary = DEFAULT_SECONDARY_TIER
            .iter()
            .map(|c| LanguageCandidate::new(c, Tier::Secondary))
            .collect();
        Self { primary, secondary }
    }
}

/// What the caller said about the spoken language.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SourceLanguage {
    Auto,
    Explicit(String),
}

impl SourceLanguage {
    /// A missing hint, an empty hint and `auto` all mean auto-detect.
    pub fn from_hint(hint: Option<&str>) -> Self {
        match hint.map(str::trim) {
            None | Some("") => SourceLanguage::Auto,
            Some(h) if h.eq_ignore_ascii_case("auto") => SourceLanguage::Auto,
            Some(h) => SourceLanguage::Explicit(h.to_string()),
        }
    }
}
