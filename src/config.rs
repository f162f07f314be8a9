use std::time::Duration;

use anyhow::{Context, Result};
use clap_serde_derive::ClapSerde;

use crate::detection::language::{DEFAULT_PRIMARY_TIER, DEFAULT_SECONDARY_TIER};
use crate::detection::{AudioLimits, CandidateTiers, DetectionSettings, EarlyStopMetric};

pub const DEFAULT_CONFIG_FILE: &str = "SpeechTranslate.toml";

#[derive(ClapSerde, Debug, Clone)]
pub struct Config {
    /// The address the listener binds to
    #[default("0.0.0.0".to_string())]
    #[arg(short, long, env)]
    pub address: String,

    /// The port the listener binds to
    #[default(25566)]
    #[arg(short, long, env)]
    pub port: u16,

    /// PEM certificate file, TLS is enabled when both this and the key file are set
    #[default(String::new())]
    #[arg(long, env)]
    pub tls_cert_file: String,

    /// PEM private key file
    #[default(String::new())]
    #[arg(long, env)]
    pub tls_key_file: String,

    /// OTLP collector endpoint, telemetry is only exported when set
    #[default(String::new())]
    #[arg(long, env)]
    pub otlp_endpoint: String,

    /// Also log to the console when exporting telemetry
    #[default(false)]
    #[arg(long, env)]
    pub console: bool,

    /// Base URL of the speech recognition API
    #[default("https://speech.googleapis.com".to_string())]
    #[arg(long, env)]
    pub recognizer_url: String,

    /// Base URL of the translation API
    #[default("https://translation.googleapis.com".to_string())]
    #[arg(long, env)]
    pub translator_url: String,

    /// API key sent to both cloud APIs
    #[default(String::new())]
    #[arg(long, env = "GOOGLE_CLOUD_API_KEY", hide_env_values = true)]
    pub api_key: String,

    /// Timeout for every single recognizer or translator call, in seconds
    #[default(15)]
    #[arg(long, env)]
    pub call_timeout_secs: u64,

    /// Uploads smaller than this are rejected as too short to contain speech
    #[default(1_000)]
    #[arg(long, env)]
    pub min_audio_bytes: usize,

    /// Uploads larger than this are rejected
    #[default(10_000_000)]
    #[arg(long, env)]
    pub max_audio_bytes: usize,

    /// Uploads whose container reports a longer duration are rejected
    #[default(60)]
    #[arg(long, env)]
    pub max_audio_seconds: u64,

    /// A probe above this value stops the language search immediately
    #[default(0.8)]
    #[arg(long, env)]
    pub confidence_threshold: f32,

    /// Probes with a quality score at or below this value are discarded
    #[default(0.3)]
    #[arg(long, env)]
    pub min_quality: f32,

    /// Transcript length in characters at which the quality score stops growing
    #[default(10)]
    #[arg(long, env)]
    pub quality_saturation_chars: usize,

    /// The secondary tier stops once this many usable attempts were kept
    #[default(3)]
    #[arg(long, env)]
    pub secondary_max_kept: usize,

    /// Number of candidate languages probed concurrently
    #[default(1)]
    #[arg(long, env)]
    pub probe_window: usize,

    /// Value compared against the confidence threshold to stop early
    #[default(EarlyStopMetric::Quality)]
    #[arg(long, env, value_enum)]
    pub early_stop: EarlyStopMetric,

    /// Languages probed first, in order
    #[default(DEFAULT_PRIMARY_TIER.iter().map(|c| c.to_string()).collect())]
    #[arg(long, env, value_delimiter = ',')]
    pub primary_languages: Vec<String>,

    /// Languages probed only when the primary tier found nothing usable
    #[default(DEFAULT_SECONDARY_TIER.iter().map(|c| c.to_string()).collect())]
    #[arg(long, env, value_delimiter = ',')]
    pub secondary_languages: Vec<String>,
}

impl Config {
    pub fn from_toml(path: &str) -> Result<Self> {
        let str = std::fs::read_to_string(path)?;
        let opt: <Config as ClapSerde>::Opt = toml::from_str(&str)?;
        Ok(Config::from(opt))
    }

    /// Reads the file and lets CLI and environment values override it. A missing default
    /// file is fine, a missing explicitly named file is not.
    pub fn load(path: &str, overrides: <Config as ClapSerde>::Opt) -> Result<Self> {
        match Config::from_toml(path) {
            Ok(config) => Ok(config.merge(overrides)),
            Err(_) if path == DEFAULT_CONFIG_FILE && !std::path::Path::new(path).exists() => {
                Ok(Config::default().merge(overrides))
            }
            Err(err) => Err(err).with_context(|| format!("Failed to read configuration file {}", path)),
        }
    }

    pub fn detection_settings(&self) -> Result<DetectionSettings> {
        let settings = DetectionSettings {
            confidence_threshold: self.confidence_threshold,
            min_quality: self.min_quality,
            quality_saturation_chars: self.quality_saturation_chars,
            secondary_max_kept: self.secondary_max_kept,
            probe_window: self.probe_window,
            early_stop: self.early_stop,
            call_timeout: Duration::from_secs(self.call_timeout_secs),
            limits: self.audio_limits(),
        };
        settings
            .validate()
            .context("Invalid language detection settings")?;
        Ok(settings)
    }

    pub fn audio_limits(&self) -> AudioLimits {
        AudioLimits {
            min_bytes: self.min_audio_bytes,
            max_bytes: self.max_audio_bytes,
            max_duration: Duration::from_secs(self.max_audio_seconds),
        }
    }

    pub fn candidate_tiers(&self) -> Result<CandidateTiers> {
        CandidateTiers::new(&self.primary_languages, &self.secondary_languages)
    }

    pub fn otlp_endpoint(&self) -> Option<String> {
        Some(self.otlp_endpoint.clone()).filter(|e| !e.is_empty())
    }

    pub fn tls_files(&self) -> Option<(&str, &str)> {
        if self.tls_cert_file.is_empty() || self.tls_key_file.is_empty() {
            return None;
        }
        Some((self.tls_cert_file.as_str(), self.tls_key_file.as_str()))
    }
}
