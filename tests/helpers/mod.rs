#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;

use speech_translate::detection::{AudioInput, CandidateTiers, DetectionSettings, Orchestrator};
use speech_translate::speech::{
    ModelQuality, Recognition, RecognitionRequest, RecognizerError, SpeechRecognizer,
    TextTranslator, TranslatorError,
};

/// What the scripted recognizer does for one locale.
#[derive(Clone)]
pub enum Reply {
    Text(&'static str, f32),
    Delayed(Duration, &'static str, f32),
    Fail,
    Hang,
}

/// Answers per locale from a script; locales without a script hear nothing.
#[derive(Default)]
pub struct ScriptedRecognizer {
    script: HashMap<String, Reply>,
    calls: Mutex<Vec<(String, ModelQuality)>>,
}

impl ScriptedRecognizer {
    pub fn new(script: &[(&str, Reply)]) -> Self {
        Self {
            script: script
                .iter()
                .map(|(code, reply)| (code.to_string(), reply.clone()))
                .collect(),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn silent() -> Self {
        Self::default()
    }

    pub fn called_languages(&self) -> Vec<String> {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .map(|(code, _)| code.clone())
            .collect()
    }

    pub fn calls(&self) -> Vec<(String, ModelQuality)> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl SpeechRecognizer for ScriptedRecognizer {
    async fn recognize(
        &self,
        request: &RecognitionRequest,
    ) -> Result<Recognition, RecognizerError> {
        self.calls
            .lock()
            .unwrap()
            .push((request.language_code.clone(), request.quality));

        match self.script.get(&request.language_code).cloned() {
            None => Ok(Recognition::empty()),
            Some(Reply::Text(transcript, confidence)) => Ok(Recognition {
                transcript: transcript.to_string(),
                confidence,
            }),
            Some(Reply::Delayed(delay, transcript, confidence)) => {
                tokio::time::sleep(delay).await;
                Ok(Recognition {
                    transcript: transcript.to_string(),
                    confidence,
                })
            }
            Some(Reply::Fail) => Err(RecognizerError::Api("status 503: unavailable".to_string())),
            Some(Reply::Hang) => {
                tokio::time::sleep(Duration::from_secs(30)).await;
                Ok(Recognition::empty())
            }
        }
    }
}

#[derive(Default, Clone, Copy)]
enum TranslatorMode {
    #[default]
    Echo,
    Fail,
    Hang,
}

/// Prefixes the text with the target language, or fails or hangs when told to.
#[derive(Default)]
pub struct MockTranslator {
    mode: TranslatorMode,
    calls: Mutex<Vec<(String, String, String)>>,
}

impl MockTranslator {
    fn with_mode(mode: TranslatorMode) -> Self {
        Self {
            mode,
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn failing() -> Self {
        Self::with_mode(TranslatorMode::Fail)
    }

    pub fn hanging() -> Self {
        Self::with_mode(TranslatorMode::Hang)
    }

    pub fn calls(&self) -> Vec<(String, String, String)> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl TextTranslator for MockTranslator {
    async fn translate(
        &self,
        text: &str,
        source_language: &str,
        target_language: &str,
    ) -> Result<String, TranslatorError> {
        self.calls.lock().unwrap().push((
            text.to_string(),
            source_language.to_string(),
            target_language.to_string(),
        ));
        match self.mode {
            TranslatorMode::Echo => Ok(format!("[{}] {}", target_language, text)),
            TranslatorMode::Fail => {
                Err(TranslatorError::Api("status 500: translate down".to_string()))
            }
            TranslatorMode::Hang => {
                tokio::time::sleep(Duration::from_secs(30)).await;
                Ok(text.to_string())
            }
        }
    }
}

pub fn test_settings() -> DetectionSettings {
    DetectionSettings {
        call_timeout: Duration::from_millis(200),
        ..DetectionSettings::default()
    }
}

pub fn orchestrator(
    recognizer: &Arc<ScriptedRecognizer>,
    translator: &Arc<MockTranslator>,
    settings: DetectionSettings,
) -> Orchestrator {
    Orchestrator::new(
        Arc::clone(recognizer) as Arc<dyn SpeechRecognizer>,
        Arc::clone(translator) as Arc<dyn TextTranslator>,
        CandidateTiers::default(),
        settings,
    )
}

/// Bytes that no container probe recognises, big enough to pass the size limits.
pub fn browser_audio() -> AudioInput {
    AudioInput::new(vec![0x1a; 4_096], Some("audio/webm;codecs=opus"))
}

pub const PRIMARY_LEN: usize = 8;
pub const SECONDARY_LEN: usize = 16;
