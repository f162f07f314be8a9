pub mod google;
pub mod recognizer;
pub mod translator;

pub use google::{GoogleSpeechRecognizer, GoogleTranslator};
pub use recognizer::{
    ModelQuality, Recognition, RecognitionRequest, RecognizerError, SpeechRecognizer,
};
pub use translator::{TextTranslator, TranslatorError};
