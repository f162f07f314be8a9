use std::sync::Arc;

use anyhow::Result;
use axum::extract::DefaultBodyLimit;
use axum::middleware;
use axum::routing::{get, post};
use axum::Router;
use tower_http::trace::TraceLayer;

use crate::config::Config;
use crate::detection::Orchestrator;
use crate::request_id::request_id_middleware;
use crate::speech::{GoogleSpeechRecognizer, GoogleTranslator, SpeechRecognizer, TextTranslator};

pub mod status;
pub mod transcribe;
pub mod translate;

// Room for the multipart boundaries and the JSON request part
const MULTIPART_OVERHEAD: usize = 64 * 1024;

#[derive(Clone)]
pub struct AppState {
    pub orchestrator: Arc<Orchestrator>,
    pub translator: Arc<dyn TextTranslator>,
}

impl AppState {
    /// Wires the cloud recognizer and translator into an orchestrator.
    pub fn from_config(config: &Config) -> Result<Self> {
        let recognizer: Arc<dyn SpeechRecognizer> = Arc::new(GoogleSpeechRecognizer::new(
            &config.recognizer_url,
            &config.api_key,
        )?);
        let translator: Arc<dyn TextTranslator> = Arc::new(GoogleTranslator::new(
            &config.translator_url,
            &config.api_key,
        )?);
        let orchestrator = Orchestrator::new(
            recognizer,
            Arc::clone(&translator),
            config.candidate_tiers()?,
            config.detection_settings()?,
        );

        Ok(Self {
            orchestrator: Arc::new(orchestrator),
            translator,
        })
    }
}

pub fn create_router(state: AppState) -> Router {
    let body_limit = state.orchestrator.settings().limits.max_bytes + MULTIPART_OVERHEAD;

    let audio_router = Router::new()
        .route("/transcribe", post(transcribe::handle_transcribe_request))
        .layer(DefaultBodyLimit::max(body_limit));

    let text_router = Router::new().route("/translate", post(translate::handle_translate_request));

    Router::new()
        .nest("/audio", audio_router)
        .nest("/text", text_router)
        .route("/languages", get(status::handle_languages_request))
        .route("/health", get(status::handle_health_request))
        .layer(TraceLayer::new_for_http())
        .layer(middleware::from_fn(request_id_middleware))
        .with_state(state)
}
