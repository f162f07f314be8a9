use std::time::Duration;

use async_trait::async_trait;

#[async_trait]
pub trait TextTranslator: Send + Sync {
    async fn translate(
        &self,
        text: &str,
        source_language: &str,
        target_language: &str,
    ) -> Result<String, TranslatorError>;
}

#[derive(Debug, thiserror::Error)]
pub enum TranslatorError {
    #[error("api request failed: {0}")]
    Api(String),
    #[error("translator returned no translations")]
    EmptyResponse,
    #[error("translator timed out after {0:?}")]
    Timeout(Duration),
}
