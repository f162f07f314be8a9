pub mod config;
pub mod detection;
pub mod error;
pub mod request_id;
pub mod routes;
pub mod speech;
pub mod telemetry;

pub use config::Config;
pub use detection::{AudioInput, Orchestrator, SourceLanguage, TranscribeError};
pub use error::{HttpErrorResponse, ServiceError, ServiceResult};
pub use routes::{create_router, AppState};
