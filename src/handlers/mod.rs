pub mod chat;
pub mod health;
pub mod ui;
pub mod upload;

pub use chat::*;
pub use health::*;
pub use ui::*;
pub use upload::upload_handler;

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::config::Config;
use crate::middleware::logging_middleware;
use crate::services::{ChatCompletionClient, DocumentExtractor, FileIntake, ModelCatalog, PromptAssembler};

/// Room for multipart boundaries and text fields on top of the file bytes.
const MULTIPART_OVERHEAD_BYTES: usize = 1024 * 1024;

/// Shared, read-only application state.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub llm: Arc<dyn ChatCompletionClient>,
    pub catalog: Arc<ModelCatalog>,
    pub extractor: DocumentExtractor,
}

impl AppState {
    pub fn new(config: Config, llm: Arc<dyn ChatCompletionClient>, catalog: ModelCatalog) -> Self {
        Self {
            config: Arc::new(config),
            llm,
            catalog: Arc::new(catalog),
            extractor: DocumentExtractor::new(),
        }
    }

    pub fn intake(&self) -> FileIntake {
        FileIntake::from_config(&self.config)
    }

    pub fn assembler(&self) -> PromptAssembler {
        PromptAssembler::from_config(&self.config)
    }
}

pub fn create_router(state: AppState) -> Router {
    let body_limit = state.config.max_total_upload_bytes() + MULTIPART_OVERHEAD_BYTES;

    Router::new()
        .route("/", get(index_handler))
        .route("/health", get(health_handler))
        .route("/ready", get(ready_handler))
        .route("/api/models", get(models_handler))
        .route("/api/upload", post(upload_handler))
        .route("/api/chat", post(chat_handler))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CorsLayer::permissive())
                .layer(DefaultBodyLimit::max(body_limit))
                .layer(axum::middleware::from_fn(logging_middleware)),
        )
        .with_state(state)
}
