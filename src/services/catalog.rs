use once_cell::sync::Lazy;
use tracing::{info, warn};

use crate::error::{AppError, AppResult};
use crate::models::ModelInfo;
use crate::services::llm_client::ChatCompletionClient;

/// Used when the provider's model list cannot be fetched.
pub static FALLBACK_MODELS: Lazy<Vec<ModelInfo>> = Lazy::new(|| {
    vec![
        ModelInfo::new("meta-llama/llama-3.2-3b-instruct:free", "Llama 3.2 3B (free)"),
        ModelInfo::new("meta-llama/llama-3.2-1b-instruct:free", "Llama 3.2 1B (free)"),
        ModelInfo::new("google/gemma-2-9b-it:free", "Gemma 2 9B (free)"),
        ModelInfo::new("qwen/qwen-2-7b-instruct:free", "Qwen 2 7B (free)"),
    ]
});

/// Models offered in the UI. Built once at startup and never mutated.
#[derive(Debug, Clone)]
pub struct ModelCatalog {
    models: Vec<ModelInfo>,
    default_model: String,
}

impl ModelCatalog {
    pub fn new(models: Vec<ModelInfo>, default_model: impl Into<String>) -> Self {
        Self {
            models,
            default_model: default_model.into(),
        }
    }

    pub fn fallback(default_model: impl Into<String>) -> Self {
        Self::new(FALLBACK_MODELS.clone(), default_model)
    }

    pub async fn load(client: &dyn ChatCompletionClient, default_model: impl Into<String>) -> Self {
        match client.list_models().await {
            Ok(models) if !models.is_empty() => {
                info!(count = models.len(), "Loaded model catalog from provider");
                Self::new(models, default_model)
            }
            Ok(_) => {
                warn!("Provider listed no free models, using fallback list");
                Self::fallback(default_model)
            }
            Err(e) => {
                warn!(error = %e, "Model list fetch failed, using fallback list");
                Self::fallback(default_model)
            }
        }
    }

    pub fn models(&self) -> &[ModelInfo] {
        &self.models
    }

    pub fn contains(&self, id: &str) -> bool {
        self.models.iter().any(|m| m.id == id)
    }

    /// The configured default when the catalog offers it, else the first entry.
    pub fn current(&self) -> &str {
        if self.contains(&self.default_model) {
            &self.default_model
        } else {
            self.models
                .first()
                .map(|m| m.id.as_str())
                .unwrap_or(&self.default_model)
        }
    }

    /// Picks the model for a request: the caller's choice if the catalog knows
    /// it, otherwise the current default.
    pub fn resolve(&self, requested: Option<&str>) -> AppResult<String> {
        match requested.map(str::trim).filter(|id| !id.is_empty()) {
            None => Ok(self.current().to_string()),
            Some(id) if self.contains(id) || id == self.current() => Ok(id.to_string()),
            Some(id) => Err(AppError::UnknownModel { model: id.to_string() }),
        }
    }
}
