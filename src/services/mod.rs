pub mod catalog;
pub mod extractor;
pub mod intake;
pub mod llm_client;
pub mod pdf_processor;
pub mod prompt;

pub use catalog::ModelCatalog;
pub use extractor::DocumentExtractor;
pub use intake::FileIntake;
pub use llm_client::{ChatCompletion, ChatCompletionClient, ChatCompletionRequest, LlmError, OpenRouterClient};
pub use pdf_processor::PdfProcessor;
pub use prompt::PromptAssembler;
