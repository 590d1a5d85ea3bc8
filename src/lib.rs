//! Document Chat Assistant
//!
//! A small local web service: upload PDF, TXT, CSV, JSON or Markdown files,
//! ask a question, and get an answer from a hosted chat-completion model.

pub mod config;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod services;

pub use config::Config;
pub use error::{AppError, AppResult};
pub use handlers::{create_router, AppState};
