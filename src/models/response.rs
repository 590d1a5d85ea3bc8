use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::request::FileKind;

const PREVIEW_CHARS: usize = 300;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentMetadata {
    pub title: Option<String>,
    pub author: Option<String>,
    pub pages: Option<usize>,
    pub file_size_bytes: usize,
}

impl DocumentMetadata {
    pub fn new(file_size_bytes: usize) -> Self {
        Self {
            title: None,
            author: None,
            pages: None,
            file_size_bytes,
        }
    }

    pub fn with_pages(mut self, pages: usize) -> Self {
        self.pages = Some(pages);
        self
    }

    pub fn with_title(mut self, title: Option<String>) -> Self {
        self.title = title;
        self
    }

    pub fn with_author(mut self, author: Option<String>) -> Self {
        self.author = author;
        self
    }
}

/// Text pulled out of one uploaded file. Lives for a single request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractedDocument {
    pub file_name: String,
    pub kind: FileKind,
    pub text: String,
    pub metadata: DocumentMetadata,
    pub warnings: Vec<String>,
}

impl ExtractedDocument {
    pub fn new(file_name: String, kind: FileKind, text: String, metadata: DocumentMetadata) -> Self {
        Self {
            file_name,
            kind,
            text,
            metadata,
            warnings: Vec::new(),
        }
    }

    pub fn with_warning(mut self, warning: impl Into<String>) -> Self {
        self.warnings.push(warning.into());
        self
    }

    pub fn has_text(&self) -> bool {
        !self.text.trim().is_empty()
    }

    pub fn word_count(&self) -> usize {
        self.text.split_whitespace().count()
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct DocumentSummary {
    pub file_name: String,
    pub kind: FileKind,
    pub size_bytes: usize,
    pub pages: Option<usize>,
    pub title: Option<String>,
    pub author: Option<String>,
    pub characters: usize,
    pub words: usize,
    pub preview: String,
    pub warnings: Vec<String>,
}

impl From<&ExtractedDocument> for DocumentSummary {
    fn from(doc: &ExtractedDocument) -> Self {
        Self {
            file_name: doc.file_name.clone(),
            kind: doc.kind,
            size_bytes: doc.metadata.file_size_bytes,
            pages: doc.metadata.pages,
            title: doc.metadata.title.clone(),
            author: doc.metadata.author.clone(),
            characters: doc.text.chars().count(),
            words: doc.word_count(),
            preview: doc.text.chars().take(PREVIEW_CHARS).collect(),
            warnings: doc.warnings.clone(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct UploadResponse {
    pub success: bool,
    pub data: UploadData,
    pub processing_time_ms: u64,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct UploadData {
    pub documents: Vec<DocumentSummary>,
    pub total_bytes: usize,
}

impl UploadResponse {
    pub fn new(documents: &[ExtractedDocument], processing_time_ms: u64) -> Self {
        let total_bytes = documents.iter().map(|d| d.metadata.file_size_bytes).sum();
        Self {
            success: true,
            data: UploadData {
                documents: documents.iter().map(DocumentSummary::from).collect(),
                total_bytes,
            },
            processing_time_ms,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelInfo {
    pub id: String,
    pub label: String,
}

impl ModelInfo {
    pub fn new(id: impl Into<String>, label: impl Into<String>) -> Self {
        Self { id: id.into(), label: label.into() }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ModelsResponse {
    pub models: Vec<ModelInfo>,
    pub current: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub api_configured: bool,
    pub default_model: String,
    pub version: String,
    pub timestamp: DateTime<Utc>,
}

/// One `data:` line of the chat event stream.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ChatEvent {
    Text { content: String },
    Done { model: String, processing_time_ms: u64 },
    Error { content: String },
}
