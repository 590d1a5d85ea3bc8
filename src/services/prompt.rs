use tracing::debug;

use crate::config::Config;
use crate::error::{AppError, AppResult};
use crate::models::{ChatMessage, ExtractedDocument};

pub const SYSTEM_PREAMBLE: &str = "You are a helpful document analyst.

When users upload documents you can summarize their content, answer questions \
about specific information in them, extract key points, dates, names and \
numbers, and compare information across documents.

Rules:
- Be concise but thorough.
- Quote the relevant passages and name the document they come from.
- If the answer is not in the uploaded documents, say so clearly.
- For greetings and casual conversation, respond naturally without referring to documents.
- Use bullet points and short headings when they make the answer clearer.";

const EMPTY_DOCUMENT: &str = "[No extractable text]";
const OMITTED_DOCUMENT: &str = "[OMITTED - context limit reached]";

/// Builds the provider payload from the question and the extracted documents.
#[derive(Debug, Clone)]
pub struct PromptAssembler {
    max_context_words: usize,
    include_preamble: bool,
}

impl PromptAssembler {
    pub fn new(max_context_words: usize, include_preamble: bool) -> Self {
        Self {
            max_context_words,
            include_preamble,
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(config.max_context_words, config.include_preamble)
    }

    pub fn assemble(&self, question: &str, documents: &[ExtractedDocument]) -> AppResult<Vec<ChatMessage>> {
        let question = question.trim();
        if question.is_empty() && documents.is_empty() {
            return Err(AppError::EmptyRequest);
        }

        let mut parts = Vec::with_capacity(documents.len() + 1);
        let mut remaining = self.max_context_words;

        for doc in documents {
            let body = if !doc.has_text() {
                EMPTY_DOCUMENT.to_string()
            } else if remaining == 0 {
                OMITTED_DOCUMENT.to_string()
            } else {
                let (kept, words, truncated) = truncate_words(&doc.text, remaining);
                remaining -= words;
                if truncated {
                    debug!(file_name = %doc.file_name, kept_words = words, "Document truncated to fit context budget");
                    format!("{}\n\n[TRUNCATED - showing first {} words]", kept.trim_end(), words)
                } else {
                    kept.to_string()
                }
            };
            parts.push(format!("[DOCUMENT: {}]\n{}\n", doc.file_name, body));
        }

        if !question.is_empty() {
            parts.push(question.to_string());
        }

        let mut messages = Vec::with_capacity(2);
        if self.include_preamble {
            messages.push(ChatMessage::system(SYSTEM_PREAMBLE));
        }
        messages.push(ChatMessage::user(parts.join("\n\n")));
        Ok(messages)
    }
}

/// Returns the prefix of `text` holding at most `limit` whitespace-separated
/// words, the number of words kept, and whether anything was cut. Formatting
/// inside the kept prefix is untouched.
pub fn truncate_words(text: &str, limit: usize) -> (&str, usize, bool) {
    let mut words = 0;
    let mut in_word = false;

    for (idx, ch) in text.char_indices() {
        if ch.is_whitespace() {
            in_word = false;
        } else if !in_word {
            if words == limit {
                return (&text[..idx], words, true);
            }
            in_word = true;
            words += 1;
        }
    }

    (text, words, false)
}
