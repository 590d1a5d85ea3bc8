use std::panic;
use std::time::Instant;

use lopdf::{Document, Object};

#[derive(Debug, Clone, Copy)]
pub struct PdfProcessor;

#[derive(Debug, Default)]
pub struct PdfExtraction {
    pub text: String,
    pub pages: Option<usize>,
    pub title: Option<String>,
    pub author: Option<String>,
    pub warnings: Vec<String>,
}

impl PdfProcessor {
    pub fn new() -> Self {
        Self
    }

    /// Pulls text and document info out of a PDF. Never fails: unreadable
    /// input yields empty text plus a warning.
    pub fn extract(&self, content: &[u8]) -> PdfExtraction {
        let start = Instant::now();
        let mut result = PdfExtraction::default();

        match Document::load_mem(content) {
            Ok(doc) => {
                result.pages = Some(doc.get_pages().len());
                result.title = info_string(&doc, b"Title");
                result.author = info_string(&doc, b"Author");
            }
            Err(e) => {
                tracing::warn!("PDF structure validation failed: {}, will try text extraction anyway", e);
            }
        }

        // pdf-extract panics on some malformed inputs.
        match panic::catch_unwind(|| pdf_extract::extract_text_from_mem_by_pages(content)) {
            Ok(Ok(pages)) => {
                tracing::debug!("PDF text extraction successful, {} pages", pages.len());
                result.text = join_pages(&pages);
            }
            Ok(Err(e)) => {
                tracing::warn!("PDF text extraction failed: {}", e);
                result.warnings.push(format!("Could not extract PDF text: {}", e));
            }
            Err(_) => {
                tracing::warn!("PDF text extraction aborted on malformed input");
                result.warnings.push("Could not extract PDF text: malformed document".to_string());
            }
        }

        if result.text.is_empty() && result.warnings.is_empty() {
            result.warnings.push("PDF contains no extractable text".to_string());
        }

        tracing::info!(
            "PDF processing completed in {}ms, extracted {} characters from {:?} pages",
            start.elapsed().as_millis(),
            result.text.len(),
            result.pages
        );

        result
    }
}

impl Default for PdfProcessor {
    fn default() -> Self {
        Self::new()
    }
}

/// Labels each non-blank page with a `--- Page N ---` header and separates
/// pages with a blank line.
fn join_pages(pages: &[String]) -> String {
    pages
        .iter()
        .enumerate()
        .filter_map(|(i, page)| {
            let trimmed = page.trim();
            (!trimmed.is_empty()).then(|| format!("--- Page {} ---\n{}", i + 1, trimmed))
        })
        .collect::<Vec<_>>()
        .join("\n\n")
}

fn info_string(doc: &Document, key: &[u8]) -> Option<String> {
    let info = doc.trailer.get(b"Info").ok()?;
    let info = match info.as_reference() {
        Ok(id) => doc.get_object(id).ok()?,
        Err(_) => info,
    };
    let value = match info.as_dict().ok()?.get(key).ok()? {
        Object::Reference(id) => doc.get_object(*id).ok()?,
        other => other,
    };
    let decoded = decode_pdf_string(value.as_str().ok()?);
    let trimmed = decoded.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

/// Decodes a PDF text string: UTF-16 with either BOM, BOM-less UTF-16BE,
/// or single-byte text.
pub fn decode_pdf_string(bytes: &[u8]) -> String {
    if let Some(rest) = bytes.strip_prefix(&[0xFE, 0xFF]) {
        decode_utf16(rest, u16::from_be_bytes)
    } else if let Some(rest) = bytes.strip_prefix(&[0xFF, 0xFE]) {
        decode_utf16(rest, u16::from_le_bytes)
    } else if looks_like_utf16(bytes) {
        decode_utf16(bytes, u16::from_be_bytes)
    } else {
        String::from_utf8_lossy(bytes).into_owned()
    }
}

fn looks_like_utf16(bytes: &[u8]) -> bool {
    if bytes.len() < 2 {
        return false;
    }
    let null_count = bytes.iter().filter(|&&b| b == 0).count();
    null_count > bytes.len() / 3
}

fn decode_utf16(bytes: &[u8], to_unit: fn([u8; 2]) -> u16) -> String {
    let units = bytes.chunks_exact(2).map(|pair| to_unit([pair[0], pair[1]]));
    char::decode_utf16(units)
        .map(|c| c.unwrap_or(char::REPLACEMENT_CHARACTER))
        .filter(|&c| c != '\0')
        .collect()
}
