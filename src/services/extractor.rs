use std::time::Instant;
use tracing::{debug, info, warn};

use crate::models::{DocumentMetadata, ExtractedDocument, FileKind, UploadedFile};
use crate::services::pdf_processor::PdfProcessor;

const UTF8_BOM: &[u8] = &[0xEF, 0xBB, 0xBF];

/// Turns accepted uploads into plain text, dispatching on [`FileKind`].
#[derive(Debug, Default, Clone, Copy)]
pub struct DocumentExtractor;

impl DocumentExtractor {
    pub fn new() -> Self {
        Self
    }

    pub async fn extract(&self, file: UploadedFile, kind: FileKind) -> ExtractedDocument {
        let start = Instant::now();
        let name = file.name.clone();

        let document = match kind {
            FileKind::Pdf => extract_pdf(file).await,
            FileKind::Txt | FileKind::Csv | FileKind::Json | FileKind::Md => decode_text(file, kind),
        };

        info!(
            file_name = %name,
            kind = %kind,
            text_length = document.text.len(),
            warnings = document.warnings.len(),
            processing_time_ms = start.elapsed().as_millis() as u64,
            "Text extraction finished"
        );
        document
    }

    /// Extracts each file in order. `kinds` pairs up with `files`.
    pub async fn extract_all(&self, files: Vec<UploadedFile>, kinds: Vec<FileKind>) -> Vec<ExtractedDocument> {
        let mut documents = Vec::with_capacity(files.len());
        for (file, kind) in files.into_iter().zip(kinds) {
            documents.push(self.extract(file, kind).await);
        }
        documents
    }
}

async fn extract_pdf(file: UploadedFile) -> ExtractedDocument {
    let name = file.name.clone();
    let size = file.size;
    let content = file.content;

    let joined = tokio::task::spawn_blocking(move || PdfProcessor::new().extract(&content)).await;

    match joined {
        Ok(result) => {
            let mut metadata = DocumentMetadata::new(size)
                .with_title(result.title)
                .with_author(result.author);
            if let Some(pages) = result.pages {
                metadata = metadata.with_pages(pages);
            }
            let mut document = ExtractedDocument::new(name, FileKind::Pdf, result.text, metadata);
            document.warnings = result.warnings;
            document
        }
        Err(e) => {
            warn!(file_name = %name, error = %e, "PDF extraction task failed");
            ExtractedDocument::new(name, FileKind::Pdf, String::new(), DocumentMetadata::new(size))
                .with_warning("Could not extract PDF text: extraction task failed")
        }
    }
}

fn decode_text(file: UploadedFile, kind: FileKind) -> ExtractedDocument {
    let raw = file.content.strip_prefix(UTF8_BOM).unwrap_or(&file.content[..]);
    let metadata = DocumentMetadata::new(file.size);

    match std::str::from_utf8(raw) {
        Ok(text) => ExtractedDocument::new(file.name, kind, text.to_string(), metadata),
        Err(e) => {
            debug!(file_name = %file.name, error = %e, "Lossy decode of non UTF-8 text");
            let text = String::from_utf8_lossy(raw).into_owned();
            ExtractedDocument::new(file.name, kind, text, metadata)
                .with_warning("File is not valid UTF-8; invalid bytes were replaced")
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn upload(name: &str, content: &[u8]) -> UploadedFile {
        UploadedFile::new(name.to_string(), content.to_vec())
    }

    #[tokio::test]
    async fn small_text_file_round_trips_exactly() {
        let raw = "line one\n  indented, with trailing space \n\nünïcödé ✓\n";
        let doc = DocumentExtractor::new()
            .extract(upload("notes.txt", raw.as_bytes()), FileKind::Txt)
            .await;
        assert_eq!(doc.text, raw);
        assert!(doc.warnings.is_empty());
        assert_eq!(doc.metadata.file_size_bytes, raw.len());
        assert_eq!(doc.metadata.pages, None);
    }

    #[tokio::test]
    async fn csv_json_and_markdown_are_decoded_verbatim() {
        let extractor = DocumentExtractor::new();
        for (name, kind, raw) in [
            ("data.csv", FileKind::Csv, "a,b\n1,2\n"),
            ("data.json", FileKind::Json, "{\"k\": [1, 2]}"),
            ("README.md", FileKind::Md, "# Title\n\n- item\n"),
        ] {
            let doc = extractor.extract(upload(name, raw.as_bytes()), kind).await;
            assert_eq!(doc.text, raw);
            assert_eq!(doc.kind, kind);
        }
    }

    #[tokio::test]
    async fn utf8_bom_is_stripped() {
        let doc = DocumentExtractor::new()
            .extract(upload("bom.csv", b"\xEF\xBB\xBFx,y"), FileKind::Csv)
            .await;
        assert_eq!(doc.text, "x,y");
    }

    #[tokio::test]
    async fn invalid_utf8_is_replaced_with_warning() {
        let doc = DocumentExtractor::new()
            .extract(upload("latin1.txt", b"caf\xE9"), FileKind::Txt)
            .await;
        assert_eq!(doc.text, "caf\u{FFFD}");
        assert_eq!(doc.warnings.len(), 1);
    }

    #[tokio::test]
    async fn malformed_pdf_produces_empty_document_not_error() {
        let doc = DocumentExtractor::new()
            .extract(upload("broken.pdf", b"%PDF-1.7 garbage"), FileKind::Pdf)
            .await;
        assert_eq!(doc.kind, FileKind::Pdf);
        assert!(!doc.has_text());
        assert!(!doc.warnings.is_empty());
    }

    #[tokio::test]
    async fn extract_all_preserves_order() {
        let files = vec![upload("b.txt", b"second"), upload("a.md", b"first")];
        let docs = DocumentExtractor::new()
            .extract_all(files, vec![FileKind::Txt, FileKind::Md])
            .await;
        let names: Vec<_> = docs.iter().map(|d| d.file_name.as_str()).collect();
        assert_eq!(names, ["b.txt", "a.md"]);
    }
}
