//! Unit tests for individual components

use axum::http::StatusCode;
use docchat::{
    config::{Config, LogFormat},
    error::{AppError, GENERIC_UPSTREAM_MESSAGE},
    models::{ChatMessage, DocumentMetadata, ExtractedDocument, FileKind, UploadResponse, UploadedFile},
    services::{DocumentExtractor, FileIntake, LlmError, PdfProcessor, PromptAssembler},
};
use std::env;

#[test]
fn test_config_from_env() {
    env::set_var("SERVER_PORT", "8080");
    env::set_var("MAX_FILE_SIZE_MB", "5");
    env::set_var("MAX_TOTAL_UPLOAD_MB", "15");
    env::set_var("MAX_CONTEXT_WORDS", "not-a-number");
    env::set_var("OPENROUTER_API_KEY", "  sk-or-test-key-1234567890  ");
    env::set_var("OPENROUTER_BASE_URL", "http://localhost:9999/api/");
    env::set_var("INCLUDE_PREAMBLE", "false");
    env::set_var("LOG_FORMAT", "json");

    let config = Config::from_env().unwrap();
    assert_eq!(config.server_port, 8080);
    assert_eq!(config.max_file_size_mb, 5);
    assert_eq!(config.max_total_upload_mb, 15);
    // Unparseable values fall back to the default.
    assert_eq!(config.max_context_words, 10_000);
    assert_eq!(config.openrouter_api_key.as_deref(), Some("sk-or-test-key-1234567890"));
    assert_eq!(config.openrouter_base_url, "http://localhost:9999/api");
    assert!(!config.include_preamble);
    assert_eq!(LogFormat::from_env(), LogFormat::Json);
    assert!(config.is_api_key_configured());

    for var in [
        "SERVER_PORT",
        "MAX_FILE_SIZE_MB",
        "MAX_TOTAL_UPLOAD_MB",
        "MAX_CONTEXT_WORDS",
        "OPENROUTER_API_KEY",
        "OPENROUTER_BASE_URL",
        "INCLUDE_PREAMBLE",
        "LOG_FORMAT",
    ] {
        env::remove_var(var);
    }
    assert_eq!(LogFormat::from_env(), LogFormat::Pretty);
}

#[test]
fn test_error_codes() {
    let unsupported = AppError::UnsupportedFileType {
        file_name: "a.exe".to_string(),
        extension: ".exe".to_string(),
    };
    assert_eq!(unsupported.error_code(), "UNSUPPORTED_FILE_TYPE");
    assert_eq!(
        AppError::FileTooLarge { file_name: "a.pdf".to_string(), size: 20, limit: 10 }.error_code(),
        "FILE_TOO_LARGE"
    );
    assert_eq!(AppError::UploadTooLarge { limit: 10 }.error_code(), "UPLOAD_TOO_LARGE");
    assert_eq!(AppError::EmptyRequest.error_code(), "EMPTY_REQUEST");
    assert_eq!(AppError::UnknownModel { model: "x".to_string() }.error_code(), "UNKNOWN_MODEL");
    assert_eq!(AppError::Timeout.error_code(), "REQUEST_TIMEOUT");
}

#[test]
fn test_error_status_codes() {
    let unsupported = AppError::UnsupportedFileType {
        file_name: "a.exe".to_string(),
        extension: ".exe".to_string(),
    };
    assert_eq!(unsupported.status_code(), StatusCode::UNSUPPORTED_MEDIA_TYPE);
    assert_eq!(AppError::UploadTooLarge { limit: 10 }.status_code(), StatusCode::PAYLOAD_TOO_LARGE);
    assert_eq!(AppError::MissingFile.status_code(), StatusCode::BAD_REQUEST);
    assert_eq!(
        AppError::UpstreamError { message: "boom".to_string() }.status_code(),
        StatusCode::BAD_GATEWAY
    );
    assert_eq!(AppError::Timeout.status_code(), StatusCode::GATEWAY_TIMEOUT);
}

#[test]
fn test_upstream_errors_hide_provider_details() {
    let upstream = AppError::from(LlmError::Api {
        status: 401,
        message: "No auth credentials found".to_string(),
    });
    assert_eq!(upstream.error_code(), "UPSTREAM_ERROR");
    assert_eq!(upstream.user_message(), GENERIC_UPSTREAM_MESSAGE);
    assert!(upstream.to_string().contains("No auth credentials found"));

    let timeout = AppError::from(LlmError::Timeout);
    assert!(matches!(timeout, AppError::Timeout));
    assert_eq!(timeout.user_message(), GENERIC_UPSTREAM_MESSAGE);

    let local = AppError::UnknownModel { model: "x/y".to_string() };
    assert_eq!(local.user_message(), "Unknown model: x/y");
}

#[test]
fn test_error_conversions() {
    let io_error = std::io::Error::new(std::io::ErrorKind::NotFound, "File not found");
    match AppError::from(io_error) {
        AppError::Internal { message } => assert!(message.contains("File not found")),
        _ => panic!("Expected Internal error"),
    }

    let json_error = serde_json::from_str::<serde_json::Value>("invalid json").unwrap_err();
    match AppError::from(json_error) {
        AppError::ValidationError { message } => assert!(message.contains("JSON parsing error")),
        _ => panic!("Expected ValidationError"),
    }

    let anyhow_error = anyhow::anyhow!("Something went wrong");
    match AppError::from(anyhow_error) {
        AppError::Internal { message } => assert_eq!(message, "Something went wrong"),
        _ => panic!("Expected Internal error"),
    }
}

#[test]
fn test_document_metadata_creation() {
    let metadata = DocumentMetadata::new(1024)
        .with_pages(3)
        .with_title(Some("Quarterly Report".to_string()))
        .with_author(None);

    assert_eq!(metadata.file_size_bytes, 1024);
    assert_eq!(metadata.pages, Some(3));
    assert_eq!(metadata.title.as_deref(), Some("Quarterly Report"));
    assert!(metadata.author.is_none());
}

#[test]
fn test_upload_response_creation() {
    let docs = vec![ExtractedDocument::new(
        "notes.md".to_string(),
        FileKind::Md,
        "# Title\nsome body text".to_string(),
        DocumentMetadata::new(22),
    )
    .with_warning("sample warning")];

    let response = UploadResponse::new(&docs, 12);
    let json = serde_json::to_value(&response).unwrap();
    assert_eq!(json["success"], true);
    assert_eq!(json["processing_time_ms"], 12);
    assert_eq!(json["data"]["documents"][0]["kind"], "md");
    assert_eq!(json["data"]["documents"][0]["words"], 5);
    assert_eq!(json["data"]["documents"][0]["warnings"][0], "sample warning");
}

#[test]
fn test_file_size_validation() {
    let intake = FileIntake::new(10, 15);

    let ok = UploadedFile::new("a.txt".to_string(), vec![b'a'; 10]);
    assert_eq!(intake.validate_file(&ok).unwrap(), FileKind::Txt);

    let big = UploadedFile::new("b.txt".to_string(), vec![b'a'; 11]);
    assert!(matches!(
        intake.validate_file(&big),
        Err(AppError::FileTooLarge { size: 11, limit: 10, .. })
    ));

    let pair = vec![ok.clone(), UploadedFile::new("c.csv".to_string(), vec![b'a'; 6])];
    assert!(matches!(intake.validate_all(&pair), Err(AppError::UploadTooLarge { limit: 15 })));

    let no_extension = UploadedFile::new("README".to_string(), b"hello".to_vec());
    match intake.validate_file(&no_extension) {
        Err(AppError::UnsupportedFileType { extension, .. }) => assert_eq!(extension, "(none)"),
        other => panic!("Expected UnsupportedFileType, got {:?}", other),
    }
}

#[test]
fn test_pdf_processor_handles_garbage() {
    let extraction = PdfProcessor::default().extract(b"definitely not a pdf");
    assert!(extraction.text.is_empty());
    assert!(extraction.pages.is_none());
    assert!(!extraction.warnings.is_empty());
}

#[tokio::test]
async fn test_extract_then_assemble() {
    let files = vec![
        UploadedFile::new("a.txt".to_string(), b"one two three four".to_vec()),
        UploadedFile::new("b.json".to_string(), br#"{"k": "v"}"#.to_vec()),
    ];
    let kinds = FileIntake::new(1024, 2048).validate_all(&files).unwrap();
    let docs = DocumentExtractor::new().extract_all(files, kinds).await;
    assert_eq!(docs.len(), 2);

    let messages = PromptAssembler::new(3, false).assemble("summarize", &docs).unwrap();
    assert_eq!(
        messages,
        vec![ChatMessage::user(
            "[DOCUMENT: a.txt]\none two three\n\n[TRUNCATED - showing first 3 words]\n\n\n\
             [DOCUMENT: b.json]\n[OMITTED - context limit reached]\n\n\nsummarize"
        )]
    );
}
