use tracing::{debug, warn};

use crate::config::{Config, ALLOWED_EXTENSIONS};
use crate::error::{AppError, AppResult};
use crate::models::{FileKind, UploadedFile};

/// Checks uploads against the extension allow-list and the byte ceilings.
#[derive(Debug, Clone, Copy)]
pub struct FileIntake {
    max_file_bytes: usize,
    max_total_bytes: usize,
}

impl FileIntake {
    pub fn new(max_file_bytes: usize, max_total_bytes: usize) -> Self {
        Self {
            max_file_bytes,
            max_total_bytes,
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(config.max_file_size_bytes(), config.max_total_upload_bytes())
    }

    pub fn max_total_bytes(&self) -> usize {
        self.max_total_bytes
    }

    pub fn validate_file(&self, file: &UploadedFile) -> AppResult<FileKind> {
        let kind = match file.kind() {
            Some(kind) if ALLOWED_EXTENSIONS.contains(&file.extension.as_str()) => kind,
            _ => {
                warn!(file_name = %file.name, extension = %file.extension, "Rejected file type");
                return Err(AppError::UnsupportedFileType {
                    file_name: file.name.clone(),
                    extension: if file.extension.is_empty() {
                        "(none)".to_string()
                    } else {
                        file.extension.clone()
                    },
                });
            }
        };

        if file.size == 0 {
            return Err(AppError::InvalidFile {
                message: format!("{} is empty", file.name),
            });
        }

        if file.size > self.max_file_bytes {
            warn!(
                file_name = %file.name,
                file_size = file.size,
                max_size = self.max_file_bytes,
                "File size exceeds limit"
            );
            return Err(AppError::FileTooLarge {
                file_name: file.name.clone(),
                size: file.size,
                limit: self.max_file_bytes,
            });
        }

        debug!(file_name = %file.name, kind = %kind, file_size = file.size, "File accepted");
        Ok(kind)
    }

    /// Validates every file, then the combined size.
    pub fn validate_all(&self, files: &[UploadedFile]) -> AppResult<Vec<FileKind>> {
        let kinds = files
            .iter()
            .map(|file| self.validate_file(file))
            .collect::<AppResult<Vec<_>>>()?;

        let total: usize = files.iter().map(|f| f.size).sum();
        if total > self.max_total_bytes {
            warn!(
                total_size = total,
                max_total = self.max_total_bytes,
                files = files.len(),
                "Upload exceeds aggregate limit"
            );
            return Err(AppError::UploadTooLarge {
                limit: self.max_total_bytes,
            });
        }

        Ok(kinds)
    }
}
