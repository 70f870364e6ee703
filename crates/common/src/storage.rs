//! File storage for uploaded PDFs and profile photos.
//!
//! Keys are relative paths such as `pdf/<id>-paper.pdf`. Each upload gets a
//! fresh ID prefix so two files with the same original name never collide.

use std::path::PathBuf;

use tracing::debug;

use crate::config::StorageConfig;
use crate::{AppError, AppResult, IdGenerator};

/// Directory prefix for publication PDFs.
pub const PDF_PREFIX: &str = "pdf";

/// Directory prefix for profile photos.
pub const PHOTO_PREFIX: &str = "profils";

/// A file received in a request, not yet stored.
#[derive(Debug, Clone)]
pub struct IncomingFile {
    /// Filename as sent by the client.
    pub file_name: String,
    pub content_type: String,
    pub data: Vec<u8>,
}

/// Storage backend trait.
#[async_trait::async_trait]
pub trait StorageBackend: Send + Sync {
    /// Store `data` under `key`, replacing any previous file.
    async fn upload(&self, key: &str, data: &[u8], content_type: &str) -> AppResult<()>;

    /// Read the file stored under `key`, or `None` when it does not exist.
    async fn read(&self, key: &str) -> AppResult<Option<Vec<u8>>>;

    /// Delete a file. Missing files are ignored.
    async fn delete(&self, key: &str) -> AppResult<()>;
}

/// Local filesystem storage backend.
pub struct LocalStorage {
    base_path: PathBuf,
}

impl LocalStorage {
    /// Create a new local storage backend.
    #[must_use]
    pub const fn new(base_path: PathBuf) -> Self {
        Self { base_path }
    }

    /// Create a local storage backend from configuration.
    #[must_use]
    pub fn from_config(config: &StorageConfig) -> Self {
        Self::new(config.base_path.clone())
    }

    fn path_for(&self, key: &str) -> AppResult<PathBuf> {
        if key.split('/').any(|part| part == ".." || part.is_empty()) {
            return Err(AppError::BadRequest(format!("Invalid storage key: {key}")));
        }
        Ok(self.base_path.join(key))
    }
}

#[async_trait::async_trait]
impl StorageBackend for LocalStorage {
    async fn upload(&self, key: &str, data: &[u8], content_type: &str) -> AppResult<()> {
        let path = self.path_for(key)?;

        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| AppError::Storage(format!("Failed to create directory: {e}")))?;
        }

        tokio::fs::write(&path, data)
            .await
            .map_err(|e| AppError::Storage(format!("Failed to write file: {e}")))?;

        debug!(key, size = data.len(), content_type, "File stored");
        Ok(())
    }

    async fn read(&self, key: &str) -> AppResult<Option<Vec<u8>>> {
        let path = self.path_for(key)?;
        match tokio::fs::read(&path).await {
            Ok(data) => Ok(Some(data)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(AppError::Storage(format!("Failed to read file: {e}"))),
        }
    }

    async fn delete(&self, key: &str) -> AppResult<()> {
        let path = self.path_for(key)?;
        match tokio::fs::remove_file(&path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(AppError::Storage(format!("Failed to delete file: {e}"))),
        }
    }
}

/// Whether `filename` carries a `.pdf` extension, in any case.
#[must_use]
pub fn has_pdf_extension(filename: &str) -> bool {
    filename.to_lowercase().ends_with(".pdf")
}

/// Reduce an uploaded filename to a safe single path component.
///
/// Directory parts are dropped and anything outside `[A-Za-z0-9._-]`
/// becomes `_`.
#[must_use]
pub fn sanitize_filename(original_name: &str) -> String {
    let base = original_name
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or(original_name);

    let cleaned: String = base
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-') {
                c
            } else {
                '_'
            }
        })
        .collect();

    let cleaned = cleaned.trim_start_matches('.');
    if cleaned.is_empty() {
        "file".to_string()
    } else {
        cleaned.to_string()
    }
}

/// Build a unique storage key under `prefix` for an uploaded file.
#[must_use]
pub fn storage_key(prefix: &str, original_name: &str) -> String {
    let id = IdGenerator::new().generate();
    format!("{prefix}/{id}-{}", sanitize_filename(original_name))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn temp_storage() -> (LocalStorage, PathBuf) {
        let dir = std::env::temp_dir().join(format!("noxa-storage-{}", IdGenerator::new().generate()));
        (LocalStorage::new(dir.clone()), dir)
    }

    #[test]
    fn test_has_pdf_extension() {
        assert!(has_pdf_extension("paper.pdf"));
        assert!(has_pdf_extension("PAPER.PDF"));
        assert!(has_pdf_extension("thesis.final.Pdf"));
        assert!(!has_pdf_extension("paper.docx"));
        assert!(!has_pdf_extension("pdf"));
    }

    #[test]
    fn test_sanitize_filename() {
        assert_eq!(sanitize_filename("my paper (v2).pdf"), "my_paper__v2_.pdf");
        assert_eq!(sanitize_filename("../../etc/passwd"), "passwd");
        assert_eq!(sanitize_filename("C:\\docs\\report.pdf"), "report.pdf");
        assert_eq!(sanitize_filename(".hidden"), "hidden");
        assert_eq!(sanitize_filename(""), "file");
    }

    #[test]
    fn test_storage_keys_are_unique_for_same_name() {
        let a = storage_key(PDF_PREFIX, "paper.pdf");
        let b = storage_key(PDF_PREFIX, "paper.pdf");
        assert_ne!(a, b);
        assert!(a.starts_with("pdf/"));
        assert!(a.ends_with("-paper.pdf"));
    }

    #[tokio::test]
    async fn test_local_storage_round_trip() {
        let (storage, dir) = temp_storage();
        let key = storage_key(PDF_PREFIX, "paper.pdf");

        storage
            .upload(&key, b"%PDF-1.4", "application/pdf")
            .await
            .unwrap();
        assert!(dir.join(&key).is_file());
        assert_eq!(storage.read(&key).await.unwrap().unwrap(), b"%PDF-1.4");

        storage.delete(&key).await.unwrap();
        assert!(storage.read(&key).await.unwrap().is_none());
        // deleting twice is fine
        storage.delete(&key).await.unwrap();

        let _ = tokio::fs::remove_dir_all(dir).await;
    }

    #[tokio::test]
    async fn test_rejects_traversal_keys() {
        let (storage, _dir) = temp_storage();
        assert!(storage.read("pdf/../../secret").await.is_err());
    }
}
