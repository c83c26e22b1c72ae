//! Uploaded file handle.

use std::path::Path;

use bytes::Bytes;

use crate::error::{AppError, ErrorKind};
use crate::result::AppResult;

/// A file received from a client, held in memory until stored.
#[derive(Debug, Clone)]
pub struct UploadedFile {
    /// The name the client sent.
    pub original_name: String,
    /// MIME type declared by the client.
    pub mime_type: Option<String>,
    /// File contents.
    pub data: Bytes,
    /// Media duration in seconds, when the caller probed it.
    pub duration_seconds: Option<i64>,
}

impl UploadedFile {
    /// Create an upload from in-memory bytes.
    pub fn new(original_name: impl Into<String>, data: impl Into<Bytes>) -> Self {
        Self {
            original_name: original_name.into(),
            mime_type: None,
            data: data.into(),
            duration_seconds: None,
        }
    }

    /// Attach a client-declared MIME type.
    pub fn with_mime_type(mut self, mime_type: impl Into<String>) -> Self {
        self.mime_type = Some(mime_type.into());
        self
    }

    /// Attach a probed media duration.
    pub fn with_duration(mut self, seconds: i64) -> Self {
        self.duration_seconds = Some(seconds);
        self
    }

    /// Read an upload from a local file.
    pub async fn from_path(path: impl AsRef<Path>) -> AppResult<Self> {
        let path = path.as_ref();
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .ok_or_else(|| AppError::validation("Upload path has no file name"))?;
        let data = tokio::fs::read(path).await.map_err(|e| {
            AppError::with_source(
                ErrorKind::Storage,
                format!("Failed to read upload: {}", path.display()),
                e,
            )
        })?;
        Ok(Self::new(name, data))
    }

    /// Size of the upload in bytes.
    pub fn size(&self) -> u64 {
        self.data.len() as u64
    }

    /// Lowercased extension of the original name, if any.
    pub fn extension(&self) -> Option<String> {
        split_extension(&self.original_name).1.map(|e| e.to_lowercase())
    }
}

/// Split a file name into stem and extension. Leading-dot names such as
/// `.env` have no extension.
pub fn split_extension(name: &str) -> (&str, Option<&str>) {
    match name.rfind('.') {
        Some(idx) if idx > 0 && idx + 1 < name.len() => (&name[..idx], Some(&name[idx + 1..])),
        _ => (name, None),
    }
}

/// Insert `_suffix` before the extension: `doc.pdf` becomes `doc_123.pdf`.
pub fn with_name_suffix(name: &str, suffix: &str) -> String {
    match split_extension(name) {
        (stem, Some(ext)) => format!("{stem}_{suffix}.{ext}"),
        (stem, None) => format!("{stem}_{suffix}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_extension() {
        assert_eq!(split_extension("doc.pdf"), ("doc", Some("pdf")));
        assert_eq!(split_extension("archive.tar.gz"), ("archive.tar", Some("gz")));
        assert_eq!(split_extension(".env"), (".env", None));
        assert_eq!(split_extension("README"), ("README", None));
        assert_eq!(split_extension("trailing."), ("trailing.", None));
    }

    #[test]
    fn test_with_name_suffix() {
        assert_eq!(with_name_suffix("doc.pdf", "1700000000"), "doc_1700000000.pdf");
        assert_eq!(with_name_suffix("Makefile", "42"), "Makefile_42");
    }

    #[tokio::test]
    async fn test_from_path_reads_bytes() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("note.txt");
        tokio::fs::write(&file, b"hello").await.unwrap();

        let upload = UploadedFile::from_path(&file).await.unwrap();
        assert_eq!(upload.original_name, "note.txt");
        assert_eq!(upload.size(), 5);
        assert_eq!(upload.extension().as_deref(), Some("txt"));
    }
}
