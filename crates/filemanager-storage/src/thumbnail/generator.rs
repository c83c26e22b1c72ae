//! Thumbnail generator for image uploads.

use std::io::Cursor;
use std::sync::Arc;

use bytes::Bytes;

use filemanager_core::error::{AppError, ErrorKind};
use filemanager_core::result::AppResult;
use filemanager_core::traits::disk::Disk;

/// Generates PNG thumbnails and writes them to a disk.
#[derive(Debug, Clone)]
pub struct ThumbnailGenerator {
    /// Disk thumbnails are written to.
    disk: Arc<dyn Disk>,
    /// Directory on the disk that holds thumbnails.
    output_dir: String,
    /// Edge length of the bounding square.
    size: u32,
}

impl ThumbnailGenerator {
    /// Create a new thumbnail generator.
    pub fn new(disk: Arc<dyn Disk>, output_dir: &str, size: u32) -> Self {
        Self {
            disk,
            output_dir: output_dir.trim_matches('/').to_string(),
            size: size.max(1),
        }
    }

    /// Check if a MIME type is a supported image format for thumbnailing.
    pub fn is_supported(mime_type: &str) -> bool {
        matches!(
            mime_type,
            "image/jpeg" | "image/png" | "image/gif" | "image/webp" | "image/bmp"
        )
    }

    /// Generate a thumbnail for image bytes.
    ///
    /// Returns the disk path of the generated thumbnail.
    pub async fn generate(&self, source: Bytes) -> AppResult<String> {
        let size = self.size;
        let thumbnail_bytes = tokio::task::spawn_blocking(move || Self::resize_image(&source, size))
            .await
            .map_err(|e| AppError::with_source(ErrorKind::Internal, "Thumbnail task panicked", e))??;

        let thumb_path = format!("{}/{}.png", self.output_dir, uuid::Uuid::new_v4());
        self.disk.write(&thumb_path, thumbnail_bytes).await?;

        tracing::debug!(size, output = %thumb_path, "Generated thumbnail");

        Ok(thumb_path)
    }

    /// Remove a previously generated thumbnail.
    pub async fn delete(&self, thumb_path: &str) -> AppResult<()> {
        self.disk.delete(thumb_path).await
    }

    /// Decode, shrink to fit the bounding square, and re-encode as PNG.
    fn resize_image(data: &[u8], max_size: u32) -> AppResult<Bytes> {
        if data.is_empty() {
            return Err(AppError::validation("Empty image data"));
        }
        let image = image::load_from_memory(data).map_err(|e| {
            AppError::with_source(ErrorKind::Validation, "Failed to decode image", e)
        })?;
        let thumbnail = image.thumbnail(max_size, max_size);

        let mut out = Vec::new();
        thumbnail
            .write_to(&mut Cursor::new(&mut out), image::ImageFormat::Png)
            .map_err(|e| AppError::with_source(ErrorKind::Internal, "Failed to encode thumbnail", e))?;
        Ok(Bytes::from(out))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::providers::MemoryDisk;

    fn png(width: u32, height: u32) -> Bytes {
        let img = image::RgbImage::from_pixel(width, height, image::Rgb([200, 10, 10]));
        let mut out = Vec::new();
        image::DynamicImage::ImageRgb8(img)
            .write_to(&mut Cursor::new(&mut out), image::ImageFormat::Png)
            .unwrap();
        Bytes::from(out)
    }

    #[tokio::test]
    async fn test_generate_shrinks_image() {
        let disk = Arc::new(MemoryDisk::default());
        let generator = ThumbnailGenerator::new(disk.clone(), "/thumbs/", 32);

        let path = generator.generate(png(200, 100)).await.unwrap();
        assert!(path.starts_with("thumbs/"));

        let written = disk.read_bytes(&path).await.unwrap();
        let decoded = image::load_from_memory(&written).unwrap();
        assert_eq!(decoded.width(), 32);
        assert_eq!(decoded.height(), 16);

        generator.delete(&path).await.unwrap();
        assert!(!disk.exists(&path).await.unwrap());
    }

    #[tokio::test]
    async fn test_garbage_is_rejected() {
        let disk = Arc::new(MemoryDisk::default());
        let generator = ThumbnailGenerator::new(disk, "thumbs", 32);
        let err = generator
            .generate(Bytes::from_static(b"not an image"))
            .await
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::Validation);
    }

    #[test]
    fn test_supported_types() {
        assert!(ThumbnailGenerator::is_supported("image/png"));
        assert!(!ThumbnailGenerator::is_supported("image/svg+xml"));
        assert!(!ThumbnailGenerator::is_supported("application/pdf"));
    }
}
