//! File category stored in the `file_type` column.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Coarse category used for icons and filtering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FileType {
    /// A folder row.
    Folder,
    /// Raster or vector image.
    Image,
    /// Video.
    Video,
    /// Audio.
    Audio,
    /// Text, office, or PDF document.
    Document,
    /// Compressed archive.
    Archive,
    /// Anything else.
    Other,
}

impl FileType {
    /// The stored representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Folder => "folder",
            Self::Image => "image",
            Self::Video => "video",
            Self::Audio => "audio",
            Self::Document => "document",
            Self::Archive => "archive",
            Self::Other => "other",
        }
    }

    /// Parse a stored value. Unknown values map to [`FileType::Other`].
    pub fn parse(s: &str) -> Self {
        match s {
            "folder" => Self::Folder,
            "image" => Self::Image,
            "video" => Self::Video,
            "audio" => Self::Audio,
            "document" => Self::Document,
            "archive" => Self::Archive,
            _ => Self::Other,
        }
    }

    /// Categorize by MIME type, falling back to the file name.
    pub fn detect(name: &str, mime_type: Option<&str>) -> Self {
        let guessed;
        let mime = match mime_type {
            Some(m) => m,
            None => {
                guessed = mime_guess::from_path(name).first_raw();
                guessed.unwrap_or("application/octet-stream")
            }
        };

        if mime.starts_with("image/") {
            Self::Image
        } else if mime.starts_with("video/") {
            Self::Video
        } else if mime.starts_with("audio/") {
            Self::Audio
        } else if mime.starts_with("text/")
            || mime == "application/pdf"
            || mime == "application/json"
            || mime == "application/rtf"
            || mime.starts_with("application/msword")
            || mime.starts_with("application/vnd.ms-")
            || mime.starts_with("application/vnd.openxmlformats-officedocument")
            || mime.starts_with("application/vnd.oasis.opendocument")
        {
            Self::Document
        } else if matches!(
            mime,
            "application/zip"
                | "application/gzip"
                | "application/x-tar"
                | "application/x-7z-compressed"
                | "application/x-rar-compressed"
                | "application/vnd.rar"
                | "application/x-bzip2"
        ) {
            Self::Archive
        } else {
            Self::Other
        }
    }
}

impl fmt::Display for FileType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detect_by_mime() {
        assert_eq!(FileType::detect("x", Some("image/png")), FileType::Image);
        assert_eq!(FileType::detect("x", Some("video/mp4")), FileType::Video);
        assert_eq!(FileType::detect("x", Some("application/pdf")), FileType::Document);
    }

    #[test]
    fn test_detect_by_name() {
        assert_eq!(FileType::detect("photo.JPG", None), FileType::Image);
        assert_eq!(FileType::detect("song.mp3", None), FileType::Audio);
        assert_eq!(FileType::detect("backup.zip", None), FileType::Archive);
        assert_eq!(FileType::detect("notes.txt", None), FileType::Document);
        assert_eq!(FileType::detect("blob", None), FileType::Other);
    }

    #[test]
    fn test_parse_round_trip_names() {
        for ft in [FileType::Folder, FileType::Image, FileType::Archive, FileType::Other] {
            assert_eq!(FileType::parse(ft.as_str()), ft);
        }
    }
}
