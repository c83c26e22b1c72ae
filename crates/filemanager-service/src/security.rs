//! Upload validation and name sanitization.

use percent_encoding::percent_decode_str;

use filemanager_core::config::security::FileSecurityConfig;
use filemanager_core::error::AppError;
use filemanager_core::result::AppResult;
use filemanager_core::types::UploadedFile;
use filemanager_core::types::upload::split_extension;

/// Leading bytes of executables and scripts that are refused regardless of
/// the declared type.
const EXECUTABLE_SIGNATURES: &[&[u8]] = &[b"MZ", b"\x7fELF", b"#!", b"\xca\xfe\xba\xbe"];

/// How far into an upload to look for an embedded PHP opening tag.
const SNIFF_WINDOW: usize = 1024;

/// Checks uploads and names before they reach a disk or the database.
#[derive(Debug, Clone)]
pub struct FileSecurityService {
    config: FileSecurityConfig,
    max_upload_size: u64,
}

impl FileSecurityService {
    /// Create the service from the security section and the upload cap.
    pub fn new(config: FileSecurityConfig, max_upload_size: u64) -> Self {
        Self {
            config,
            max_upload_size,
        }
    }

    /// Maximum accepted upload size in bytes.
    pub fn max_upload_size(&self) -> u64 {
        self.max_upload_size
    }

    /// Validate an upload's size, extension, type, and leading bytes.
    pub fn validate_upload(&self, file: &UploadedFile) -> AppResult<()> {
        if file.data.is_empty() {
            return Err(AppError::validation("The uploaded file is empty."));
        }
        if file.size() > self.max_upload_size {
            return Err(AppError::validation(format!(
                "The file exceeds the maximum upload size of {}.",
                human_size(self.max_upload_size)
            )));
        }

        if let Some(ext) = self.blocked_extension(&file.original_name) {
            return Err(AppError::validation(format!(
                "Files of type .{ext} are not allowed."
            )));
        }

        if !self.config.allowed_mime_prefixes.is_empty() {
            let mime = file
                .mime_type
                .clone()
                .or_else(|| {
                    mime_guess::from_path(&file.original_name)
                        .first_raw()
                        .map(str::to_string)
                })
                .unwrap_or_else(|| "application/octet-stream".to_string());
            let allowed = self
                .config
                .allowed_mime_prefixes
                .iter()
                .any(|prefix| mime.starts_with(prefix.as_str()));
            if !allowed {
                return Err(AppError::validation(format!(
                    "Files of type {mime} are not allowed."
                )));
            }
        }

        if self.config.sniff_content && looks_executable(&file.data) {
            return Err(AppError::validation(
                "The file content is not allowed for upload.",
            ));
        }

        Ok(())
    }

    /// Reduce a client-supplied file name to a safe single path segment.
    pub fn sanitize_name(&self, name: &str) -> AppResult<String> {
        let base = name.rsplit(['/', '\\']).next().unwrap_or_default();
        let printable: String = base.chars().filter(|c| !c.is_control()).collect();
        let collapsed = printable.split_whitespace().collect::<Vec<_>>().join(" ");
        let stripped = collapsed.trim_start_matches(['.', ' ']).trim_end();

        if stripped.is_empty() {
            return Err(AppError::validation("The file name is not valid."));
        }
        if has_escape_sequence(stripped) {
            return Err(AppError::validation(
                "File names cannot contain percent-encoded sequences.",
            ));
        }
        Ok(truncate_name(stripped, self.config.max_name_length))
    }

    /// Validate a folder name or rename target. Returns the trimmed name.
    pub fn validate_name(&self, name: &str) -> AppResult<String> {
        let name = name.trim();
        if name.is_empty() {
            return Err(AppError::validation("A name is required."));
        }
        if name.chars().all(|c| c == '.') {
            return Err(AppError::validation(format!(
                "\"{name}\" is not a valid name."
            )));
        }
        if name.contains(['/', '\\']) {
            return Err(AppError::validation("Names cannot contain slashes."));
        }
        if name.chars().any(char::is_control) {
            return Err(AppError::validation(
                "Names cannot contain control characters.",
            ));
        }
        if has_escape_sequence(name) {
            return Err(AppError::validation(
                "Names cannot contain percent-encoded sequences.",
            ));
        }
        if name.chars().count() > self.config.max_name_length {
            return Err(AppError::validation(format!(
                "Names cannot be longer than {} characters.",
                self.config.max_name_length
            )));
        }
        Ok(name.to_string())
    }

    /// First blocked extension anywhere in the name, so that
    /// `shell.php.jpg` is caught as well as `shell.php`.
    fn blocked_extension(&self, name: &str) -> Option<String> {
        name.split('.')
            .skip(1)
            .map(str::to_ascii_lowercase)
            .find(|ext| {
                self.config
                    .blocked_extensions
                    .iter()
                    .any(|blocked| blocked.eq_ignore_ascii_case(ext))
            })
    }
}

fn looks_executable(data: &[u8]) -> bool {
    if EXECUTABLE_SIGNATURES.iter().any(|sig| data.starts_with(sig)) {
        return true;
    }
    let window = &data[..data.len().min(SNIFF_WINDOW)];
    window
        .windows(5)
        .any(|w| w.eq_ignore_ascii_case(b"<?php"))
}

/// Cut a name to `max` characters, keeping the extension intact.
fn truncate_name(name: &str, max: usize) -> String {
    if name.chars().count() <= max {
        return name.to_string();
    }
    match split_extension(name) {
        (stem, Some(ext)) if ext.chars().count() + 1 < max => {
            let keep = max - ext.chars().count() - 1;
            let stem: String = stem.chars().take(keep).collect();
            format!("{stem}.{ext}")
        }
        _ => name.chars().take(max).collect(),
    }
}

fn human_size(bytes: u64) -> String {
    const MB: u64 = 1024 * 1024;
    const KB: u64 = 1024;
    if bytes >= MB && bytes % MB == 0 {
        format!("{} MB", bytes / MB)
    } else if bytes >= KB && bytes % KB == 0 {
        format!("{} KB", bytes / KB)
    } else {
        format!("{bytes} bytes")
    }
}

/// Whether the name would change when an identifier built from it is
/// percent-decoded on the way back in.
fn has_escape_sequence(name: &str) -> bool {
    name.contains('%') && percent_decode_str(name).decode_utf8_lossy() != name
}
