//! Disk driver implementations.

pub mod local;
pub mod memory;

pub use local::LocalDisk;
pub use memory::MemoryDisk;

/// Reject raw `..` segments at the driver boundary.
pub(crate) fn check_segments(path: &str) -> filemanager_core::AppResult<()> {
    if path.split(['/', '\\']).any(|s| s == "..") {
        return Err(filemanager_core::AppError::path_traversal(format!(
            "Refusing disk path with parent segments: {path}"
        )));
    }
    Ok(())
}

/// Join a directory and an entry name into a disk path.
pub(crate) fn child_path(dir: &str, name: &str) -> String {
    let dir = dir.trim_matches('/');
    if dir.is_empty() {
        name.to_string()
    } else {
        format!("{dir}/{name}")
    }
}

/// Guess a MIME type from a path.
pub(crate) fn mime_from_path(path: &str) -> Option<String> {
    mime_guess::from_path(path).first_raw().map(str::to_string)
}
