//! Path resolution for the storage adapter.
//!
//! Every user-supplied path goes through [`PathResolver::normalize`] before
//! it reaches a disk. No path returned from here resolves outside the
//! configured root.

use percent_encoding::percent_decode_str;
use tracing::warn;

use filemanager_core::error::AppError;
use filemanager_core::result::AppResult;
use filemanager_core::types::RequestContext;

/// Confines user paths to a root directory on one disk.
#[derive(Debug, Clone)]
pub struct PathResolver {
    root: String,
    disk: String,
    context: RequestContext,
}

impl PathResolver {
    /// Create a resolver for `root` on `disk`.
    ///
    /// The root itself is cleaned the same way user paths are; a root that
    /// contains parent segments is a configuration error.
    pub fn new(root: &str, disk: &str) -> AppResult<Self> {
        let decoded = decode(root);
        if decoded.split('/').any(is_parent_segment) {
            return Err(AppError::configuration(format!(
                "Storage root '{root}' must not contain parent segments"
            )));
        }
        Ok(Self {
            root: clean_segments(&decoded),
            disk: disk.to_string(),
            context: RequestContext::default(),
        })
    }

    /// Attach the caller identity used in security events.
    pub fn with_context(mut self, context: RequestContext) -> Self {
        self.context = context;
        self
    }

    /// The cleaned root, without leading or trailing slashes.
    pub fn root(&self) -> &str {
        &self.root
    }

    /// Resolve a user path to a disk path inside the root.
    ///
    /// `None` and empty input resolve to the root itself. Paths that already
    /// start with the root are not prefixed a second time.
    pub fn normalize(&self, user_path: Option<&str>) -> AppResult<String> {
        let raw = user_path.unwrap_or_default();
        let clean = clean_segments(&decode(raw));

        let resolved = if self.root.is_empty() || self.is_within_root(&clean) {
            clean
        } else if clean.is_empty() {
            self.root.clone()
        } else {
            format!("{}/{}", self.root, clean)
        };

        self.ensure_within_root(raw, &resolved)?;
        Ok(resolved)
    }

    /// Disk path of `name` inside the already-resolved directory `parent`.
    pub fn child(&self, parent: &str, name: &str) -> AppResult<String> {
        let path = if parent.is_empty() {
            name.to_string()
        } else {
            format!("{parent}/{name}")
        };
        self.ensure_within_root(&path, &path)?;
        Ok(path)
    }

    /// Whether a cleaned disk path equals the root or lies below it.
    pub fn is_within_root(&self, path: &str) -> bool {
        if self.root.is_empty() {
            return !path.split('/').any(is_parent_segment);
        }
        path == self.root
            || path
                .strip_prefix(self.root.as_str())
                .is_some_and(|rest| rest.starts_with('/'))
    }

    /// Whether `path` is the root itself.
    pub fn is_root(&self, path: &str) -> bool {
        path == self.root
    }

    /// Display path (`/`-prefixed, relative to the root) of a disk path.
    pub fn display_path(&self, path: &str) -> String {
        let relative = if self.root.is_empty() {
            path
        } else {
            path.strip_prefix(self.root.as_str())
                .unwrap_or(path)
                .trim_start_matches('/')
        };
        format!("/{relative}")
    }

    fn ensure_within_root(&self, attempted: &str, resolved: &str) -> AppResult<()> {
        if self.is_within_root(resolved) && !resolved.split('/').any(is_parent_segment) {
            return Ok(());
        }
        warn!(
            target: "filemanager::security",
            attempted_path = %attempted,
            resolved_path = %resolved,
            root = %self.root,
            disk = %self.disk,
            ip = %self.context.ip_label(),
            user = %self.context.user_label(),
            "Path traversal attempt blocked"
        );
        Err(AppError::path_traversal(
            "The requested path is outside the allowed directory.",
        ))
    }
}

/// Whether a name is hidden from default listings.
pub fn is_hidden(name: &str) -> bool {
    name.starts_with('.')
}

/// Trim, URL-decode, strip null bytes, and unify separators.
fn decode(raw: &str) -> String {
    let trimmed = raw.trim().trim_matches(|c: char| c == '/' || c == '\\');
    percent_decode_str(trimmed)
        .decode_utf8_lossy()
        .replace('\0', "")
        .replace('\\', "/")
}

/// Drop empty, `.`, and dot-run segments, then rejoin.
fn clean_segments(path: &str) -> String {
    path.split('/')
        .map(str::trim)
        .filter(|s| !s.is_empty() && *s != "." && !is_parent_segment(s))
        .collect::<Vec<_>>()
        .join("/")
}

/// Matches `^\.{2,}$`.
fn is_parent_segment(segment: &str) -> bool {
    segment.len() >= 2 && segment.chars().all(|c| c == '.')
}

#[cfg(test)]
mod tests {
    use super::*;
    use filemanager_core::error::ErrorKind;

    fn resolver() -> PathResolver {
        PathResolver::new("uploads", "public").unwrap()
    }

    #[test]
    fn test_empty_resolves_to_root() {
        let r = resolver();
        assert_eq!(r.normalize(None).unwrap(), "uploads");
        assert_eq!(r.normalize(Some("")).unwrap(), "uploads");
        assert_eq!(r.normalize(Some("  /  ")).unwrap(), "uploads");
    }

    #[test]
    fn test_prefixes_root_once() {
        let r = resolver();
        assert_eq!(r.normalize(Some("docs/a.txt")).unwrap(), "uploads/docs/a.txt");
        assert_eq!(r.normalize(Some("/uploads/docs")).unwrap(), "uploads/docs");
        assert_eq!(r.normalize(Some("uploads")).unwrap(), "uploads");
        // A sibling that merely shares the prefix is not the root.
        assert_eq!(
            r.normalize(Some("uploads-old/x")).unwrap(),
            "uploads/uploads-old/x"
        );
    }

    #[test]
    fn test_traversal_segments_are_dropped() {
        let r = resolver();
        let cases = [
            "../etc/passwd",
            "docs/../../etc/passwd",
            "..\\..\\windows\\system32",
            "%2e%2e/%2e%2e/etc/passwd",
            "..%2F..%2Fetc",
            "docs/..../secret",
            "./././docs",
            "docs/\0../x",
            "/../../",
        ];
        for case in cases {
            let resolved = r.normalize(Some(case)).unwrap();
            assert!(
                resolved == "uploads" || resolved.starts_with("uploads/"),
                "{case} resolved to {resolved}"
            );
            assert!(!resolved.split('/').any(|s| s == ".."), "{case} -> {resolved}");
        }
        assert_eq!(r.normalize(Some("../etc/passwd")).unwrap(), "uploads/etc/passwd");
    }

    #[test]
    fn test_child_outside_root_is_fault() {
        let r = resolver();
        let err = r.child("uploads", "..").unwrap_err();
        assert_eq!(err.kind, ErrorKind::PathTraversal);
        assert!(err.is_fault());
        assert_eq!(r.child("uploads/docs", "a.txt").unwrap(), "uploads/docs/a.txt");
        assert!(r.child("elsewhere", "a.txt").is_err());
    }

    #[test]
    fn test_root_with_parent_segments_rejected() {
        let err = PathResolver::new("uploads/../..", "public").unwrap_err();
        assert_eq!(err.kind, ErrorKind::Configuration);
    }

    #[test]
    fn test_empty_root() {
        let r = PathResolver::new("", "public").unwrap();
        assert_eq!(r.normalize(None).unwrap(), "");
        assert_eq!(r.normalize(Some("/a/../b")).unwrap(), "a/b");
        assert_eq!(r.display_path("a/b"), "/a/b");
    }

    #[test]
    fn test_display_path() {
        let r = PathResolver::new("/media/uploads/", "public").unwrap();
        assert_eq!(r.root(), "media/uploads");
        assert_eq!(r.display_path("media/uploads"), "/");
        assert_eq!(r.display_path("media/uploads/x/y.png"), "/x/y.png");
    }

    #[test]
    fn test_hidden() {
        assert!(is_hidden(".env"));
        assert!(is_hidden(".thumbnails"));
        assert!(!is_hidden("docs"));
    }
}
