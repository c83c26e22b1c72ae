//! Upload validation and URL generation configuration.

use serde::{Deserialize, Serialize};

/// Upload validation rules.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileSecurityConfig {
    /// Extensions that may never be uploaded, compared case-insensitively.
    #[serde(default = "default_blocked_extensions")]
    pub blocked_extensions: Vec<String>,
    /// MIME prefixes accepted for uploads. Empty means any type.
    #[serde(default)]
    pub allowed_mime_prefixes: Vec<String>,
    /// Longest file or folder name accepted, in characters.
    #[serde(default = "default_max_name_length")]
    pub max_name_length: usize,
    /// Whether upload bytes are inspected for executable signatures.
    #[serde(default = "default_true")]
    pub sniff_content: bool,
}

impl Default for FileSecurityConfig {
    fn default() -> Self {
        Self {
            blocked_extensions: default_blocked_extensions(),
            allowed_mime_prefixes: Vec::new(),
            max_name_length: default_max_name_length(),
            sniff_content: true,
        }
    }
}

/// URL generation strategy.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UrlConfig {
    /// `"auto"`, `"temporary"`, `"public"`, or `"route"`.
    #[serde(default = "default_strategy")]
    pub strategy: String,
    /// Lifetime of temporary URLs in seconds.
    #[serde(default = "default_ttl")]
    pub temporary_ttl_seconds: u64,
    /// Prefix of the application route that streams files.
    #[serde(default = "default_route_prefix")]
    pub route_prefix: String,
}

impl Default for UrlConfig {
    fn default() -> Self {
        Self {
            strategy: default_strategy(),
            temporary_ttl_seconds: default_ttl(),
            route_prefix: default_route_prefix(),
        }
    }
}

fn default_blocked_extensions() -> Vec<String> {
    [
        "php", "php3", "php4", "php5", "phtml", "phar", "exe", "msi", "sh", "bash", "bat",
        "cmd", "com", "cgi", "pl", "py", "jsp", "asp", "aspx", "htaccess", "dll", "scr", "vbs",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}

fn default_max_name_length() -> usize {
    255
}

fn default_true() -> bool {
    true
}

fn default_strategy() -> String {
    "auto".to_string()
}

fn default_ttl() -> u64 {
    3600
}

fn default_route_prefix() -> String {
    "/filemanager/files".to_string()
}
