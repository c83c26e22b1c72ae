//! Disk (blob store) configuration.

use serde::{Deserialize, Serialize};

/// One named disk.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DiskConfig {
    /// Driver name: `"local"` or `"memory"`.
    #[serde(default = "default_driver")]
    pub driver: String,
    /// Filesystem directory backing a local disk.
    #[serde(default = "default_root")]
    pub root: String,
    /// Public base URL files on this disk are served from.
    #[serde(default)]
    pub url: Option<String>,
    /// Key used to sign temporary URLs. Local disks only offer temporary
    /// URLs when this is set.
    #[serde(default)]
    pub signing_key: Option<String>,
}

impl Default for DiskConfig {
    fn default() -> Self {
        Self {
            driver: default_driver(),
            root: default_root(),
            url: None,
            signing_key: None,
        }
    }
}

fn default_driver() -> String {
    "local".to_string()
}

fn default_root() -> String {
    "./data/storage".to_string()
}
