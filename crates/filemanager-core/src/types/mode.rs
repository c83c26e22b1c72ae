//! Adapter mode selection.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::AppError;

/// Which backend an adapter operates on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AdapterMode {
    /// Metadata rows in a database, bytes on a disk.
    Database,
    /// Paths on a disk, no metadata store.
    Storage,
}

impl AdapterMode {
    /// The mode name as used in configuration.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Database => "database",
            Self::Storage => "storage",
        }
    }
}

impl fmt::Display for AdapterMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AdapterMode {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "database" => Ok(Self::Database),
            "storage" => Ok(Self::Storage),
            other => Err(AppError::configuration(format!(
                "Unknown file manager mode '{other}'. Expected 'database' or 'storage'."
            ))),
        }
    }
}
