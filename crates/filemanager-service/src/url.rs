//! URL generation strategy selection.

use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, utf8_percent_encode};
use tracing::warn;

use filemanager_core::config::security::UrlConfig;
use filemanager_core::error::AppError;
use filemanager_core::result::AppResult;
use filemanager_core::traits::disk::Disk;

const ROUTE_ID: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'~');

/// How file URLs are produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UrlStrategy {
    /// Temporary when the disk signs URLs, else public, else route.
    Auto,
    /// Signed, expiring URLs.
    Temporary,
    /// The disk's public URL.
    Public,
    /// The application's streaming route.
    Route,
}

impl FromStr for UrlStrategy {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "auto" => Ok(Self::Auto),
            "temporary" => Ok(Self::Temporary),
            "public" => Ok(Self::Public),
            "route" => Ok(Self::Route),
            other => Err(AppError::configuration(format!(
                "Unknown URL strategy '{other}'"
            ))),
        }
    }
}

/// Produces URLs for files on one disk.
#[derive(Debug, Clone)]
pub struct FileUrlService {
    disk: Arc<dyn Disk>,
    strategy: UrlStrategy,
    ttl: Duration,
    route_prefix: String,
}

impl FileUrlService {
    /// Create the service for `disk`. An unknown strategy is rejected.
    pub fn new(config: &UrlConfig, disk: Arc<dyn Disk>) -> AppResult<Self> {
        Ok(Self {
            disk,
            strategy: config.strategy.parse()?,
            ttl: Duration::from_secs(config.temporary_ttl_seconds),
            route_prefix: config.route_prefix.trim_end_matches('/').to_string(),
        })
    }

    /// Configured strategy.
    pub fn strategy(&self) -> UrlStrategy {
        self.strategy
    }

    /// URL for the file stored at `disk_path`, known to callers as `id`.
    ///
    /// Signing failures fall back to the plain URL.
    pub async fn url_for(&self, disk_path: &str, id: &str) -> String {
        match self.strategy {
            UrlStrategy::Route => self.route_url(id),
            UrlStrategy::Public => self.public_or_route(disk_path, id),
            UrlStrategy::Temporary => self.temporary_or_plain(disk_path, id).await,
            UrlStrategy::Auto => {
                if self.disk.supports_temporary_urls() {
                    self.temporary_or_plain(disk_path, id).await
                } else {
                    self.public_or_route(disk_path, id)
                }
            }
        }
    }

    /// `{route_prefix}/{id}` with the identifier encoded as one segment.
    pub fn route_url(&self, id: &str) -> String {
        format!(
            "{}/{}",
            self.route_prefix,
            utf8_percent_encode(id, ROUTE_ID)
        )
    }

    fn public_or_route(&self, disk_path: &str, id: &str) -> String {
        self.disk
            .url(disk_path)
            .unwrap_or_else(|| self.route_url(id))
    }

    async fn temporary_or_plain(&self, disk_path: &str, id: &str) -> String {
        if !self.disk.supports_temporary_urls() {
            return self.public_or_route(disk_path, id);
        }
        match self.disk.temporary_url(disk_path, self.ttl).await {
            Ok(url) => url,
            Err(e) => {
                warn!(path = %disk_path, error = %e, "Temporary URL signing failed, using plain URL");
                self.public_or_route(disk_path, id)
            }
        }
    }
}
