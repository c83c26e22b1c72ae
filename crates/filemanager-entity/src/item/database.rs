//! Database-backed item.

use chrono::{DateTime, Utc};

use super::model::ItemKind;
use crate::record::ItemRecord;

/// An item backed by a metadata row.
///
/// The display path is computed by the adapter from the ancestor chain at
/// construction time.
#[derive(Debug, Clone)]
pub struct DatabaseItem {
    record: ItemRecord,
    identifier: String,
    path: String,
}

impl DatabaseItem {
    /// Wrap a record whose display path has been resolved.
    pub fn new(record: ItemRecord, path: impl Into<String>) -> Self {
        let identifier = record.id.to_string();
        Self {
            record,
            identifier,
            path: path.into(),
        }
    }

    /// The underlying row.
    pub fn record(&self) -> &ItemRecord {
        &self.record
    }

    pub(crate) fn identifier(&self) -> &str {
        &self.identifier
    }

    pub(crate) fn name(&self) -> &str {
        &self.record.name
    }

    pub(crate) fn path(&self) -> &str {
        &self.path
    }

    pub(crate) fn kind(&self) -> ItemKind {
        self.record.kind()
    }

    pub(crate) fn size(&self) -> Option<u64> {
        self.record.size.map(|s| s.max(0) as u64)
    }

    pub(crate) fn mime_type(&self) -> Option<String> {
        self.record.mime_type.clone().or_else(|| {
            mime_guess::from_path(&self.record.name)
                .first_raw()
                .map(str::to_string)
        })
    }

    pub(crate) fn last_modified(&self) -> Option<DateTime<Utc>> {
        self.record.updated_at_utc()
    }

    pub(crate) fn thumbnail(&self) -> Option<&str> {
        self.record.thumbnail.as_deref()
    }

    pub(crate) fn duration(&self) -> Option<i64> {
        self.record.duration
    }
}
