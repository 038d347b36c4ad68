use std::fmt;
use std::path::PathBuf;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::PredictionResult;

/// Opaque reference to a captured image (local URI or path). The store never
/// validates it; the file may have been removed since the entry was written.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(transparent)]
pub struct ImageRef(String);

impl ImageRef {
    pub fn new(uri: impl Into<String>) -> Self {
        Self(uri.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Filesystem path for reading the image bytes.
    pub fn local_path(&self) -> PathBuf {
        self.0
            .strip_prefix("file://")
            .unwrap_or(&self.0)
            .into()
    }
}

impl fmt::Display for ImageRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// One persisted prediction record. Immutable once created; entries are only
/// ever appended and deleted, never updated.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct HistoryEntry {
    pub id: String,
    pub captured_at: DateTime<Utc>,
    pub image: ImageRef,
    pub result: PredictionResult,
}

impl HistoryEntry {
    pub fn new(image: ImageRef, result: PredictionResult) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            captured_at: Utc::now(),
            image,
            result,
        }
    }

    /// Calendar date used as the grouping and section-deletion key. Derived
    /// from the structured timestamp in UTC so it is independent of the
    /// display locale.
    pub fn group_date(&self) -> NaiveDate {
        self.captured_at.date_naive()
    }
}

/// Entries sharing a calendar date, in the store's ordering. Recomputed from
/// the store on every load, never persisted.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct DateGroup {
    pub date: NaiveDate,
    pub entries: Vec<HistoryEntry>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{PredictionResult, RipenessClass};

    #[test]
    fn fresh_entries_get_unique_ids() {
        let result = PredictionResult::from_top_label(RipenessClass::Ripe, 0.9);
        let a = HistoryEntry::new(ImageRef::new("/tmp/a.jpg"), result.clone());
        let b = HistoryEntry::new(ImageRef::new("/tmp/b.jpg"), result);
        assert_ne!(a.id, b.id);
    }

    #[test]
    fn image_ref_strips_file_scheme_for_local_reads() {
        let plain = ImageRef::new("/photos/pomelo.jpg");
        assert_eq!(plain.local_path(), PathBuf::from("/photos/pomelo.jpg"));

        let uri = ImageRef::new("file:///photos/pomelo.jpg");
        assert_eq!(uri.local_path(), PathBuf::from("/photos/pomelo.jpg"));
    }
}
