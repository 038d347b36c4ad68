use std::fs;
use std::path::PathBuf;

use chrono::{NaiveDate, Utc};
use log::{error, warn};

use crate::error::StoreError;
use crate::models::HistoryEntry;

/// The single persisted slot holding the whole history collection as a JSON
/// array, newest entry first. All mutation goes through the store worker
/// thread, which owns the only instance of this struct.
pub struct HistorySlot {
    path: PathBuf,
    entries: Vec<HistoryEntry>,
}

impl HistorySlot {
    /// Opens the slot, creating an empty one if nothing was ever written.
    /// A payload that no longer parses is quarantined to a timestamped
    /// sidecar file and the slot starts empty; I/O failures are fatal.
    pub fn open(path: PathBuf) -> Result<Self, StoreError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let entries = if path.exists() {
            let raw = fs::read_to_string(&path)?;
            match parse_entries(&raw) {
                Ok(entries) => entries,
                Err(err) => {
                    error!("history slot at {} is corrupt: {err}", path.display());
                    quarantine(&path);
                    Vec::new()
                }
            }
        } else {
            Vec::new()
        };

        Ok(Self { path, entries })
    }

    pub fn entries(&self) -> &[HistoryEntry] {
        &self.entries
    }

    /// Prepends the entry and persists the full document before returning.
    pub fn append(&mut self, entry: HistoryEntry) -> Result<(), StoreError> {
        self.entries.insert(0, entry);
        self.persist()
    }

    /// Removes the entry with the given id. Idempotent: an absent id is a
    /// no-op, not an error.
    pub fn delete_entry(&mut self, id: &str) -> Result<(), StoreError> {
        let before = self.entries.len();
        self.entries.retain(|entry| entry.id != id);
        if self.entries.len() == before {
            return Ok(());
        }
        self.persist()
    }

    /// Removes every entry whose grouping date matches. Idempotent.
    pub fn delete_group(&mut self, date: NaiveDate) -> Result<(), StoreError> {
        let before = self.entries.len();
        self.entries.retain(|entry| entry.group_date() != date);
        if self.entries.len() == before {
            return Ok(());
        }
        self.persist()
    }

    /// Writes the whole document to a temp file and renames it into place,
    /// so readers never observe a half-applied write.
    fn persist(&self) -> Result<(), StoreError> {
        let serialized = serde_json::to_string(&self.entries)
            .map_err(|err| StoreError::Unavailable(err.to_string()))?;

        let tmp_path = self.path.with_extension("json.tmp");
        fs::write(&tmp_path, serialized)?;
        fs::rename(&tmp_path, &self.path)?;
        Ok(())
    }
}

fn parse_entries(raw: &str) -> Result<Vec<HistoryEntry>, StoreError> {
    serde_json::from_str(raw).map_err(|err| StoreError::Corrupt(err.to_string()))
}

fn quarantine(path: &PathBuf) {
    let stamp = Utc::now().format("%Y%m%dT%H%M%SZ");
    let sidecar = path.with_extension(format!("json.corrupt-{stamp}"));
    match fs::rename(path, &sidecar) {
        Ok(()) => warn!(
            "corrupt history payload preserved at {}",
            sidecar.display()
        ),
        Err(err) => error!("failed to quarantine corrupt history payload: {err}"),
    }
}
