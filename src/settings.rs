use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::{
    fs,
    path::PathBuf,
    sync::{Arc, RwLock},
};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InferenceSettings {
    pub endpoint_url: String,
    pub timeout_secs: u64,
}

impl Default for InferenceSettings {
    fn default() -> Self {
        Self {
            endpoint_url: "http://127.0.0.1:8000/predict/".into(),
            timeout_secs: 30,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct UserSettings {
    inference: InferenceSettings,
}

struct SettingsInner {
    path: PathBuf,
    data: RwLock<UserSettings>,
}

#[derive(Clone)]
pub struct SettingsStore {
    inner: Arc<SettingsInner>,
}

impl SettingsStore {
    pub fn new(path: PathBuf) -> Result<Self> {
        let data = if path.exists() {
            let contents = fs::read_to_string(&path)
                .with_context(|| format!("Failed to read settings from {}", path.display()))?;
            serde_json::from_str(&contents).unwrap_or_default()
        } else {
            UserSettings::default()
        };

        Ok(Self {
            inner: Arc::new(SettingsInner {
                path,
                data: RwLock::new(data),
            }),
        })
    }

    pub fn inference(&self) -> InferenceSettings {
        self.inner.data.read().unwrap().inference.clone()
    }

    pub fn update_inference(&self, settings: InferenceSettings) -> Result<()> {
        let mut guard = self.inner.data.write().unwrap();
        guard.inference = settings;
        self.persist(&guard)?;
        Ok(())
    }

    fn persist(&self, data: &UserSettings) -> Result<()> {
        let serialized = serde_json::to_string_pretty(data)?;
        fs::write(&self.inner.path, serialized).with_context(|| {
            format!("Failed to write settings to {}", self.inner.path.display())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn settings_round_trip_through_disk() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("settings.json");

        let store = SettingsStore::new(path.clone()).unwrap();
        store
            .update_inference(InferenceSettings {
                endpoint_url: "http://grader.local:8000/predict/".into(),
                timeout_secs: 10,
            })
            .unwrap();

        let reloaded = SettingsStore::new(path).unwrap();
        assert_eq!(
            reloaded.inference().endpoint_url,
            "http://grader.local:8000/predict/"
        );
        assert_eq!(reloaded.inference().timeout_secs, 10);
    }

    #[test]
    fn unreadable_settings_fall_back_to_defaults() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("settings.json");
        fs::write(&path, "{ definitely not json").unwrap();

        let store = SettingsStore::new(path).unwrap();
        assert_eq!(store.inference().timeout_secs, 30);
    }
}
