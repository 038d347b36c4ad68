use std::sync::Arc;

use anyhow::{anyhow, Result};
use log::{error, info};
use serde::Serialize;
use tauri::{AppHandle, Emitter};
use tokio::sync::Mutex;

use crate::history::HistoryStore;
use crate::inference::Classifier;
use crate::models::{HistoryEntry, ImageRef};

use super::{CapturePhase, CaptureState};

#[derive(Serialize, Clone)]
struct CaptureCompletedEvent {
    entry: HistoryEntry,
}

/// Drives one capture-analyze-record run at a time. The state lock is held
/// only across transitions, never across the network or storage awaits, and
/// the `Analyzing` guard keeps a second submission out while one is in
/// flight. `Done` is reached only after the store append has persisted.
pub struct CaptureController<C: Classifier> {
    state: Arc<Mutex<CaptureState>>,
    store: HistoryStore,
    classifier: Arc<C>,
    app_handle: Option<AppHandle>,
}

impl<C: Classifier> Clone for CaptureController<C> {
    fn clone(&self) -> Self {
        Self {
            state: self.state.clone(),
            store: self.store.clone(),
            classifier: self.classifier.clone(),
            app_handle: self.app_handle.clone(),
        }
    }
}

impl<C: Classifier> CaptureController<C> {
    pub fn new(store: HistoryStore, classifier: C) -> Self {
        Self {
            state: Arc::new(Mutex::new(CaptureState::new())),
            store,
            classifier: Arc::new(classifier),
            app_handle: None,
        }
    }

    pub fn with_app_handle(mut self, app_handle: AppHandle) -> Self {
        self.app_handle = Some(app_handle);
        self
    }

    pub async fn get_state(&self) -> CaptureState {
        self.state.lock().await.clone()
    }

    /// Records a successful pick. Rejected only while a request is in
    /// flight; picking again over an existing selection just replaces it.
    pub async fn choose_image(&self, image: ImageRef) -> Result<CaptureState> {
        let snapshot = {
            let mut state = self.state.lock().await;
            if !state.can_pick() {
                return Err(anyhow!("cannot change the image while analyzing"));
            }
            state.choose_image(image);
            state.clone()
        };
        self.emit_state(&snapshot);
        Ok(snapshot)
    }

    /// "Choose another": back to `Idle`, dropping the selection.
    pub async fn clear_image(&self) -> Result<CaptureState> {
        let snapshot = {
            let mut state = self.state.lock().await;
            if !state.can_pick() {
                return Err(anyhow!("cannot discard the image while analyzing"));
            }
            state.clear_image();
            state.clone()
        };
        self.emit_state(&snapshot);
        Ok(snapshot)
    }

    /// Submits the chosen image to the grader and, on success, persists the
    /// record before handing it off. Any failure returns the run to
    /// `ImageChosen` with the error attached; nothing is appended then.
    pub async fn analyze(&self) -> Result<HistoryEntry> {
        let image = {
            let mut state = self.state.lock().await;
            match state.phase {
                CapturePhase::ImageChosen => {}
                CapturePhase::Analyzing => return Err(anyhow!("analysis already in flight")),
                CapturePhase::Idle | CapturePhase::Done => {
                    return Err(anyhow!("no image chosen to analyze"))
                }
            }
            let image = state
                .image
                .clone()
                .ok_or_else(|| anyhow!("image missing from chosen state"))?;
            state.begin_analysis();
            image
        };
        self.emit_current_state().await;

        let result = match self.classifier.classify(&image).await {
            Ok(result) => result,
            Err(err) => {
                error!("classification failed: {err}");
                return self.fail(err.to_string()).await;
            }
        };

        let entry = HistoryEntry::new(image, result);
        if let Err(err) = self.store.append(entry.clone()).await {
            error!("failed to persist prediction {}: {err}", entry.id);
            return self.fail(err.to_string()).await;
        }

        let snapshot = {
            let mut state = self.state.lock().await;
            state.complete(entry.clone());
            state.clone()
        };
        info!(
            "capture {} recorded as {} ({:.1}%)",
            entry.id,
            entry.result.class.as_str(),
            entry.result.confidence * 100.0
        );
        self.emit_state(&snapshot);
        self.emit_completed(&entry);

        Ok(entry)
    }

    /// Starts a fresh workflow instance from any terminal or idle phase.
    pub async fn reset(&self) -> CaptureState {
        let snapshot = {
            let mut state = self.state.lock().await;
            state.reset();
            state.clone()
        };
        self.emit_state(&snapshot);
        snapshot
    }

    async fn fail(&self, message: String) -> Result<HistoryEntry> {
        let snapshot = {
            let mut state = self.state.lock().await;
            state.fail_analysis(message.clone());
            state.clone()
        };
        self.emit_state(&snapshot);
        Err(anyhow!(message))
    }

    async fn emit_current_state(&self) {
        let snapshot = self.state.lock().await.clone();
        self.emit_state(&snapshot);
    }

    fn emit_state(&self, state: &CaptureState) {
        if let Some(app_handle) = &self.app_handle {
            let _ = app_handle.emit("capture-state-changed", state.clone());
        }
    }

    fn emit_completed(&self, entry: &HistoryEntry) {
        if let Some(app_handle) = &self.app_handle {
            let payload = CaptureCompletedEvent {
                entry: entry.clone(),
            };
            let _ = app_handle.emit("capture-completed", payload);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::InferenceError;
    use crate::models::{PredictionResult, RipenessClass};
    use std::sync::Mutex as StdMutex;
    use tempfile::tempdir;

    struct FakeClassifier {
        responses: StdMutex<Vec<Result<PredictionResult, InferenceError>>>,
    }

    impl FakeClassifier {
        fn new(responses: Vec<Result<PredictionResult, InferenceError>>) -> Self {
            Self {
                responses: StdMutex::new(responses),
            }
        }
    }

    impl Classifier for FakeClassifier {
        async fn classify(&self, _image: &ImageRef) -> Result<PredictionResult, InferenceError> {
            self.responses
                .lock()
                .unwrap()
                .remove(0)
        }
    }

    fn controller(
        dir: &tempfile::TempDir,
        responses: Vec<Result<PredictionResult, InferenceError>>,
    ) -> CaptureController<FakeClassifier> {
        let store = HistoryStore::new(dir.path().join("history.json")).unwrap();
        CaptureController::new(store, FakeClassifier::new(responses))
    }

    #[tokio::test]
    async fn successful_run_persists_before_reaching_done() {
        let dir = tempdir().unwrap();
        let prediction = PredictionResult::from_top_label(RipenessClass::Ripe, 0.87);
        let controller = controller(&dir, vec![Ok(prediction)]);

        controller
            .choose_image(ImageRef::new("/tmp/pomelo.jpg"))
            .await
            .unwrap();
        let entry = controller.analyze().await.unwrap();

        assert!((entry.result.probability_of(RipenessClass::Ripe) - 0.87).abs() < 1e-9);
        assert!((entry.result.probability_of(RipenessClass::Overripe) - 0.13).abs() < 1e-9);

        let state = controller.get_state().await;
        assert_eq!(state.phase, CapturePhase::Done);

        // The handed-off entry is already in the store.
        let stored = controller.store.load_all().await.unwrap();
        assert_eq!(stored.len(), 1);
        assert_eq!(stored[0].id, entry.id);
    }

    #[tokio::test]
    async fn failed_classification_returns_to_image_chosen_without_append() {
        let dir = tempdir().unwrap();
        let controller = controller(&dir, vec![Err(InferenceError::NonSuccessStatus(500))]);

        controller
            .choose_image(ImageRef::new("/tmp/pomelo.jpg"))
            .await
            .unwrap();
        assert!(controller.analyze().await.is_err());

        let state = controller.get_state().await;
        assert_eq!(state.phase, CapturePhase::ImageChosen);
        assert_eq!(state.image, Some(ImageRef::new("/tmp/pomelo.jpg")));
        assert!(state.error.is_some());

        assert!(controller.store.load_all().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn retry_after_failure_succeeds() {
        let dir = tempdir().unwrap();
        let prediction = PredictionResult::from_top_label(RipenessClass::Overripe, 0.6);
        let controller = controller(
            &dir,
            vec![Err(InferenceError::Timeout), Ok(prediction)],
        );

        controller
            .choose_image(ImageRef::new("/tmp/pomelo.jpg"))
            .await
            .unwrap();
        assert!(controller.analyze().await.is_err());
        let entry = controller.analyze().await.unwrap();

        assert_eq!(entry.result.class, RipenessClass::Overripe);
        assert_eq!(controller.get_state().await.phase, CapturePhase::Done);
    }

    #[tokio::test]
    async fn analyze_without_an_image_is_rejected() {
        let dir = tempdir().unwrap();
        let controller = controller(&dir, vec![]);
        assert!(controller.analyze().await.is_err());
    }

    #[tokio::test]
    async fn done_is_terminal_until_reset() {
        let dir = tempdir().unwrap();
        let prediction = PredictionResult::from_top_label(RipenessClass::Ripe, 0.9);
        let controller = controller(&dir, vec![Ok(prediction)]);

        controller
            .choose_image(ImageRef::new("/tmp/pomelo.jpg"))
            .await
            .unwrap();
        controller.analyze().await.unwrap();

        // A second analyze on the finished run is rejected.
        assert!(controller.analyze().await.is_err());

        let state = controller.reset().await;
        assert_eq!(state.phase, CapturePhase::Idle);
        assert!(state.entry.is_none());
    }
}
