use serde::{Deserialize, Serialize};

use crate::models::{HistoryEntry, ImageRef};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum CapturePhase {
    Idle,
    ImageChosen,
    Analyzing,
    Done,
}

impl Default for CapturePhase {
    fn default() -> Self {
        CapturePhase::Idle
    }
}

/// User-visible state of one capture-analyze-record run. A failed analysis
/// drops back to `ImageChosen` with the error attached and the image kept,
/// so the user can retry without re-picking. `Done` is terminal; a new run
/// starts from a reset state.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CaptureState {
    pub phase: CapturePhase,
    pub image: Option<ImageRef>,
    /// Message of the last failed analysis, cleared on the next attempt.
    pub error: Option<String>,
    /// The persisted record, present only in `Done`.
    pub entry: Option<HistoryEntry>,
}

impl CaptureState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn can_pick(&self) -> bool {
        self.phase != CapturePhase::Analyzing
    }

    /// A successful pick from any non-analyzing phase selects the image and
    /// starts (or restarts) the run at `ImageChosen`.
    pub fn choose_image(&mut self, image: ImageRef) {
        *self = Self {
            phase: CapturePhase::ImageChosen,
            image: Some(image),
            error: None,
            entry: None,
        };
    }

    /// "Choose another": discard the selection and return to `Idle`.
    pub fn clear_image(&mut self) {
        *self = Self::default();
    }

    pub fn begin_analysis(&mut self) {
        self.phase = CapturePhase::Analyzing;
        self.error = None;
    }

    pub fn fail_analysis(&mut self, message: String) {
        self.phase = CapturePhase::ImageChosen;
        self.error = Some(message);
    }

    pub fn complete(&mut self, entry: HistoryEntry) {
        self.phase = CapturePhase::Done;
        self.error = None;
        self.entry = Some(entry);
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }
}
