use anyhow::Result;
use log::warn;
use serde::{Deserialize, Serialize};
use tauri::AppHandle;
use tauri_plugin_dialog::DialogExt;

use crate::models::ImageRef;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum SourceKind {
    Camera,
    Gallery,
}

/// Outcome of asking the device for an image. Cancellation is a normal
/// outcome, never an error; a denied permission is reported separately so
/// the workflow can tell the user instead of silently doing nothing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PickOutcome {
    Selected(ImageRef),
    Cancelled,
    PermissionDenied,
}

/// Capability boundary around the device's media pickers. Content, size and
/// format of the returned image are deliberately not validated here.
pub trait ImageSource: Send + Sync {
    fn request_image(&self, kind: SourceKind) -> Result<PickOutcome>;
}

/// Production source backed by the system file dialog.
pub struct DialogImageSource {
    app: AppHandle,
}

impl DialogImageSource {
    pub fn new(app: AppHandle) -> Self {
        Self { app }
    }
}

impl ImageSource for DialogImageSource {
    fn request_image(&self, kind: SourceKind) -> Result<PickOutcome> {
        match kind {
            SourceKind::Gallery => {
                let picked = self
                    .app
                    .dialog()
                    .file()
                    .add_filter("Images", &["jpg", "jpeg", "png"])
                    .blocking_pick_file();

                Ok(match picked {
                    Some(path) => PickOutcome::Selected(ImageRef::new(path.to_string())),
                    None => PickOutcome::Cancelled,
                })
            }
            SourceKind::Camera => {
                // Desktop builds have no direct camera capture path; the UI
                // hides the camera button there, but the contract still
                // resolves to a cancellation rather than an error.
                warn!("camera capture requested but unavailable on this platform");
                Ok(PickOutcome::Cancelled)
            }
        }
    }
}
