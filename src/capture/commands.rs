use tauri::{AppHandle, State};

use crate::{
    capture::CaptureState,
    models::HistoryEntry,
    picker::{DialogImageSource, ImageSource, PickOutcome, SourceKind},
    AppState,
};

#[tauri::command]
pub async fn get_capture_state(state: State<'_, AppState>) -> Result<CaptureState, String> {
    Ok(state.capture.get_state().await)
}

/// Asks the device for an image. Cancellation leaves the state untouched;
/// only a denied permission surfaces as an error message.
#[tauri::command]
pub async fn pick_image(
    state: State<'_, AppState>,
    app_handle: AppHandle,
    kind: SourceKind,
) -> Result<CaptureState, String> {
    let source = DialogImageSource::new(app_handle);
    let outcome = tauri::async_runtime::spawn_blocking(move || source.request_image(kind))
        .await
        .map_err(|e| e.to_string())?
        .map_err(|e| e.to_string())?;

    match outcome {
        PickOutcome::Selected(image) => state
            .capture
            .choose_image(image)
            .await
            .map_err(|e| e.to_string()),
        PickOutcome::Cancelled => Ok(state.capture.get_state().await),
        PickOutcome::PermissionDenied => Err("media access was denied".to_string()),
    }
}

#[tauri::command]
pub async fn analyze_image(state: State<'_, AppState>) -> Result<HistoryEntry, String> {
    state.capture.analyze().await.map_err(|e| e.to_string())
}

#[tauri::command]
pub async fn choose_another(state: State<'_, AppState>) -> Result<CaptureState, String> {
    state.capture.clear_image().await.map_err(|e| e.to_string())
}

#[tauri::command]
pub async fn reset_capture(state: State<'_, AppState>) -> Result<CaptureState, String> {
    Ok(state.capture.reset().await)
}
