mod capture;
mod error;
mod history;
mod inference;
mod models;
mod picker;
mod settings;

use capture::{
    commands::{analyze_image, choose_another, get_capture_state, pick_image, reset_capture},
    CaptureController,
};
use history::{
    commands::{delete_history_entry, delete_history_group, get_history, get_history_grouped},
    HistoryStore,
};
use inference::InferenceClient;
use settings::{InferenceSettings, SettingsStore};
use tauri::{Manager, State};

pub(crate) struct AppState {
    pub(crate) history: HistoryStore,
    pub(crate) capture: CaptureController<InferenceClient>,
    pub(crate) settings: SettingsStore,
}

#[tauri::command]
fn get_inference_settings(state: State<AppState>) -> Result<InferenceSettings, String> {
    Ok(state.settings.inference())
}

#[tauri::command]
fn set_inference_settings(
    settings: InferenceSettings,
    state: State<AppState>,
) -> Result<(), String> {
    state
        .settings
        .update_inference(settings)
        .map_err(|e| e.to_string())
}

#[cfg_attr(mobile, tauri::mobile_entry_point)]
pub fn run() {
    // Initialize logging (reads RUST_LOG env var)
    env_logger::Builder::from_default_env()
        .filter_level(log::LevelFilter::Info)
        .init();

    log::info!("PomeGrade starting up...");

    tauri::Builder::default()
        .plugin(tauri_plugin_opener::init())
        .plugin(tauri_plugin_dialog::init())
        .setup(|app| {
            let result = (|| -> anyhow::Result<()> {
                let app_data_dir = app
                    .path()
                    .app_data_dir()
                    .map_err(|err| anyhow::anyhow!(err))?;
                std::fs::create_dir_all(&app_data_dir)?;

                let history = HistoryStore::new(app_data_dir.join("history.json"))?;

                let settings_path = app_data_dir.join("settings.json");
                let settings = SettingsStore::new(settings_path)?;

                let client = InferenceClient::new(settings.clone());
                let capture = CaptureController::new(history.clone(), client)
                    .with_app_handle(app.handle().clone());

                app.manage(AppState {
                    history,
                    capture,
                    settings,
                });

                Ok(())
            })();

            result.map_err(|err| err.into())
        })
        .invoke_handler(tauri::generate_handler![
            get_capture_state,
            pick_image,
            analyze_image,
            choose_another,
            reset_capture,
            get_history,
            get_history_grouped,
            delete_history_entry,
            delete_history_group,
            get_inference_settings,
            set_inference_settings,
        ])
        .run(tauri::generate_context!())
        .expect("error while running tauri application");
}
