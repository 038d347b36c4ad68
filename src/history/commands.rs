use chrono::NaiveDate;
use tauri::State;

use crate::{
    models::{DateGroup, HistoryEntry},
    AppState,
};

#[tauri::command]
pub async fn get_history(state: State<'_, AppState>) -> Result<Vec<HistoryEntry>, String> {
    let history = &state.history;
    history.load_all().await.map_err(|e| e.to_string())
}

#[tauri::command]
pub async fn get_history_grouped(state: State<'_, AppState>) -> Result<Vec<DateGroup>, String> {
    let history = &state.history;
    history.grouped().await.map_err(|e| e.to_string())
}

#[tauri::command]
pub async fn delete_history_entry(state: State<'_, AppState>, id: String) -> Result<(), String> {
    let history = &state.history;
    history.delete_entry(&id).await.map_err(|e| e.to_string())
}

#[tauri::command]
pub async fn delete_history_group(
    state: State<'_, AppState>,
    date: NaiveDate,
) -> Result<(), String> {
    let history = &state.history;
    history.delete_group(date).await.map_err(|e| e.to_string())
}
