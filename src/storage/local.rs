use crate::error::{AppError, AppResult};
use crate::storage::convert::ReminderRecord;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// On-disk store structure
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ReminderStore {
    pub reminders: Vec<ReminderRecord>,
}

/// Load reminders from the local JSON file
pub fn load_local(app_data_path: &Path) -> AppResult<ReminderStore> {
    let path = app_data_path.join(crate::config::STORE_FILE_NAME);

    if !path.exists() {
        return Ok(ReminderStore::default());
    }

    let content = fs::read_to_string(&path).map_err(|e| AppError::storage(e.to_string()))?;
    serde_json::from_str(&content)
        .map_err(|e| AppError::storage(format!("store file {} is unreadable: {}", path.display(), e)))
}

/// Save reminders to the local JSON file
pub fn save_local(app_data_path: &Path, data: &ReminderStore) -> AppResult<()> {
    let path = app_data_path.join(crate::config::STORE_FILE_NAME);
    let content =
        serde_json::to_string_pretty(data).map_err(|e| AppError::storage(e.to_string()))?;
    fs::write(&path, content).map_err(|e| AppError::storage(e.to_string()))?;
    Ok(())
}
