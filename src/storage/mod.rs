pub mod convert;
mod local;

use crate::error::{AppError, AppResult};
use crate::reminder::Reminder;
use local::ReminderStore;
use std::fs;
use std::path::PathBuf;

/// Persistent reminder store backed by a local JSON file.
///
/// Every mutation is written through to disk before returning.
pub struct Storage {
    reminders: Vec<Reminder>,
    app_data_path: PathBuf,
}

impl Storage {
    pub fn new() -> AppResult<Self> {
        let app_data_path = dirs::data_local_dir()
            .ok_or_else(|| AppError::storage("Failed to get local data dir"))?
            .join(crate::config::APP_DIR_NAME);
        Self::open(app_data_path)
    }

    /// Opens (or initializes) a store rooted at an explicit directory.
    pub fn open(app_data_path: PathBuf) -> AppResult<Self> {
        fs::create_dir_all(&app_data_path).map_err(|e| AppError::storage(e.to_string()))?;

        let store = local::load_local(&app_data_path)?;
        let reminders = store
            .reminders
            .iter()
            .map(convert::to_reminder)
            .collect::<AppResult<Vec<_>>>()?;

        Ok(Self {
            reminders,
            app_data_path,
        })
    }

    fn save(&self) -> AppResult<()> {
        let store = ReminderStore {
            reminders: self.reminders.iter().map(convert::to_record).collect(),
        };
        local::save_local(&self.app_data_path, &store)
    }

    fn next_id(&self) -> i64 {
        self.reminders.iter().map(|r| r.id).max().unwrap_or(0) + 1
    }

    pub fn all(&self) -> &[Reminder] {
        &self.reminders
    }

    pub fn get(&self, id: i64) -> Option<&Reminder> {
        self.reminders.iter().find(|r| r.id == id)
    }

    /// Assigns the reminder its id, persists it, and returns the stored copy.
    pub fn add(&mut self, mut reminder: Reminder) -> AppResult<Reminder> {
        reminder.id = self.next_id();
        self.reminders.push(reminder.clone());
        self.save()?;
        Ok(reminder)
    }

    pub fn update(&mut self, reminder: Reminder) -> AppResult<()> {
        let slot = self
            .reminders
            .iter_mut()
            .find(|r| r.id == reminder.id)
            .ok_or_else(|| AppError::storage(format!("no reminder with id {}", reminder.id)))?;
        *slot = reminder;
        self.save()
    }

    pub fn delete(&mut self, id: i64) -> AppResult<()> {
        self.reminders.retain(|r| r.id != id);
        self.save()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use std::env;

    fn test_reminder(name: &str) -> Reminder {
        let time = NaiveDate::from_ymd_opt(2024, 3, 5)
            .unwrap()
            .and_hms_opt(8, 0, 0)
            .unwrap();
        Reminder::new(name.to_string(), "1 pill".to_string(), time, vec![])
    }

    fn temp_store(tag: &str) -> (Storage, PathBuf) {
        let dir = env::temp_dir().join(format!("med_reminder_test_storage_{}", tag));
        let _ = fs::remove_dir_all(&dir);
        (Storage::open(dir.clone()).unwrap(), dir)
    }

    #[test]
    fn test_add_assigns_increasing_ids() {
        let (mut storage, dir) = temp_store("ids");

        let a = storage.add(test_reminder("Vitamin C")).unwrap();
        let b = storage.add(test_reminder("Iron")).unwrap();
        assert_eq!(a.id, 1);
        assert_eq!(b.id, 2);

        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn test_mutations_survive_reopen() {
        let (mut storage, dir) = temp_store("reopen");

        let added = storage.add(test_reminder("Vitamin C")).unwrap();
        let mut updated = added.clone();
        updated.enabled = false;
        updated
            .completed_dates
            .insert(NaiveDate::from_ymd_opt(2024, 3, 5).unwrap());
        storage.update(updated.clone()).unwrap();

        let reopened = Storage::open(dir.clone()).unwrap();
        assert_eq!(reopened.all(), &[updated]);

        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn test_update_unknown_id_is_an_error() {
        let (mut storage, dir) = temp_store("unknown");

        let mut ghost = test_reminder("Ghost");
        ghost.id = 99;
        assert!(storage.update(ghost).is_err());

        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn test_delete_removes_reminder() {
        let (mut storage, dir) = temp_store("delete");

        let added = storage.add(test_reminder("Vitamin C")).unwrap();
        storage.delete(added.id).unwrap();
        assert!(storage.get(added.id).is_none());
        assert!(storage.all().is_empty());

        let _ = fs::remove_dir_all(&dir);
    }
}
