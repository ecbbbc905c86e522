/// Application configuration constants
///
/// Centralized configuration for the medication reminder app.

/// Directory name under the platform local data dir
pub const APP_DIR_NAME: &str = "MedReminder";

/// File name of the JSON reminder store
pub const STORE_FILE_NAME: &str = "reminders.json";

/// How often the alarm dispatcher checks for due alarms
pub const DISPATCH_TICK_SECS: u64 = 30;

/// Forward-search window for the next recurrence, in days
pub const RECURRENCE_SCAN_DAYS: u32 = 7;
