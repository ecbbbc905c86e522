pub mod alarm;
pub mod config;
pub mod error;
pub mod reminder;
pub mod schedule;
pub mod storage;

pub use error::{AppError, AppResult};
pub use reminder::{Reminder, ScheduleType};

use alarm::{ActiveAlarms, ExactAlarms};
use chrono::{Local, NaiveDate, NaiveDateTime, Weekday};
use reminder::ALL_DAYS;
use schedule::AlarmScheduler;
use std::collections::BTreeSet;
use std::sync::Arc;
use storage::Storage;

/// Application service tying the store, the scheduler, and the ringing state
/// together. One instance owns all mutable application state.
pub struct App {
    storage: Storage,
    scheduler: AlarmScheduler<Arc<ExactAlarms>>,
    alarms: Arc<ExactAlarms>,
    active: Arc<ActiveAlarms>,
}

impl App {
    pub fn new() -> AppResult<Self> {
        Ok(Self::with_storage(Storage::new()?))
    }

    pub fn with_storage(storage: Storage) -> Self {
        let alarms = Arc::new(ExactAlarms::new());
        let scheduler = AlarmScheduler::new(Arc::clone(&alarms));
        Self {
            storage,
            scheduler,
            alarms,
            active: Arc::new(ActiveAlarms::new()),
        }
    }

    /// Handle to the alarm table, for the dispatcher thread.
    pub fn alarms(&self) -> Arc<ExactAlarms> {
        Arc::clone(&self.alarms)
    }

    /// Handle to the ringing-alarm state.
    pub fn active_alarms(&self) -> Arc<ActiveAlarms> {
        Arc::clone(&self.active)
    }

    pub fn reminders(&self) -> &[Reminder] {
        self.storage.all()
    }

    /// Every date on which any reminder was marked done.
    pub fn completed_dates(&self) -> BTreeSet<NaiveDate> {
        self.storage
            .all()
            .iter()
            .flat_map(|r| r.completed_dates.iter().copied())
            .collect()
    }

    /// Creates a reminder and arms its first alarm.
    pub fn add_reminder(
        &mut self,
        name: &str,
        dosage: &str,
        time: NaiveDateTime,
        schedule_type: ScheduleType,
        days: Vec<Weekday>,
    ) -> AppResult<Reminder> {
        if name.trim().is_empty() {
            return Err(AppError::validation("medication name must not be empty"));
        }

        let days = match schedule_type {
            ScheduleType::Daily => ALL_DAYS.to_vec(),
            ScheduleType::Custom => days,
        };

        let reminder = Reminder::new(name.trim().to_string(), dosage.to_string(), time, days);
        let reminder = self.storage.add(reminder)?;
        self.scheduler.schedule(&reminder);
        log::info!("added reminder {} ({})", reminder.id, reminder.name);
        Ok(reminder)
    }

    /// Flips enablement: enabling re-arms the alarm, disabling cancels it.
    pub fn toggle_enabled(&mut self, id: i64) -> AppResult<Reminder> {
        let mut reminder = self.get(id)?;
        reminder.enabled = !reminder.enabled;
        self.storage.update(reminder.clone())?;

        if reminder.enabled {
            self.scheduler.schedule(&reminder);
        } else {
            self.scheduler.cancel(&reminder);
        }
        Ok(reminder)
    }

    /// Flips membership of `date` (today when `None`) in the reminder's
    /// completed dates. Marking done while the alarm is ringing dismisses it.
    pub fn toggle_completion(&mut self, id: i64, date: Option<NaiveDate>) -> AppResult<Reminder> {
        let date = date.unwrap_or_else(|| Local::now().date_naive());
        let mut reminder = self.get(id)?;

        if !reminder.completed_dates.remove(&date) {
            if self.active.is_active(id) {
                self.dismiss_alarm(id);
            }
            reminder.completed_dates.insert(date);
        }

        self.storage.update(reminder.clone())?;
        Ok(reminder)
    }

    /// Stops the ringing state for a fired reminder.
    pub fn dismiss_alarm(&self, id: i64) {
        self.active.set_inactive(id);
    }

    /// Services one fire event: marks the reminder ringing, re-arms it when
    /// enabled, and advances its stored nominal time to the re-armed instant.
    pub fn handle_fired(&mut self, id: i64) -> AppResult<Option<NaiveDateTime>> {
        let mut reminder = match self.storage.get(id) {
            Some(r) => r.clone(),
            None => {
                // Fired after deletion; nothing to re-arm.
                log::warn!("alarm fired for unknown reminder {}", id);
                return Ok(None);
            }
        };

        self.active.set_active(id);

        let next = self.scheduler.reschedule_after_fire(&reminder);
        if let Some(at) = next {
            reminder.time = at;
            self.storage.update(reminder)?;
        }
        Ok(next)
    }

    /// Cancels the alarm, drops any ringing state, and removes the reminder.
    pub fn delete_reminder(&mut self, id: i64) -> AppResult<()> {
        if let Some(reminder) = self.storage.get(id) {
            self.scheduler.cancel(reminder);
        }
        self.active.set_inactive(id);
        self.storage.delete(id)
    }

    /// Arms every enabled reminder. Alarms do not survive a process restart,
    /// so the daemon calls this once on startup.
    pub fn schedule_all(&self) {
        for reminder in self.storage.all() {
            if reminder.enabled {
                self.scheduler.schedule(reminder);
            }
        }
    }

    fn get(&self, id: i64) -> AppResult<Reminder> {
        self.storage
            .get(id)
            .cloned()
            .ok_or_else(|| AppError::storage(format!("no reminder with id {}", id)))
    }
}
