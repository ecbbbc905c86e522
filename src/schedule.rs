use crate::reminder::Reminder;
use chrono::{Datelike, Duration, Local, NaiveDateTime, Weekday};
use std::sync::Arc;

/// Source of the current local wall-clock time.
pub trait Clock {
    fn now(&self) -> NaiveDateTime;
}

/// Production clock reading the system local time.
#[derive(Debug, Clone, Copy, Default)]
pub struct LocalClock;

impl Clock for LocalClock {
    fn now(&self) -> NaiveDateTime {
        Local::now().naive_local()
    }
}

/// Exact-alarm facility the scheduler drives.
///
/// Registration replaces any existing alarm for the same key; cancelling a
/// key with no registration is a no-op.
pub trait AlarmRegistrar {
    fn register_exact(&self, key: i64, at: NaiveDateTime, label: &str);
    fn cancel(&self, key: i64);
}

impl<R: AlarmRegistrar + ?Sized> AlarmRegistrar for Arc<R> {
    fn register_exact(&self, key: i64, at: NaiveDateTime, label: &str) {
        (**self).register_exact(key, at, label)
    }

    fn cancel(&self, key: i64) {
        (**self).cancel(key)
    }
}

/// Computes the next instant a reminder should fire.
///
/// Scans calendar dates starting at `now`'s date for up to a week, keeping
/// the time of day from `time`, and returns the first candidate strictly
/// after `now` that lands on one of `days`. If the week-long window yields
/// nothing, the scan continues from the following week until a matching
/// weekday is found.
///
/// An empty `days` returns `time` unmodified; callers normalize empty
/// selections before reaching this point.
pub fn next_occurrence_after(
    now: NaiveDateTime,
    time: NaiveDateTime,
    days: &[Weekday],
) -> NaiveDateTime {
    if days.is_empty() {
        log::warn!("next occurrence requested with no recurrence days, using nominal time");
        return time;
    }

    let time_of_day = time.time();

    let mut date = now.date();
    for _ in 0..crate::config::RECURRENCE_SCAN_DAYS {
        if days.contains(&date.weekday()) {
            let candidate = date.and_time(time_of_day);
            if candidate > now {
                return candidate;
            }
        }
        date = date + Duration::days(1);
    }

    // Every matching weekday this week has already passed; take the first
    // matching weekday starting a week out.
    let mut date = now.date() + Duration::days(7);
    while !days.contains(&date.weekday()) {
        date = date + Duration::days(1);
    }
    date.and_time(time_of_day)
}

/// Arms, re-arms, and cancels one exact alarm per reminder, keyed by id.
///
/// The registrar's one-shot alarms simulate recurrence: every fire event
/// must be answered with exactly one `reschedule_after_fire` call or the
/// recurrence silently stops.
pub struct AlarmScheduler<R: AlarmRegistrar, C: Clock = LocalClock> {
    registrar: R,
    clock: C,
}

impl<R: AlarmRegistrar> AlarmScheduler<R> {
    pub fn new(registrar: R) -> Self {
        Self {
            registrar,
            clock: LocalClock,
        }
    }
}

impl<R: AlarmRegistrar, C: Clock> AlarmScheduler<R, C> {
    pub fn with_clock(registrar: R, clock: C) -> Self {
        Self { registrar, clock }
    }

    /// Next firing instant for `reminder`, relative to the current time.
    pub fn next_occurrence(&self, reminder: &Reminder) -> NaiveDateTime {
        next_occurrence_after(self.clock.now(), reminder.time, &reminder.days)
    }

    /// Registers the reminder's next occurrence under its id, replacing any
    /// existing registration for that id. Returns the armed instant.
    pub fn schedule(&self, reminder: &Reminder) -> NaiveDateTime {
        let at = self.next_occurrence(reminder);
        self.registrar.register_exact(reminder.id, at, &reminder.name);
        log::debug!("armed reminder {} ({}) for {}", reminder.id, reminder.name, at);
        at
    }

    /// Cancels the fired registration and, when the reminder is enabled,
    /// re-arms it starting from now. Returns the re-armed instant, or `None`
    /// when the reminder is disabled and no alarm remains.
    pub fn reschedule_after_fire(&self, reminder: &Reminder) -> Option<NaiveDateTime> {
        self.cancel(reminder);
        if reminder.enabled {
            Some(self.schedule(reminder))
        } else {
            None
        }
    }

    /// Removes any outstanding alarm for the reminder. Safe when none exists.
    pub fn cancel(&self, reminder: &Reminder) {
        self.registrar.cancel(reminder.id);
    }
}
