use crate::schedule::AlarmRegistrar;
use chrono::{Local, NaiveDateTime};
use std::collections::{HashMap, HashSet};
use std::sync::mpsc::{channel, Receiver, Sender};
use std::sync::{Arc, Mutex, MutexGuard};
use std::thread::{self, JoinHandle};
use std::time::Duration;

/// One outstanding exact-alarm registration.
#[derive(Debug, Clone)]
pub struct ArmedAlarm {
    pub at: NaiveDateTime,
    pub label: String,
}

/// In-process exact-alarm table keyed by reminder id.
///
/// Stands in for the platform alarm facility: registering a key that is
/// already armed replaces it, and cancelling an unknown key does nothing.
#[derive(Debug, Default)]
pub struct ExactAlarms {
    alarms: Mutex<HashMap<i64, ArmedAlarm>>,
}

impl ExactAlarms {
    pub fn new() -> Self {
        Self::default()
    }

    /// Lock the table, recovering from poison if needed
    fn lock(&self) -> MutexGuard<'_, HashMap<i64, ArmedAlarm>> {
        self.alarms.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub fn armed_count(&self) -> usize {
        self.lock().len()
    }

    pub fn armed_at(&self, key: i64) -> Option<NaiveDateTime> {
        self.lock().get(&key).map(|a| a.at)
    }

    /// Removes and returns every alarm whose instant is at or before `now`.
    pub fn take_due(&self, now: NaiveDateTime) -> Vec<(i64, ArmedAlarm)> {
        let mut alarms = self.lock();
        let due: Vec<i64> = alarms
            .iter()
            .filter(|(_, a)| a.at <= now)
            .map(|(id, _)| *id)
            .collect();
        due.into_iter()
            .filter_map(|id| alarms.remove(&id).map(|a| (id, a)))
            .collect()
    }
}

impl AlarmRegistrar for ExactAlarms {
    fn register_exact(&self, key: i64, at: NaiveDateTime, label: &str) {
        self.lock().insert(
            key,
            ArmedAlarm {
                at,
                label: label.to_string(),
            },
        );
    }

    fn cancel(&self, key: i64) {
        self.lock().remove(&key);
    }
}

/// Event emitted when an armed alarm comes due.
#[derive(Debug, Clone)]
pub struct AlarmFired {
    pub id: i64,
    pub name: String,
}

/// Spawns the dispatcher thread that drains due alarms on a fixed tick and
/// forwards them over `tx`. The thread exits once the receiver is dropped.
pub fn spawn_dispatcher(
    alarms: Arc<ExactAlarms>,
    tick: Duration,
    tx: Sender<AlarmFired>,
) -> JoinHandle<()> {
    thread::spawn(move || loop {
        thread::sleep(tick);
        let now = Local::now().naive_local();
        for (id, alarm) in alarms.take_due(now) {
            log::debug!("alarm {} due at {}", id, alarm.at);
            let fired = AlarmFired {
                id,
                name: alarm.label,
            };
            if tx.send(fired).is_err() {
                return;
            }
        }
    })
}

/// Transition of a reminder in or out of the ringing state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AlarmTransition {
    Started(i64),
    Dismissed(i64),
}

/// The set of currently ringing reminders.
///
/// Owns the ringing state per reminder id and releases it deterministically
/// on dismiss; interested parties subscribe for transitions over a channel.
#[derive(Debug, Default)]
pub struct ActiveAlarms {
    ringing: Mutex<HashSet<i64>>,
    subscribers: Mutex<Vec<Sender<AlarmTransition>>>,
}

impl ActiveAlarms {
    pub fn new() -> Self {
        Self::default()
    }

    fn ringing(&self) -> MutexGuard<'_, HashSet<i64>> {
        self.ringing.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub fn set_active(&self, id: i64) {
        if self.ringing().insert(id) {
            self.notify(AlarmTransition::Started(id));
        }
    }

    pub fn set_inactive(&self, id: i64) {
        if self.ringing().remove(&id) {
            self.notify(AlarmTransition::Dismissed(id));
        }
    }

    pub fn is_active(&self, id: i64) -> bool {
        self.ringing().contains(&id)
    }

    pub fn snapshot(&self) -> HashSet<i64> {
        self.ringing().clone()
    }

    /// Registers a new subscriber for ringing-state transitions.
    pub fn subscribe(&self) -> Receiver<AlarmTransition> {
        let (tx, rx) = channel();
        self.subscribers
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(tx);
        rx
    }

    fn notify(&self, transition: AlarmTransition) {
        // Subscribers whose receiver is gone are dropped here.
        self.subscribers
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .retain(|tx| tx.send(transition).is_ok());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn at(h: u32, m: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 3, 5)
            .unwrap()
            .and_hms_opt(h, m, 0)
            .unwrap()
    }

    #[test]
    fn test_register_replaces_existing_key() {
        let alarms = ExactAlarms::new();
        alarms.register_exact(1, at(8, 0), "Vitamin C");
        alarms.register_exact(1, at(9, 0), "Vitamin C");

        assert_eq!(alarms.armed_count(), 1);
        assert_eq!(alarms.armed_at(1), Some(at(9, 0)));
    }

    #[test]
    fn test_cancel_unknown_key_is_a_noop() {
        let alarms = ExactAlarms::new();
        alarms.cancel(99);
        assert_eq!(alarms.armed_count(), 0);
    }

    #[test]
    fn test_take_due_drains_only_past_alarms() {
        let alarms = ExactAlarms::new();
        alarms.register_exact(1, at(8, 0), "Vitamin C");
        alarms.register_exact(2, at(10, 0), "Iron");

        let due = alarms.take_due(at(9, 0));
        assert_eq!(due.len(), 1);
        assert_eq!(due[0].0, 1);
        assert_eq!(due[0].1.label, "Vitamin C");

        // The future alarm stays armed.
        assert_eq!(alarms.armed_count(), 1);
        assert_eq!(alarms.armed_at(2), Some(at(10, 0)));
    }

    #[test]
    fn test_active_alarms_track_ringing_ids() {
        let active = ActiveAlarms::new();
        active.set_active(7);
        assert!(active.is_active(7));

        active.set_inactive(7);
        assert!(!active.is_active(7));
        assert!(active.snapshot().is_empty());
    }

    #[test]
    fn test_set_inactive_without_ring_is_silent() {
        let active = ActiveAlarms::new();
        let rx = active.subscribe();

        active.set_inactive(7);
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn test_subscribers_see_transitions_once() {
        let active = ActiveAlarms::new();
        let rx = active.subscribe();

        active.set_active(7);
        active.set_active(7); // already ringing, no second event
        active.set_inactive(7);

        assert_eq!(rx.try_recv(), Ok(AlarmTransition::Started(7)));
        assert_eq!(rx.try_recv(), Ok(AlarmTransition::Dismissed(7)));
        assert!(rx.try_recv().is_err());
    }
}
