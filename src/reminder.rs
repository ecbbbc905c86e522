use chrono::{NaiveDate, NaiveDateTime, Weekday};
use std::collections::BTreeSet;

/// Every weekday, in ISO order (Monday first).
pub const ALL_DAYS: [Weekday; 7] = [
    Weekday::Mon,
    Weekday::Tue,
    Weekday::Wed,
    Weekday::Thu,
    Weekday::Fri,
    Weekday::Sat,
    Weekday::Sun,
];

/// Recurrence choice made when creating a reminder.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScheduleType {
    /// Fire every day of the week
    Daily,
    /// Fire only on an explicit set of weekdays
    Custom,
}

/// A medication reminder.
///
/// `time` carries the time of day the reminder fires and, incidentally,
/// the instant most recently computed for it by the scheduler.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reminder {
    pub id: i64,
    pub name: String,
    pub dosage: String,
    pub time: NaiveDateTime,
    pub days: Vec<Weekday>,
    pub enabled: bool,
    pub completed_dates: BTreeSet<NaiveDate>,
}

impl Reminder {
    pub fn new(name: String, dosage: String, time: NaiveDateTime, days: Vec<Weekday>) -> Self {
        Self {
            id: 0, // Will be set by storage
            name,
            dosage,
            time,
            days: normalize_days(days),
            enabled: true,
            completed_dates: BTreeSet::new(),
        }
    }

    pub fn is_completed_on(&self, date: NaiveDate) -> bool {
        self.completed_dates.contains(&date)
    }
}

/// Dedupes in ISO weekday order; an empty selection means "every day".
pub fn normalize_days(days: Vec<Weekday>) -> Vec<Weekday> {
    if days.is_empty() {
        return ALL_DAYS.to_vec();
    }
    ALL_DAYS
        .iter()
        .copied()
        .filter(|d| days.contains(d))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn noon() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 3, 4)
            .unwrap()
            .and_hms_opt(12, 0, 0)
            .unwrap()
    }

    #[test]
    fn test_empty_days_means_every_day() {
        let r = Reminder::new("Vitamin C".to_string(), "1 pill".to_string(), noon(), vec![]);
        assert_eq!(r.days, ALL_DAYS.to_vec());
    }

    #[test]
    fn test_days_are_deduped_and_ordered() {
        let days = vec![Weekday::Fri, Weekday::Mon, Weekday::Fri];
        let r = Reminder::new("Iron".to_string(), String::new(), noon(), days);
        assert_eq!(r.days, vec![Weekday::Mon, Weekday::Fri]);
    }

    #[test]
    fn test_new_reminder_is_enabled_with_no_completions() {
        let r = Reminder::new("Iron".to_string(), String::new(), noon(), vec![Weekday::Mon]);
        assert!(r.enabled);
        assert!(r.completed_dates.is_empty());
        assert!(!r.is_completed_on(noon().date()));
    }

    #[test]
    fn test_is_completed_on_checks_the_exact_date() {
        let mut r = Reminder::new("Iron".to_string(), String::new(), noon(), vec![]);
        let today = NaiveDate::from_ymd_opt(2024, 3, 4).unwrap();
        r.completed_dates.insert(today);
        assert!(r.is_completed_on(today));
        assert!(!r.is_completed_on(today.succ_opt().unwrap()));
    }
}
