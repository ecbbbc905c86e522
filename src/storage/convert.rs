use crate::error::{AppError, AppResult};
use crate::reminder::{normalize_days, Reminder};
use chrono::{NaiveDate, NaiveDateTime, Weekday};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

const DATE_TIME_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";
const DATE_FORMAT: &str = "%Y-%m-%d";

/// Persisted shape of a reminder.
///
/// Dates and weekdays are stored as strings: the nominal time as an ISO
/// local datetime, recurrence days as comma-joined ISO weekday numbers
/// (Monday = 1 .. Sunday = 7), completed dates as comma-joined ISO dates.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReminderRecord {
    pub id: i64,
    pub name: String,
    #[serde(default)]
    pub dosage: String,
    pub time: String,
    pub days: String,
    pub enabled: bool,
    #[serde(default)]
    pub completed_dates: String,
}

pub fn to_record(reminder: &Reminder) -> ReminderRecord {
    ReminderRecord {
        id: reminder.id,
        name: reminder.name.clone(),
        dosage: reminder.dosage.clone(),
        time: reminder.time.format(DATE_TIME_FORMAT).to_string(),
        days: encode_days(&reminder.days),
        enabled: reminder.enabled,
        completed_dates: encode_dates(&reminder.completed_dates),
    }
}

pub fn to_reminder(record: &ReminderRecord) -> AppResult<Reminder> {
    let time = NaiveDateTime::parse_from_str(&record.time, DATE_TIME_FORMAT).map_err(|e| {
        AppError::storage(format!(
            "reminder {} has unreadable time '{}': {}",
            record.id, record.time, e
        ))
    })?;

    Ok(Reminder {
        id: record.id,
        name: record.name.clone(),
        dosage: record.dosage.clone(),
        time,
        days: decode_days(&record.days),
        enabled: record.enabled,
        completed_dates: decode_dates(&record.completed_dates),
    })
}

fn encode_days(days: &[Weekday]) -> String {
    days.iter()
        .map(|d| d.number_from_monday().to_string())
        .collect::<Vec<_>>()
        .join(",")
}

/// Unknown tokens are skipped; an empty result means "every day".
fn decode_days(value: &str) -> Vec<Weekday> {
    let days = value
        .split(',')
        .filter_map(|token| match token.trim().parse::<u8>() {
            Ok(1) => Some(Weekday::Mon),
            Ok(2) => Some(Weekday::Tue),
            Ok(3) => Some(Weekday::Wed),
            Ok(4) => Some(Weekday::Thu),
            Ok(5) => Some(Weekday::Fri),
            Ok(6) => Some(Weekday::Sat),
            Ok(7) => Some(Weekday::Sun),
            _ => None,
        })
        .collect();
    normalize_days(days)
}

fn encode_dates(dates: &BTreeSet<NaiveDate>) -> String {
    dates
        .iter()
        .map(|d| d.format(DATE_FORMAT).to_string())
        .collect::<Vec<_>>()
        .join(",")
}

fn decode_dates(value: &str) -> BTreeSet<NaiveDate> {
    value
        .split(',')
        .filter_map(|token| NaiveDate::parse_from_str(token.trim(), DATE_FORMAT).ok())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reminder::ALL_DAYS;

    fn record(days: &str) -> ReminderRecord {
        ReminderRecord {
            id: 1,
            name: "Vitamin C".to_string(),
            dosage: "1 pill".to_string(),
            time: "2024-03-05T08:00:00".to_string(),
            days: days.to_string(),
            enabled: true,
            completed_dates: String::new(),
        }
    }

    #[test]
    fn test_record_roundtrip_preserves_reminder() {
        let time = NaiveDate::from_ymd_opt(2024, 3, 5)
            .unwrap()
            .and_hms_opt(8, 0, 0)
            .unwrap();
        let mut r = Reminder::new(
            "Vitamin C".to_string(),
            "1 pill".to_string(),
            time,
            vec![Weekday::Mon, Weekday::Fri],
        );
        r.id = 3;
        r.completed_dates
            .insert(NaiveDate::from_ymd_opt(2024, 3, 4).unwrap());

        let back = to_reminder(&to_record(&r)).unwrap();
        assert_eq!(back, r);
    }

    #[test]
    fn test_empty_days_string_decodes_to_every_day() {
        let r = to_reminder(&record("")).unwrap();
        assert_eq!(r.days, ALL_DAYS.to_vec());
    }

    #[test]
    fn test_unknown_day_tokens_are_skipped() {
        let r = to_reminder(&record("1,x,9,5")).unwrap();
        assert_eq!(r.days, vec![Weekday::Mon, Weekday::Fri]);
    }

    #[test]
    fn test_unreadable_time_is_an_error() {
        let mut rec = record("1");
        rec.time = "yesterday-ish".to_string();
        let err = to_reminder(&rec).unwrap_err();
        assert!(err.to_string().contains("unreadable time"));
    }
}
