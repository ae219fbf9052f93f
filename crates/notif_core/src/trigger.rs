use chrono::{Datelike, Duration, NaiveDate, NaiveDateTime, NaiveTime, Timelike, Weekday};
use serde::{Deserialize, Serialize};

use crate::error::{NotificationError, Result};

/// How far ahead an open-ended trigger is searched. 28 years is one full
/// weekday/leap-year cycle, so any satisfiable combination shows up.
const SEARCH_HORIZON_DAYS: i64 = 366 * 28;

/// Calendar fields a trigger matches against.
///
/// Unset fields match any value, except `second`, which matches zero when
/// unset.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateComponents {
    pub year: Option<i32>,
    pub month: Option<u32>,
    pub day: Option<u32>,
    pub weekday: Option<Weekday>,
    pub hour: Option<u32>,
    pub minute: Option<u32>,
    pub second: Option<u32>,
}

impl DateComponents {
    pub fn from_ymd_hm(year: i32, month: u32, day: u32, hour: u32, minute: u32) -> Self {
        Self {
            year: Some(year),
            month: Some(month),
            day: Some(day),
            hour: Some(hour),
            minute: Some(minute),
            ..Self::default()
        }
    }

    pub fn from_datetime(at: NaiveDateTime) -> Self {
        Self::from_ymd_hm(at.year(), at.month(), at.day(), at.hour(), at.minute())
    }

    pub fn validate(&self) -> Result<()> {
        check_range("month", self.month, 1, 12)?;
        check_range("day", self.day, 1, 31)?;
        check_range("hour", self.hour, 0, 23)?;
        check_range("minute", self.minute, 0, 59)?;
        check_range("second", self.second, 0, 59)?;

        if let (Some(month), Some(day)) = (self.month, self.day) {
            // Leap years are only ruled out when the year is pinned.
            let year = self.year.unwrap_or(2000);
            if NaiveDate::from_ymd_opt(year, month, day).is_none() {
                return Err(NotificationError::InvalidDate(format!(
                    "{year:04}-{month:02}-{day:02} does not exist"
                )));
            }
        }
        Ok(())
    }

    /// The single instant these components describe, if they pin one down to
    /// the minute.
    pub fn to_datetime(&self) -> Option<NaiveDateTime> {
        let date = NaiveDate::from_ymd_opt(self.year?, self.month?, self.day?)?;
        let time = NaiveTime::from_hms_opt(self.hour?, self.minute?, self.second.unwrap_or(0))?;
        Some(date.and_time(time))
    }

    pub fn matches_date(&self, date: NaiveDate) -> bool {
        self.year.map_or(true, |year| year == date.year())
            && self.month.map_or(true, |month| month == date.month())
            && self.day.map_or(true, |day| day == date.day())
            && self.weekday.map_or(true, |weekday| weekday == date.weekday())
    }

    /// Earliest matching instant strictly after `after`.
    pub fn next_after(&self, after: NaiveDateTime) -> Option<NaiveDateTime> {
        let start = after.date();
        let (first_day, last_day) = match self.year {
            Some(year) if year < start.year() => return None,
            Some(year) if year > start.year() => (
                NaiveDate::from_ymd_opt(year, 1, 1)?,
                NaiveDate::from_ymd_opt(year, 12, 31)?,
            ),
            Some(year) => (start, NaiveDate::from_ymd_opt(year, 12, 31)?),
            None => (
                start,
                start.checked_add_signed(Duration::days(SEARCH_HORIZON_DAYS))?,
            ),
        };

        let mut day = first_day;
        while day <= last_day {
            if self.matches_date(day) {
                let floor = (day == start).then(|| after.time());
                if let Some(time) = self.first_time(floor) {
                    return Some(day.and_time(time));
                }
            }
            day = day.succ_opt()?;
        }
        None
    }

    fn first_time(&self, strictly_after: Option<NaiveTime>) -> Option<NaiveTime> {
        let second = self.second.unwrap_or(0);
        for hour in self.hour.map_or(0..=23, |hour| hour..=hour) {
            for minute in self.minute.map_or(0..=59, |minute| minute..=minute) {
                let time = NaiveTime::from_hms_opt(hour, minute, second)?;
                match strictly_after {
                    Some(floor) if time <= floor => continue,
                    _ => return Some(time),
                }
            }
        }
        None
    }
}

fn check_range(field: &str, value: Option<u32>, min: u32, max: u32) -> Result<()> {
    match value {
        Some(value) if value < min || value > max => Err(NotificationError::InvalidDate(format!(
            "{field} {value} is outside {min}..={max}"
        ))),
        _ => Ok(()),
    }
}

/// Which fields of the first fire date a repeating trigger keeps.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Recurrence {
    #[default]
    Daily,
    Weekly,
    Monthly,
    Yearly,
}

impl Recurrence {
    pub fn components_of(self, first: NaiveDateTime) -> DateComponents {
        let time_only = DateComponents {
            hour: Some(first.hour()),
            minute: Some(first.minute()),
            ..DateComponents::default()
        };
        match self {
            Recurrence::Daily => time_only,
            Recurrence::Weekly => DateComponents {
                weekday: Some(first.weekday()),
                ..time_only
            },
            Recurrence::Monthly => DateComponents {
                day: Some(first.day()),
                ..time_only
            },
            Recurrence::Yearly => DateComponents {
                month: Some(first.month()),
                day: Some(first.day()),
                ..time_only
            },
        }
    }
}

/// Firing rule based on calendar components, optionally recurring.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CalendarTrigger {
    pub components: DateComponents,
    pub repeats: bool,
    /// No occurrence is reported before this instant.
    pub not_before: Option<NaiveDateTime>,
}

impl CalendarTrigger {
    pub fn once(components: DateComponents) -> Self {
        Self {
            components,
            repeats: false,
            not_before: None,
        }
    }

    pub fn repeating(first: NaiveDateTime, recurrence: Recurrence) -> Self {
        Self {
            components: recurrence.components_of(first),
            repeats: true,
            not_before: Some(first),
        }
    }

    /// Next instant after `now` at which the trigger fires, or `None` when it
    /// has no future occurrence.
    pub fn next_trigger_date(&self, now: NaiveDateTime) -> Option<NaiveDateTime> {
        let after = match self.not_before {
            Some(first) if first > now => first - Duration::seconds(1),
            _ => now,
        };
        self.components.next_after(after)
    }
}
