use std::fmt;

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::{
    error::{NotificationError, Result},
    trigger::{CalendarTrigger, DateComponents, Recurrence},
};

/// A scheduled request held by the notification authority.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationRequest {
    pub identifier: String,
    pub title: String,
    pub body: String,
    pub trigger: CalendarTrigger,
}

impl NotificationRequest {
    pub fn new(
        identifier: impl Into<String>,
        title: impl Into<String>,
        body: impl Into<String>,
        trigger: CalendarTrigger,
    ) -> Self {
        Self {
            identifier: identifier.into(),
            title: title.into(),
            body: body.into(),
            trigger,
        }
    }

    pub fn next_trigger_date(&self, now: NaiveDateTime) -> Option<NaiveDateTime> {
        self.trigger.next_trigger_date(now)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuthorizationStatus {
    #[default]
    NotDetermined,
    Denied,
    Authorized,
}

impl AuthorizationStatus {
    pub fn is_authorized(self) -> bool {
        matches!(self, AuthorizationStatus::Authorized)
    }
}

impl fmt::Display for AuthorizationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            AuthorizationStatus::NotDetermined => "not_determined",
            AuthorizationStatus::Denied => "denied",
            AuthorizationStatus::Authorized => "authorized",
        };
        f.write_str(s)
    }
}

/// Everything the creation flow collects before a request exists.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotificationDraft {
    pub title: String,
    pub body: String,
    pub year: i32,
    pub month: u32,
    pub day: u32,
    pub hour: u32,
    pub minute: u32,
    pub repeats: bool,
    /// Only consulted when `repeats` is set.
    pub recurrence: Recurrence,
}

impl NotificationDraft {
    pub fn at(title: impl Into<String>, body: impl Into<String>, when: NaiveDateTime) -> Self {
        let components = DateComponents::from_datetime(when);
        Self {
            title: title.into(),
            body: body.into(),
            year: components.year.unwrap_or_default(),
            month: components.month.unwrap_or_default(),
            day: components.day.unwrap_or_default(),
            hour: components.hour.unwrap_or_default(),
            minute: components.minute.unwrap_or_default(),
            repeats: false,
            recurrence: Recurrence::default(),
        }
    }

    pub fn repeating(mut self, recurrence: Recurrence) -> Self {
        self.repeats = true;
        self.recurrence = recurrence;
        self
    }

    pub fn components(&self) -> DateComponents {
        DateComponents::from_ymd_hm(self.year, self.month, self.day, self.hour, self.minute)
    }

    /// Builds the calendar trigger, rejecting drafts whose first fire date is
    /// not after `now`.
    pub fn trigger(&self, now: NaiveDateTime) -> Result<CalendarTrigger> {
        if self.title.is_empty() {
            return Err(NotificationError::EmptyTitle);
        }
        let components = self.components();
        components.validate()?;
        let first = components.to_datetime().ok_or_else(|| {
            NotificationError::InvalidDate(format!(
                "{:04}-{:02}-{:02} {:02}:{:02}",
                self.year, self.month, self.day, self.hour, self.minute
            ))
        })?;
        if first <= now {
            return Err(NotificationError::PastTrigger { now });
        }

        Ok(if self.repeats {
            CalendarTrigger::repeating(first, self.recurrence)
        } else {
            CalendarTrigger::once(components)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn now() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2025, 11, 7)
            .unwrap()
            .and_hms_opt(9, 0, 0)
            .unwrap()
    }

    #[test]
    fn draft_in_the_past_is_rejected() {
        let draft = NotificationDraft {
            title: "Call Mom".into(),
            body: String::new(),
            year: 2025,
            month: 11,
            day: 6,
            hour: 9,
            minute: 0,
            repeats: false,
            recurrence: Recurrence::Daily,
        };
        assert!(matches!(
            draft.trigger(now()),
            Err(NotificationError::PastTrigger { .. })
        ));

        let same_minute = NotificationDraft::at("Call Mom", "", now());
        assert!(matches!(
            same_minute.trigger(now()),
            Err(NotificationError::PastTrigger { .. })
        ));
    }

    #[test]
    fn empty_title_is_rejected() {
        let draft = NotificationDraft::at("", "body", now() + chrono::Duration::hours(1));
        assert!(matches!(
            draft.trigger(now()),
            Err(NotificationError::EmptyTitle)
        ));

        let spaces = NotificationDraft::at("  ", "body", now() + chrono::Duration::hours(1));
        assert!(spaces.trigger(now()).is_ok());
    }

    #[test]
    fn repeating_draft_starts_at_first_date() {
        let first = now() + chrono::Duration::days(2);
        let trigger = NotificationDraft::at("Stretch", "", first)
            .repeating(Recurrence::Daily)
            .trigger(now())
            .expect("valid trigger");
        assert!(trigger.repeats);
        assert_eq!(trigger.next_trigger_date(now()), Some(first));
    }

    #[test]
    fn status_display_is_snake_case() {
        assert_eq!(AuthorizationStatus::NotDetermined.to_string(), "not_determined");
        assert!(AuthorizationStatus::Authorized.is_authorized());
        assert!(!AuthorizationStatus::Denied.is_authorized());
    }
}
