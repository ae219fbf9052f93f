//! Read-side view over the store's notifications: search filtering and
//! trigger-date labels.

use std::fmt::Write;

use chrono::format::{Item, StrftimeItems};
use chrono::{NaiveDate, NaiveDateTime};

use crate::model::NotificationRequest;

/// Short time style, e.g. `07:00`.
pub const DEFAULT_TIME_FORMAT: &str = "%H:%M";
pub const DEFAULT_FALLBACK_LABEL: &str = "Past due";

/// How a trigger date is rendered, and what to show when there is none.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimeFormat {
    pattern: String,
    fallback: String,
}

impl TimeFormat {
    /// Returns `None` when `pattern` is not a valid strftime pattern or needs
    /// fields a calendar date-time lacks (offsets, time zone names).
    pub fn new(pattern: impl Into<String>, fallback: impl Into<String>) -> Option<Self> {
        let pattern = pattern.into();
        if StrftimeItems::new(&pattern).any(|item| matches!(item, Item::Error)) {
            return None;
        }
        let sample = NaiveDate::from_ymd_opt(2000, 1, 1)?.and_hms_opt(0, 0, 0)?;
        let mut rendered = String::new();
        if write!(rendered, "{}", sample.format(&pattern)).is_err() {
            return None;
        }
        Some(Self {
            pattern,
            fallback: fallback.into(),
        })
    }

    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    pub fn fallback(&self) -> &str {
        &self.fallback
    }

    pub fn with_fallback(mut self, fallback: impl Into<String>) -> Self {
        self.fallback = fallback.into();
        self
    }
}

impl Default for TimeFormat {
    fn default() -> Self {
        Self {
            pattern: DEFAULT_TIME_FORMAT.to_string(),
            fallback: DEFAULT_FALLBACK_LABEL.to_string(),
        }
    }
}

/// Requests whose title or body contains `query`, ignoring case. An empty
/// query keeps everything. Order is preserved.
pub fn filter<'a>(all: &'a [NotificationRequest], query: &str) -> Vec<&'a NotificationRequest> {
    if query.is_empty() {
        return all.iter().collect();
    }
    let needle = query.to_lowercase();
    all.iter()
        .filter(|request| {
            request.title.to_lowercase().contains(&needle)
                || request.body.to_lowercase().contains(&needle)
        })
        .collect()
}

/// Label for the next time `request` fires after `now`.
pub fn display_time(request: &NotificationRequest, now: NaiveDateTime, format: &TimeFormat) -> String {
    let Some(next) = request.next_trigger_date(now) else {
        return format.fallback.clone();
    };
    let mut label = String::new();
    if write!(label, "{}", next.format(&format.pattern)).is_err() {
        return format.fallback.clone();
    }
    label
}

/// Maps positions in a filtered view back to request identifiers.
/// Positions past the end are skipped.
pub fn identifiers_at(
    visible: &[&NotificationRequest],
    positions: impl IntoIterator<Item = usize>,
) -> Vec<String> {
    positions
        .into_iter()
        .filter_map(|idx| visible.get(idx))
        .map(|request| request.identifier.clone())
        .collect()
}
