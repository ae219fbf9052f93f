use chrono::{Datelike, NaiveDateTime, Timelike};
use notif_core::{
    model::{NotificationDraft, NotificationRequest},
    trigger::Recurrence,
    NotificationError, NotificationStore,
};

/// State of the "new event" sheet.
#[derive(Debug, Clone)]
pub struct CreateNotificationForm {
    pub title: String,
    pub body: String,
    pub date: NaiveDateTime,
    pub repeats: bool,
    pub recurrence: Recurrence,
    last_error: Option<String>,
}

impl CreateNotificationForm {
    /// The date picker starts at the current minute.
    pub fn new(now: NaiveDateTime) -> Self {
        let date = now
            .with_second(0)
            .and_then(|at| at.with_nanosecond(0))
            .unwrap_or(now);
        Self {
            title: String::new(),
            body: String::new(),
            date,
            repeats: false,
            recurrence: Recurrence::default(),
            last_error: None,
        }
    }

    pub fn can_submit(&self) -> bool {
        !self.title.is_empty()
    }

    pub fn clear_title(&mut self) {
        self.title.clear();
    }

    pub fn clear_body(&mut self) {
        self.body.clear();
    }

    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    pub fn draft(&self) -> NotificationDraft {
        NotificationDraft {
            title: self.title.clone(),
            body: self.body.clone(),
            year: self.date.year(),
            month: self.date.month(),
            day: self.date.day(),
            hour: self.date.hour(),
            minute: self.date.minute(),
            repeats: self.repeats,
            recurrence: self.recurrence,
        }
    }

    /// Hands the draft to the store. The error is kept for display so the
    /// sheet can stay open.
    pub fn submit(&mut self, store: &NotificationStore) -> notif_core::Result<NotificationRequest> {
        let result = if self.can_submit() {
            store.create(self.draft())
        } else {
            Err(NotificationError::EmptyTitle)
        };
        self.last_error = result.as_ref().err().map(ToString::to_string);
        result
    }
}
