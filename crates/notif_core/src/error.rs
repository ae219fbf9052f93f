use chrono::NaiveDateTime;

/// Failures reported by the notification store and the authority behind it.
#[derive(Debug, thiserror::Error)]
pub enum NotificationError {
    /// The user has not granted notification permission.
    #[error("notifications are not authorized")]
    NotAuthorized,

    /// Date components are out of range or name a day that does not exist.
    #[error("invalid date components: {0}")]
    InvalidDate(String),

    /// The trigger has no occurrence after the current time.
    #[error("trigger has no occurrence after {now}")]
    PastTrigger { now: NaiveDateTime },

    /// The authority refuses to hold more pending requests.
    #[error("pending notification limit of {limit} reached")]
    LimitExceeded { limit: usize },

    #[error("notification title is empty")]
    EmptyTitle,

    #[error("order journal I/O error: {0}")]
    Journal(#[from] std::io::Error),

    #[error("order journal is malformed: {0}")]
    JournalFormat(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, NotificationError>;
