use chrono::{Duration, Local, NaiveDateTime};
use parking_lot::RwLock;

use crate::{
    error::Result,
    model::{AuthorizationStatus, NotificationRequest},
};

/// Wall-clock time in the user's calendar.
pub trait Clock: Send + Sync {
    fn now(&self) -> NaiveDateTime;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> NaiveDateTime {
        Local::now().naive_local()
    }
}

/// Clock that only moves when told to. Used by previews and tests.
#[derive(Debug)]
pub struct ManualClock {
    now: RwLock<NaiveDateTime>,
}

impl ManualClock {
    pub fn new(now: NaiveDateTime) -> Self {
        Self {
            now: RwLock::new(now),
        }
    }

    pub fn set(&self, now: NaiveDateTime) {
        *self.now.write() = now;
    }

    pub fn advance(&self, by: Duration) {
        let mut now = self.now.write();
        *now += by;
    }
}

impl Clock for ManualClock {
    fn now(&self) -> NaiveDateTime {
        *self.now.read()
    }
}

/// Platform notification authorities implement this trait.
///
/// The authority owns persistence and delivery of pending requests and
/// serializes its own state; it has no notion of ordering.
pub trait NotificationCenter: Send + Sync {
    fn authorization_status(&self) -> AuthorizationStatus;

    /// Shows the permission prompt when the status is still undetermined and
    /// returns the resulting status.
    fn request_authorization(&self) -> Result<AuthorizationStatus>;

    fn pending_requests(&self) -> Vec<NotificationRequest>;

    /// Registers a request, replacing any pending one with the same
    /// identifier.
    fn add(&self, request: NotificationRequest) -> Result<()>;

    /// Identifiers that are not pending are ignored.
    fn remove_pending(&self, identifiers: &[String]);

    fn open_settings(&self);
}
