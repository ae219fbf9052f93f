use std::sync::Arc;

use chrono::NaiveDateTime;
use parking_lot::RwLock;
use tracing::{debug, info};

use crate::{
    center::{Clock, NotificationCenter},
    error::{NotificationError, Result},
    model::{AuthorizationStatus, NotificationRequest},
};

/// Pending-request ceiling enforced by the mobile platforms.
pub const DEFAULT_PENDING_LIMIT: usize = 64;

#[derive(Debug, Clone)]
struct PendingEntry {
    request: NotificationRequest,
    next_fire: NaiveDateTime,
}

#[derive(Debug, Default)]
struct CenterState {
    status: AuthorizationStatus,
    prompt_answer: Option<AuthorizationStatus>,
    pending: Vec<PendingEntry>,
    delivered: Vec<NotificationRequest>,
    settings_opened: usize,
}

/// In-process notification authority that behaves like the platform one:
/// permission prompt, pending limit, one-shot removal after delivery.
pub struct InMemoryNotificationCenter {
    clock: Arc<dyn Clock>,
    pending_limit: usize,
    state: RwLock<CenterState>,
}

impl InMemoryNotificationCenter {
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            clock,
            pending_limit: DEFAULT_PENDING_LIMIT,
            state: RwLock::new(CenterState {
                prompt_answer: Some(AuthorizationStatus::Authorized),
                ..CenterState::default()
            }),
        }
    }

    pub fn with_pending_limit(mut self, limit: usize) -> Self {
        self.pending_limit = limit;
        self
    }

    /// What the user picks when the prompt is shown. `None` dismisses the
    /// prompt and leaves the status undetermined.
    pub fn answering_prompt(self, answer: Option<AuthorizationStatus>) -> Self {
        self.state.write().prompt_answer = answer;
        self
    }

    /// Simulates the user flipping the switch in system settings.
    pub fn set_authorization(&self, status: AuthorizationStatus) {
        let mut state = self.state.write();
        info!(from = %state.status, to = %status, "authorization changed in settings");
        state.status = status;
    }

    /// Delivers every request whose fire date has passed. One-shot requests
    /// leave the pending list; repeating ones move to their next occurrence.
    pub fn deliver_due(&self) -> Vec<NotificationRequest> {
        let now = self.clock.now();
        let mut state = self.state.write();
        let mut fired = Vec::new();
        let mut still_pending = Vec::with_capacity(state.pending.len());

        for mut entry in std::mem::take(&mut state.pending) {
            if entry.next_fire > now {
                still_pending.push(entry);
                continue;
            }
            fired.push(entry.request.clone());
            if entry.request.trigger.repeats {
                if let Some(next) = entry.request.next_trigger_date(now) {
                    entry.next_fire = next;
                    still_pending.push(entry);
                }
            }
        }

        state.pending = still_pending;
        state.delivered.extend(fired.iter().cloned());
        if !fired.is_empty() {
            debug!(count = fired.len(), "delivered notifications");
        }
        fired
    }

    pub fn delivered(&self) -> Vec<NotificationRequest> {
        self.state.read().delivered.clone()
    }

    pub fn settings_opened(&self) -> usize {
        self.state.read().settings_opened
    }
}

impl NotificationCenter for InMemoryNotificationCenter {
    fn authorization_status(&self) -> AuthorizationStatus {
        self.state.read().status
    }

    fn request_authorization(&self) -> Result<AuthorizationStatus> {
        let mut state = self.state.write();
        if state.status == AuthorizationStatus::NotDetermined {
            if let Some(answer) = state.prompt_answer {
                info!(status = %answer, "permission prompt answered");
                state.status = answer;
            }
        }
        Ok(state.status)
    }

    fn pending_requests(&self) -> Vec<NotificationRequest> {
        self.state
            .read()
            .pending
            .iter()
            .map(|entry| entry.request.clone())
            .collect()
    }

    fn add(&self, request: NotificationRequest) -> Result<()> {
        let now = self.clock.now();
        let mut state = self.state.write();
        if !state.status.is_authorized() {
            return Err(NotificationError::NotAuthorized);
        }
        let next_fire = request
            .next_trigger_date(now)
            .ok_or(NotificationError::PastTrigger { now })?;

        if let Some(existing) = state
            .pending
            .iter_mut()
            .find(|entry| entry.request.identifier == request.identifier)
        {
            existing.request = request;
            existing.next_fire = next_fire;
            return Ok(());
        }
        if state.pending.len() >= self.pending_limit {
            return Err(NotificationError::LimitExceeded {
                limit: self.pending_limit,
            });
        }
        state.pending.push(PendingEntry { request, next_fire });
        Ok(())
    }

    fn remove_pending(&self, identifiers: &[String]) {
        self.state
            .write()
            .pending
            .retain(|entry| !identifiers.contains(&entry.request.identifier));
    }

    fn open_settings(&self) {
        self.state.write().settings_opened += 1;
    }
}
