use std::collections::{BTreeSet, HashSet};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::NaiveDateTime;
use parking_lot::RwLock;
use tokio::sync::watch;
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

use crate::{
    center::{Clock, NotificationCenter, SystemClock},
    error::{NotificationError, Result},
    model::{AuthorizationStatus, NotificationDraft, NotificationRequest},
    ordering::{self, OrderJournal},
};

/// What observers see after every change to the cached state.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StoreSnapshot {
    pub revision: u64,
    pub authorization: AuthorizationStatus,
    pub notifications: Vec<NotificationRequest>,
}

/// Pull-based view of store changes.
pub struct StoreSubscription {
    receiver: watch::Receiver<StoreSnapshot>,
}

impl StoreSubscription {
    pub fn current(&self) -> StoreSnapshot {
        self.receiver.borrow().clone()
    }

    /// Latest snapshot if it has not been seen yet. Intermediate snapshots
    /// published since the last call are skipped.
    pub fn next_change(&mut self) -> Option<StoreSnapshot> {
        match self.receiver.has_changed() {
            Ok(true) => Some(self.receiver.borrow_and_update().clone()),
            _ => None,
        }
    }
}

#[derive(Debug, Default)]
struct StoreState {
    revision: u64,
    authorization: AuthorizationStatus,
    notifications: Vec<NotificationRequest>,
    order: Vec<String>,
}

impl StoreState {
    fn snapshot(&self) -> StoreSnapshot {
        StoreSnapshot {
            revision: self.revision,
            authorization: self.authorization,
            notifications: self.notifications.clone(),
        }
    }
}

/// Cached, ordered view over a [`NotificationCenter`].
pub struct NotificationStore {
    center: Arc<dyn NotificationCenter>,
    clock: Arc<dyn Clock>,
    journal: Option<OrderJournal>,
    state: RwLock<StoreState>,
    changes: watch::Sender<StoreSnapshot>,
}

pub struct NotificationStoreBuilder {
    center: Arc<dyn NotificationCenter>,
    clock: Arc<dyn Clock>,
    journal_path: Option<PathBuf>,
}

impl NotificationStoreBuilder {
    pub fn new(center: Arc<dyn NotificationCenter>) -> Self {
        Self {
            center,
            clock: Arc::new(SystemClock),
            journal_path: None,
        }
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn with_order_journal(mut self, path: impl AsRef<Path>) -> Self {
        self.journal_path = Some(path.as_ref().to_path_buf());
        self
    }

    pub fn build(self) -> Result<NotificationStore> {
        let journal = self.journal_path.map(OrderJournal::new);
        let order = match &journal {
            Some(journal) => match journal.load() {
                Ok(order) => order,
                Err(NotificationError::JournalFormat(err)) => {
                    warn!(path = %journal.path().display(), %err, "discarding malformed order journal");
                    Vec::new()
                }
                Err(err) => return Err(err),
            },
            None => Vec::new(),
        };

        let state = StoreState {
            authorization: self.center.authorization_status(),
            order,
            ..StoreState::default()
        };
        let (changes, _) = watch::channel(state.snapshot());
        Ok(NotificationStore {
            center: self.center,
            clock: self.clock,
            journal,
            state: RwLock::new(state),
            changes,
        })
    }
}

impl NotificationStore {
    pub fn builder(center: Arc<dyn NotificationCenter>) -> NotificationStoreBuilder {
        NotificationStoreBuilder::new(center)
    }

    pub fn now(&self) -> NaiveDateTime {
        self.clock.now()
    }

    pub fn subscribe(&self) -> StoreSubscription {
        StoreSubscription {
            receiver: self.changes.subscribe(),
        }
    }

    pub fn snapshot(&self) -> StoreSnapshot {
        self.state.read().snapshot()
    }

    /// Cached list as of the last reload.
    pub fn notifications(&self) -> Vec<NotificationRequest> {
        self.state.read().notifications.clone()
    }

    /// Cached status as of the last refresh.
    pub fn authorization_status(&self) -> AuthorizationStatus {
        self.state.read().authorization
    }

    #[instrument(skip(self))]
    pub fn refresh_authorization_status(&self) -> AuthorizationStatus {
        let status = self.center.authorization_status();
        self.apply_status(status);
        status
    }

    #[instrument(skip(self))]
    pub fn request_authorization(&self) -> Result<AuthorizationStatus> {
        let status = self.center.request_authorization()?;
        self.apply_status(status);
        Ok(status)
    }

    pub fn open_settings(&self) {
        info!("opening system notification settings");
        self.center.open_settings();
    }

    /// Reloads pending requests from the authority in the user's order.
    /// Without authorization the list is empty.
    #[instrument(skip(self))]
    pub fn list_pending(&self) -> Vec<NotificationRequest> {
        let authorization = self.center.authorization_status();
        let mut state = self.state.write();
        state.authorization = authorization;

        if !authorization.is_authorized() {
            debug!(%authorization, "skipping reload without authorization");
            state.notifications.clear();
            self.publish(&mut state);
            return Vec::new();
        }

        let arranged = ordering::arrange(self.center.pending_requests(), &state.order);
        state.order = arranged
            .iter()
            .map(|request| request.identifier.clone())
            .collect();
        state.notifications = arranged.clone();
        debug!(count = arranged.len(), "reloaded pending notifications");
        self.publish(&mut state);
        arranged
    }

    /// Schedules a new request and reloads the cached list.
    #[instrument(skip(self, draft), fields(title = %draft.title, repeats = draft.repeats))]
    pub fn create(&self, draft: NotificationDraft) -> Result<NotificationRequest> {
        let trigger = draft.trigger(self.clock.now())?;
        let request = NotificationRequest::new(self.fresh_identifier(), draft.title, draft.body, trigger);

        if let Err(err) = self.center.add(request.clone()) {
            warn!(%err, "authority rejected notification");
            return Err(err);
        }
        info!(identifier = %request.identifier, "scheduled notification");
        self.list_pending();
        Ok(request)
    }

    /// Removes pending requests by identifier. Unknown identifiers are
    /// ignored. Returns how many cached entries went away.
    #[instrument(skip(self, identifiers))]
    pub fn delete<I, S>(&self, identifiers: I) -> usize
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let identifiers: HashSet<String> = identifiers.into_iter().map(Into::into).collect();
        if identifiers.is_empty() {
            return 0;
        }
        let targets: Vec<String> = identifiers.iter().cloned().collect();
        self.center.remove_pending(&targets);

        let mut state = self.state.write();
        let before = state.notifications.len();
        state
            .notifications
            .retain(|request| !identifiers.contains(&request.identifier));
        state.order.retain(|id| !identifiers.contains(id));
        let removed = before - state.notifications.len();

        info!(requested = identifiers.len(), removed, "deleted notifications");
        self.persist_order(&state.order);
        self.publish(&mut state);
        removed
    }

    /// Moves the cached rows at `from` before the row at `to`. The authority
    /// has no ordering, so the result lives in the store (and its journal).
    #[instrument(skip(self))]
    pub fn reorder(&self, from: &BTreeSet<usize>, to: usize) {
        let mut state = self.state.write();
        if !ordering::move_positions(&mut state.notifications, from, to) {
            return;
        }
        state.order = state
            .notifications
            .iter()
            .map(|request| request.identifier.clone())
            .collect();
        self.persist_order(&state.order);
        self.publish(&mut state);
    }
}

impl NotificationStore {
    fn apply_status(&self, status: AuthorizationStatus) {
        let mut state = self.state.write();
        if state.authorization == status {
            return;
        }
        info!(from = %state.authorization, to = %status, "authorization status changed");
        state.authorization = status;
        if !status.is_authorized() {
            state.notifications.clear();
        }
        self.publish(&mut state);
    }

    fn publish(&self, state: &mut StoreState) {
        state.revision += 1;
        self.changes.send_replace(state.snapshot());
    }

    fn persist_order(&self, order: &[String]) {
        if let Some(journal) = &self.journal {
            if let Err(err) = journal.save(order) {
                warn!(path = %journal.path().display(), %err, "unable to persist notification order");
            }
        }
    }

    fn fresh_identifier(&self) -> String {
        let taken: HashSet<String> = self
            .center
            .pending_requests()
            .into_iter()
            .map(|request| request.identifier)
            .collect();
        loop {
            let candidate = Uuid::new_v4().to_string();
            if !taken.contains(&candidate) {
                return candidate;
            }
        }
    }
}
