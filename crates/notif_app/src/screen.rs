use std::collections::BTreeSet;
use std::sync::Arc;

use anyhow::{Context, Result};
use notif_core::{
    model::{AuthorizationStatus, NotificationRequest},
    projection::{self, TimeFormat},
    NotificationStore, StoreSubscription,
};
use tracing::{debug, info, warn};

use crate::{config::AppConfig, create::CreateNotificationForm};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OverlayAction {
    PresentCreate,
    OpenSettings,
}

/// Banner shown over the list instead of (or on top of) its rows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InfoOverlay {
    pub message: &'static str,
    pub button_title: &'static str,
    pub system_image: &'static str,
    pub action: OverlayAction,
}

impl InfoOverlay {
    fn empty_list() -> Self {
        Self {
            message: "No events yet",
            button_title: "Create",
            system_image: "plus.circle",
            action: OverlayAction::PresentCreate,
        }
    }

    fn permission_denied() -> Self {
        Self {
            message: "Allow notifications in Settings",
            button_title: "Settings",
            system_image: "gear",
            action: OverlayAction::OpenSettings,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotificationRow {
    pub identifier: String,
    pub title: String,
    pub time: String,
}

/// Headless model of the notification list screen and its create sheet.
pub struct NotificationListScreen {
    store: Arc<NotificationStore>,
    subscription: StoreSubscription,
    observed_status: Option<AuthorizationStatus>,
    time_format: TimeFormat,
    search_text: String,
    create_form: Option<CreateNotificationForm>,
}

impl NotificationListScreen {
    pub fn new(store: Arc<NotificationStore>, config: &AppConfig) -> Self {
        let subscription = store.subscribe();
        Self {
            store,
            subscription,
            observed_status: None,
            time_format: config.time_format.clone(),
            search_text: String::new(),
            create_form: None,
        }
    }

    pub fn store(&self) -> &NotificationStore {
        &self.store
    }

    pub fn on_appear(&mut self) {
        self.refresh_authorization();
    }

    pub fn on_will_enter_foreground(&mut self) {
        self.refresh_authorization();
    }

    /// Drains pending store changes and reacts to authorization transitions.
    /// Returns whether anything changed.
    pub fn sync(&mut self) -> bool {
        let mut changed = false;
        while let Some(snapshot) = self.subscription.next_change() {
            changed = true;
            self.observe(snapshot.authorization);
        }
        changed
    }

    pub fn overlay(&self) -> Option<InfoOverlay> {
        match self.store.authorization_status() {
            AuthorizationStatus::Authorized if self.store.notifications().is_empty() => {
                Some(InfoOverlay::empty_list())
            }
            AuthorizationStatus::Denied => Some(InfoOverlay::permission_denied()),
            AuthorizationStatus::Authorized | AuthorizationStatus::NotDetermined => None,
        }
    }

    pub fn perform(&mut self, action: OverlayAction) {
        match action {
            OverlayAction::PresentCreate => self.present_create(),
            OverlayAction::OpenSettings => self.store.open_settings(),
        }
    }

    pub fn search_text(&self) -> &str {
        &self.search_text
    }

    pub fn set_search_text(&mut self, text: impl Into<String>) {
        self.search_text = text.into();
    }

    pub fn rows(&self) -> Vec<NotificationRow> {
        let now = self.store.now();
        let notifications = self.store.notifications();
        projection::filter(&notifications, &self.search_text)
            .into_iter()
            .map(|request| NotificationRow {
                identifier: request.identifier.clone(),
                title: request.title.clone(),
                time: projection::display_time(request, now, &self.time_format),
            })
            .collect()
    }

    /// Deletes the rows at `positions` of the visible (searched) list.
    pub fn delete(&mut self, positions: impl IntoIterator<Item = usize>) -> usize {
        let notifications = self.store.notifications();
        let visible = projection::filter(&notifications, &self.search_text);
        let identifiers = projection::identifiers_at(&visible, positions);
        let removed = self.store.delete(identifiers);
        self.store.list_pending();
        self.sync();
        removed
    }

    /// Rows can only be moved while the full list is shown.
    pub fn move_rows(&mut self, from: &BTreeSet<usize>, to: usize) -> bool {
        if !self.search_text.is_empty() {
            debug!("ignoring move while search is active");
            return false;
        }
        self.store.reorder(from, to);
        self.sync();
        true
    }

    pub fn present_create(&mut self) {
        if self.create_form.is_none() {
            self.create_form = Some(CreateNotificationForm::new(self.store.now()));
        }
    }

    pub fn is_create_presented(&self) -> bool {
        self.create_form.is_some()
    }

    pub fn create_form(&self) -> Option<&CreateNotificationForm> {
        self.create_form.as_ref()
    }

    pub fn create_form_mut(&mut self) -> Option<&mut CreateNotificationForm> {
        self.create_form.as_mut()
    }

    /// Closes the sheet on success; on failure it stays open with the error.
    pub fn submit_create(&mut self) -> Result<NotificationRequest> {
        let form = self
            .create_form
            .as_mut()
            .context("create sheet is not presented")?;
        let request = form
            .submit(&self.store)
            .context("failed to schedule notification")?;
        info!(identifier = %request.identifier, "create sheet closed after scheduling");
        self.dismiss_create();
        Ok(request)
    }

    /// Leaving the sheet, saved or not, reloads the list.
    pub fn dismiss_create(&mut self) {
        self.create_form = None;
        self.store.list_pending();
        self.sync();
    }
}

impl NotificationListScreen {
    fn refresh_authorization(&mut self) {
        let status = self.store.refresh_authorization_status();
        self.observe(status);
        self.sync();
    }

    fn observe(&mut self, status: AuthorizationStatus) {
        if self.observed_status == Some(status) {
            return;
        }
        self.observed_status = Some(status);
        self.handle_authorization_change(status);
    }

    fn handle_authorization_change(&mut self, status: AuthorizationStatus) {
        match status {
            AuthorizationStatus::NotDetermined => {
                if let Err(err) = self.store.request_authorization() {
                    warn!(%err, "notification permission request failed");
                }
            }
            AuthorizationStatus::Authorized => {
                self.store.list_pending();
            }
            AuthorizationStatus::Denied => {}
        }
    }
}
