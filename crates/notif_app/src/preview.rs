use std::sync::Arc;

use anyhow::{Context, Result};
use chrono::Duration;
use notif_core::{
    center::{Clock, SystemClock},
    memory::InMemoryNotificationCenter,
    trigger::Recurrence,
    NotificationStore,
};
use tracing::info;

use crate::{config::AppConfig, screen::NotificationListScreen};

const SAMPLES: &[(&str, &str, i64, Option<Recurrence>)] = &[
    ("Gym", "Leg day", 1, None),
    ("Dentist", "Bring the insurance card", 26, None),
    ("Stretch", "Five minutes, no excuses", 3, Some(Recurrence::Daily)),
];

/// Renders the list screen against an in-process notification center seeded
/// with a few sample events.
pub fn run(config: AppConfig) -> Result<()> {
    let clock: Arc<dyn Clock> = Arc::new(SystemClock);
    let center = Arc::new(
        InMemoryNotificationCenter::new(clock.clone()).with_pending_limit(config.pending_limit),
    );
    let mut builder = NotificationStore::builder(center).with_clock(clock);
    if let Some(path) = &config.order_file {
        builder = builder.with_order_journal(path);
    }
    let store = builder
        .build()
        .context("failed to initialize notification store")?;

    let mut screen = NotificationListScreen::new(Arc::new(store), &config);
    screen.on_appear();

    for (title, body, hours, recurrence) in SAMPLES {
        screen.present_create();
        let form = screen
            .create_form_mut()
            .context("create sheet did not open")?;
        form.title = (*title).to_string();
        form.body = (*body).to_string();
        form.date += Duration::hours(*hours);
        if let Some(recurrence) = recurrence {
            form.repeats = true;
            form.recurrence = *recurrence;
        }
        screen.submit_create()?;
    }
    info!(count = screen.rows().len(), "preview seeded");

    if let Some(overlay) = screen.overlay() {
        println!("[{}] {}", overlay.button_title, overlay.message);
    }
    for row in screen.rows() {
        println!("{:<24} {}", row.title, row.time);
    }
    Ok(())
}
