pub mod config;
pub mod create;
pub mod preview;
pub mod screen;

pub use crate::config::AppConfig;
pub use crate::create::CreateNotificationForm;
pub use crate::screen::{InfoOverlay, NotificationListScreen, NotificationRow, OverlayAction};
