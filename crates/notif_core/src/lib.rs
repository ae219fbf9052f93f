pub mod center;
pub mod error;
pub mod memory;
pub mod model;
pub mod ordering;
pub mod projection;
pub mod store;
pub mod trigger;

pub use crate::error::{NotificationError, Result};
pub use crate::store::{NotificationStore, NotificationStoreBuilder, StoreSnapshot, StoreSubscription};
