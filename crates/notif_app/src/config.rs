use std::path::PathBuf;

use anyhow::Result;
use notif_core::{memory::DEFAULT_PENDING_LIMIT, projection::TimeFormat};
use tracing::{info, warn};

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub(crate) time_format: TimeFormat,
    pub(crate) order_file: Option<PathBuf>,
    pub(crate) pending_limit: usize,
}

impl AppConfig {
    pub fn from_env() -> Result<Self> {
        let mut config = Self::default();
        if let Ok(pattern) = std::env::var("NOTIF_TIME_FORMAT") {
            match TimeFormat::new(pattern.trim(), config.time_format.fallback()) {
                Some(format) => config.time_format = format,
                None => warn!(%pattern, "ignoring invalid NOTIF_TIME_FORMAT"),
            }
        }
        if let Ok(label) = std::env::var("NOTIF_FALLBACK_LABEL") {
            config.time_format = config.time_format.with_fallback(label);
        }
        if let Ok(path) = std::env::var("NOTIF_ORDER_FILE") {
            if !path.trim().is_empty() {
                info!(path = %path, "persisting notification order");
                config.order_file = Some(PathBuf::from(path));
            }
        }
        if let Ok(limit) = std::env::var("NOTIF_PENDING_LIMIT") {
            if let Ok(value) = limit.trim().parse::<usize>() {
                if value > 0 {
                    config.pending_limit = value;
                }
            }
        }
        Ok(config)
    }

    pub fn with_time_format(mut self, format: TimeFormat) -> Self {
        self.time_format = format;
        self
    }

    pub fn with_order_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.order_file = Some(path.into());
        self
    }

    pub fn time_format(&self) -> &TimeFormat {
        &self.time_format
    }

    pub fn order_file(&self) -> Option<&PathBuf> {
        self.order_file.as_ref()
    }

    pub fn pending_limit(&self) -> usize {
        self.pending_limit
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            time_format: TimeFormat::default(),
            order_file: None,
            pending_limit: DEFAULT_PENDING_LIMIT,
        }
    }
}
